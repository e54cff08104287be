//! Processing agent: handles `process_document`/`process_documents` tasks by
//! delegating to `Processor`.

use super::base::BaseAgent;
use super::message::{AgentMessage, MessageType};
use crate::document::Document;
use crate::error::{AgentError, KbError, Result};
use crate::processor::Processor;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::error;

pub struct ProcessingAgent {
    name: String,
    processor: Arc<Processor>,
    outbox: mpsc::Sender<AgentMessage>,
}

impl ProcessingAgent {
    pub fn new(name: impl Into<String>, processor: Arc<Processor>, outbox: mpsc::Sender<AgentMessage>) -> Self {
        Self {
            name: name.into(),
            processor,
            outbox,
        }
    }

    async fn handle_task(processor: Arc<Processor>, outbox: mpsc::Sender<AgentMessage>, message: AgentMessage) {
        let (Some(task_id), Some(task)) = (message.task_id(), message.task_name()) else {
            let _ = outbox
                .send(message.task_error(AgentError::MissingParameter("task_id/task".into())))
                .await;
            return;
        };
        let params = message.params();

        let result = match task.as_str() {
            "process_document" => Self::process_one(&processor, &params).await,
            "process_documents" => Self::process_many(&processor, &params).await,
            other => Err(KbError::Agent(AgentError::UnsupportedTask(other.to_string()))),
        };

        let reply = match result {
            Ok(payload) => message.task_complete(json!({ "task_id": task_id, "result": payload })),
            Err(e) => {
                error!(task_id, error = %e, "task processing failed");
                message.task_error(e)
            }
        };
        let _ = outbox.send(reply).await;
    }

    async fn process_one(processor: &Processor, params: &serde_json::Value) -> Result<serde_json::Value> {
        let document: Document = serde_json::from_value(
            params
                .get("document")
                .cloned()
                .ok_or_else(|| KbError::Agent(AgentError::MissingParameter("document".into())))?,
        )?;
        let outcome = processor.process_document(&document).await?;
        Ok(json!({
            "document_id": outcome.document_id,
            "chunk_count": outcome.fragments.len(),
            "chunks": outcome.fragments,
        }))
    }

    async fn process_many(processor: &Processor, params: &serde_json::Value) -> Result<serde_json::Value> {
        let documents: Vec<Document> = serde_json::from_value(
            params
                .get("documents")
                .cloned()
                .ok_or_else(|| KbError::Agent(AgentError::MissingParameter("documents".into())))?,
        )?;
        let outcomes = processor.process_batch(&documents).await;
        let chunk_count: usize = outcomes.iter().map(|o| o.fragments.len()).sum();
        Ok(json!({
            "document_count": outcomes.len(),
            "chunk_count": chunk_count,
            "results": outcomes.into_iter().map(|o| json!({
                "document_id": o.document_id,
                "chunks": o.fragments,
            })).collect::<Vec<_>>(),
        }))
    }
}

#[async_trait]
impl BaseAgent for ProcessingAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process_message(&self, message: AgentMessage) -> Result<AgentMessage> {
        match message.message_type {
            MessageType::Task => {
                let processor = self.processor.clone();
                let outbox = self.outbox.clone();
                let task_message = message.clone();
                tokio::spawn(async move {
                    Self::handle_task(processor, outbox, task_message).await;
                });
                Ok(message.create_response(json!({ "status": "processing" })))
            }
            _ => Ok(message.create_response(json!({ "status": "acknowledged" }))),
        }
    }
}
