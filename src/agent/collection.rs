//! Collection agent: tracks ingested `Document` records independently of
//! their fragments, so a document can be looked up or re-deleted by id
//! without touching the vector store.

use super::base::BaseAgent;
use super::message::{AgentMessage, MessageType};
use crate::document::Document;
use crate::error::{AgentError, KbError, Result};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::error;

pub struct CollectionAgent {
    name: String,
    documents: Mutex<HashMap<String, Document>>,
    outbox: mpsc::Sender<AgentMessage>,
}

impl CollectionAgent {
    pub fn new(name: impl Into<String>, outbox: mpsc::Sender<AgentMessage>) -> Self {
        Self {
            name: name.into(),
            documents: Mutex::new(HashMap::new()),
            outbox,
        }
    }

    fn add_document(&self, params: &serde_json::Value) -> Result<serde_json::Value> {
        let document: Document = serde_json::from_value(
            params
                .get("document")
                .cloned()
                .ok_or_else(|| KbError::Agent(AgentError::MissingParameter("document".into())))?,
        )?;
        let id = document.id.clone();
        self.documents.lock().expect("collection mutex poisoned").insert(id.clone(), document);
        Ok(json!({ "document_id": id }))
    }

    fn get_document(&self, params: &serde_json::Value) -> Result<serde_json::Value> {
        let id = params
            .get("document_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| KbError::Agent(AgentError::MissingParameter("document_id".into())))?;
        let document = self.documents.lock().expect("collection mutex poisoned").get(id).cloned();
        Ok(json!({ "document": document }))
    }

    fn remove_document(&self, params: &serde_json::Value) -> Result<serde_json::Value> {
        let id = params
            .get("document_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| KbError::Agent(AgentError::MissingParameter("document_id".into())))?;
        let removed = self.documents.lock().expect("collection mutex poisoned").remove(id).is_some();
        Ok(json!({ "removed": removed }))
    }

    async fn handle_task(&self, message: AgentMessage) -> AgentMessage {
        let (Some(task_id), Some(task)) = (message.task_id(), message.task_name()) else {
            return message.task_error(AgentError::MissingParameter("task_id/task".into()));
        };
        let params = message.params();

        let result = match task.as_str() {
            "add_document" => self.add_document(&params),
            "get_document" => self.get_document(&params),
            "remove_document" => self.remove_document(&params),
            other => Err(KbError::Agent(AgentError::UnsupportedTask(other.to_string()))),
        };

        match result {
            Ok(payload) => message.task_complete(json!({ "task_id": task_id, "result": payload })),
            Err(e) => {
                error!(task_id, error = %e, "collection task failed");
                message.task_error(e)
            }
        }
    }
}

#[async_trait]
impl BaseAgent for CollectionAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process_message(&self, message: AgentMessage) -> Result<AgentMessage> {
        match message.message_type {
            MessageType::Task => {
                let reply = self.handle_task(message).await;
                let _ = self.outbox.send(reply.clone()).await;
                Ok(reply)
            }
            _ => Ok(message.create_response(json!({ "status": "acknowledged" }))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentType;

    #[tokio::test]
    async fn add_then_get_document_round_trips() {
        let (tx, _rx) = mpsc::channel(8);
        let agent = CollectionAgent::new("collection", tx);
        let doc = Document::new("d1", "hello", DocumentType::Text);

        let add = AgentMessage::task(
            "orchestrator",
            "collection",
            json!({ "task_id": "t1", "task": "add_document", "params": { "document": doc } }),
        );
        let reply = agent.process_message(add).await.unwrap();
        assert_eq!(reply.message_type, MessageType::TaskComplete);

        let get = AgentMessage::task(
            "orchestrator",
            "collection",
            json!({ "task_id": "t2", "task": "get_document", "params": { "document_id": "d1" } }),
        );
        let reply = agent.process_message(get).await.unwrap();
        assert_eq!(reply.payload["result"]["document"]["id"], "d1");
    }
}
