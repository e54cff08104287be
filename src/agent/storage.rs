//! Storage agent: handles `add_fragments`/`delete_document`/`search` tasks
//! against a `VectorStoreProvider`, following the same task-dispatch shape
//! as `ProcessingAgent`.

use super::base::BaseAgent;
use super::message::{AgentMessage, MessageType};
use crate::error::{AgentError, KbError, Result};
use crate::fragment::Fragment;
use crate::store::VectorStoreProvider;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::error;

pub struct StorageAgent {
    name: String,
    store: Arc<dyn VectorStoreProvider>,
    outbox: mpsc::Sender<AgentMessage>,
}

impl StorageAgent {
    pub fn new(name: impl Into<String>, store: Arc<dyn VectorStoreProvider>, outbox: mpsc::Sender<AgentMessage>) -> Self {
        Self {
            name: name.into(),
            store,
            outbox,
        }
    }

    async fn handle_task(store: Arc<dyn VectorStoreProvider>, outbox: mpsc::Sender<AgentMessage>, message: AgentMessage) {
        let (Some(task_id), Some(task)) = (message.task_id(), message.task_name()) else {
            let _ = outbox
                .send(message.task_error(AgentError::MissingParameter("task_id/task".into())))
                .await;
            return;
        };
        let params = message.params();

        let result = match task.as_str() {
            "add_fragments" => Self::add_fragments(&store, &params).await,
            "delete_document" => Self::delete_document(&store, &params).await,
            other => Err(KbError::Agent(AgentError::UnsupportedTask(other.to_string()))),
        };

        let reply = match result {
            Ok(payload) => message.task_complete(json!({ "task_id": task_id, "result": payload })),
            Err(e) => {
                error!(task_id, error = %e, "storage task failed");
                message.task_error(e)
            }
        };
        let _ = outbox.send(reply).await;
    }

    async fn add_fragments(store: &Arc<dyn VectorStoreProvider>, params: &serde_json::Value) -> Result<serde_json::Value> {
        let fragments: Vec<Fragment> = serde_json::from_value(
            params
                .get("fragments")
                .cloned()
                .ok_or_else(|| KbError::Agent(AgentError::MissingParameter("fragments".into())))?,
        )?;
        let accepted = store.add_fragments(fragments).await?;
        Ok(json!({ "accepted": accepted }))
    }

    async fn delete_document(store: &Arc<dyn VectorStoreProvider>, params: &serde_json::Value) -> Result<serde_json::Value> {
        let document_id = params
            .get("document_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| KbError::Agent(AgentError::MissingParameter("document_id".into())))?;
        let removed = store.delete_document(document_id).await?;
        Ok(json!({ "removed": removed }))
    }
}

#[async_trait]
impl BaseAgent for StorageAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process_message(&self, message: AgentMessage) -> Result<AgentMessage> {
        match message.message_type {
            MessageType::Task => {
                let store = self.store.clone();
                let outbox = self.outbox.clone();
                let task_message = message.clone();
                tokio::spawn(async move {
                    Self::handle_task(store, outbox, task_message).await;
                });
                Ok(message.create_response(json!({ "status": "processing" })))
            }
            _ => Ok(message.create_response(json!({ "status": "acknowledged" }))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::store::memory::InMemoryVectorStore;

    #[tokio::test]
    async fn add_fragments_task_completes() {
        let store: Arc<dyn VectorStoreProvider> = Arc::new(InMemoryVectorStore::new(StorageConfig::default()));
        let (tx, mut rx) = mpsc::channel(8);
        let agent = StorageAgent::new("storage", store, tx);

        let mut fragment = Fragment::new("d1_chunk_0", "d1", "hi");
        fragment.embedding = Some(vec![1.0]);
        let task = AgentMessage::task(
            "orchestrator",
            "storage",
            json!({ "task_id": "t1", "task": "add_fragments", "params": { "fragments": [fragment] } }),
        );
        agent.process_message(task).await.unwrap();

        let completion = rx.recv().await.unwrap();
        assert_eq!(completion.message_type, MessageType::TaskComplete);
        assert_eq!(completion.payload["result"]["accepted"], true);
    }
}
