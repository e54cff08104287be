//! Retrieval agent: handles `retrieve` tasks against a `Retriever`.

use super::base::BaseAgent;
use super::message::{AgentMessage, MessageType};
use crate::error::{AgentError, KbError, Result};
use crate::retriever::Retriever;
use crate::store::MetadataFilter;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::error;

pub struct RetrievalAgent {
    name: String,
    retriever: Arc<Retriever>,
    outbox: mpsc::Sender<AgentMessage>,
}

impl RetrievalAgent {
    pub fn new(name: impl Into<String>, retriever: Arc<Retriever>, outbox: mpsc::Sender<AgentMessage>) -> Self {
        Self {
            name: name.into(),
            retriever,
            outbox,
        }
    }

    async fn handle_task(retriever: Arc<Retriever>, outbox: mpsc::Sender<AgentMessage>, message: AgentMessage) {
        let (Some(task_id), Some(task)) = (message.task_id(), message.task_name()) else {
            let _ = outbox
                .send(message.task_error(AgentError::MissingParameter("task_id/task".into())))
                .await;
            return;
        };
        let params = message.params();

        let result = match task.as_str() {
            "retrieve" => Self::retrieve(&retriever, &params).await,
            other => Err(KbError::Agent(AgentError::UnsupportedTask(other.to_string()))),
        };

        let reply = match result {
            Ok(payload) => message.task_complete(json!({ "task_id": task_id, "result": payload })),
            Err(e) => {
                error!(task_id, error = %e, "retrieval task failed");
                message.task_error(e)
            }
        };
        let _ = outbox.send(reply).await;
    }

    async fn retrieve(retriever: &Retriever, params: &serde_json::Value) -> Result<serde_json::Value> {
        let query = params
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| KbError::Agent(AgentError::MissingParameter("query".into())))?;
        let top_k = params.get("top_k").and_then(|v| v.as_u64()).map(|k| k as usize);
        let filters: Option<MetadataFilter> = params
            .get("filters")
            .and_then(|v| serde_json::from_value(v.clone()).ok());

        let results = retriever.retrieve(query, top_k, filters.as_ref()).await?;
        Ok(json!({ "results": results }))
    }
}

#[async_trait]
impl BaseAgent for RetrievalAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process_message(&self, message: AgentMessage) -> Result<AgentMessage> {
        match message.message_type {
            MessageType::Task => {
                let retriever = self.retriever.clone();
                let outbox = self.outbox.clone();
                let task_message = message.clone();
                tokio::spawn(async move {
                    Self::handle_task(retriever, outbox, task_message).await;
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
    use crate::config::{RetrievalConfig, StorageConfig};
    use crate::embedding::Embedder;
    use crate::fragment::{Fragment, Vector};
    use crate::store::memory::InMemoryVectorStore;
    use crate::store::VectorStoreProvider;

    struct EchoEmbedder;

    #[async_trait]
    impl Embedder for EchoEmbedder {
        async fn embed(&self, text: &str) -> Result<Vector> {
            Ok(vec![text.len() as f32])
        }
        fn dimensions(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn retrieve_task_completes_with_results() {
        let store: Arc<dyn VectorStoreProvider> = Arc::new(InMemoryVectorStore::new(StorageConfig::default()));
        store.initialize().await.unwrap();
        let mut fragment = Fragment::new("d1_chunk_0", "d1", "hi");
        fragment.embedding = Some(vec![2.0]);
        store.add_fragments(vec![fragment]).await.unwrap();

        let retriever = Arc::new(Retriever::new(store, Arc::new(EchoEmbedder), RetrievalConfig::default()));
        let (tx, mut rx) = mpsc::channel(8);
        let agent = RetrievalAgent::new("retrieval", retriever, tx);

        let task = AgentMessage::task(
            "orchestrator",
            "retrieval",
            json!({ "task_id": "t1", "task": "retrieve", "params": { "query": "hi" } }),
        );
        agent.process_message(task).await.unwrap();

        let completion = rx.recv().await.unwrap();
        assert_eq!(completion.message_type, MessageType::TaskComplete);
        assert_eq!(completion.payload["result"]["results"].as_array().unwrap().len(), 1);
    }
}
