//! Maintenance agent: cache housekeeping and store health reporting.

use super::base::BaseAgent;
use super::message::{AgentMessage, MessageType};
use crate::error::{AgentError, KbError, Result};
use crate::retriever::Retriever;
use crate::store::VectorStoreProvider;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

pub struct MaintenanceAgent {
    name: String,
    store: Arc<dyn VectorStoreProvider>,
    retriever: Arc<Retriever>,
    outbox: mpsc::Sender<AgentMessage>,
}

impl MaintenanceAgent {
    pub fn new(
        name: impl Into<String>,
        store: Arc<dyn VectorStoreProvider>,
        retriever: Arc<Retriever>,
        outbox: mpsc::Sender<AgentMessage>,
    ) -> Self {
        Self {
            name: name.into(),
            store,
            retriever,
            outbox,
        }
    }

    async fn health_check(&self) -> Result<serde_json::Value> {
        let store_stats = self.store.stats().await?;
        let cache_stats = self.retriever.cache_stats();
        Ok(json!({
            "fragment_count": store_stats.fragment_count,
            "document_count": store_stats.document_count,
            "cache_hits": cache_stats.hits,
            "cache_misses": cache_stats.misses,
            "cache_evictions": cache_stats.evictions,
            "cache_size": cache_stats.size,
        }))
    }

    /// Drops the entire retrieval cache. Selective/expiry-only cleanup is
    /// not implemented.
    fn cleanup_cache(&self) -> serde_json::Value {
        self.retriever.invalidate_cache();
        info!("retrieval cache cleared during maintenance");
        json!({ "cache_cleared": true })
    }

    async fn handle_task(&self, message: AgentMessage) -> AgentMessage {
        let (Some(task_id), Some(task)) = (message.task_id(), message.task_name()) else {
            return message.task_error(AgentError::MissingParameter("task_id/task".into()));
        };

        let result = match task.as_str() {
            "health_check" => self.health_check().await,
            "cleanup_cache" => Ok(self.cleanup_cache()),
            other => Err(KbError::Agent(AgentError::UnsupportedTask(other.to_string()))),
        };

        match result {
            Ok(payload) => message.task_complete(json!({ "task_id": task_id, "result": payload })),
            Err(e) => {
                error!(task_id, error = %e, "maintenance task failed");
                message.task_error(e)
            }
        }
    }
}

#[async_trait]
impl BaseAgent for MaintenanceAgent {
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
