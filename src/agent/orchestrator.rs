//! Orchestrator: the single public entry point coordinating the collection,
//! processing, storage, retrieval/generation (RAG), and maintenance agents.
//! Dispatches a task to a specialist, then waits on the shared reply channel
//! for the matching `TaskComplete`/`TaskError` correlated by message id — a
//! simplification of full message-bus routing appropriate for a single
//! in-process orchestrator driving sequential requests.

use super::base::BaseAgent;
use super::collection::CollectionAgent;
use super::maintenance::MaintenanceAgent;
use super::message::{AgentMessage, MessageType};
use super::processing::ProcessingAgent;
use super::rag::RagAgent;
use super::retrieval::RetrievalAgent;
use super::storage::StorageAgent;
use crate::config::KbConfig;
use crate::document::{Document, DocumentId};
use crate::embedding::Embedder;
use crate::error::{AgentError, KbError, Result};
use crate::fragment::{Fragment, QueryResult, RetrievalResult};
use crate::generation::{Generator, TextGenerationModel};
use crate::processor::Processor;
use crate::retriever::Retriever;
use crate::store::registry;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

/// Result of `Orchestrator::add_document`.
#[derive(Debug, Clone)]
pub struct AddDocumentOutcome {
    pub document_id: DocumentId,
    pub chunk_count: usize,
    pub accepted: bool,
}

pub struct Orchestrator {
    collection: Arc<CollectionAgent>,
    processing: Arc<ProcessingAgent>,
    storage: Arc<StorageAgent>,
    retrieval: Arc<RetrievalAgent>,
    rag: Arc<RagAgent>,
    maintenance: Arc<MaintenanceAgent>,
    inbox: Mutex<mpsc::Receiver<AgentMessage>>,
}

impl Orchestrator {
    pub fn new(
        config: KbConfig,
        embedder: Arc<dyn Embedder>,
        generation_model: Arc<dyn TextGenerationModel>,
    ) -> Result<Self> {
        config.validate()?;

        let store = registry::build_provider(&config.storage)?;
        let processor = Arc::new(Processor::new(
            config.chunking.clone(),
            embedder.clone(),
            config.agents.max_concurrent_tasks,
        ));
        let retriever = Arc::new(Retriever::new(store.clone(), embedder, config.retrieval.clone()));
        let generator = Arc::new(Generator::new(generation_model, config.generation.clone()));

        let (tx, rx) = mpsc::channel(256);
        let collection = Arc::new(CollectionAgent::new("collection", tx.clone()));
        let processing = Arc::new(ProcessingAgent::new("processing", processor, tx.clone()));
        let storage = Arc::new(StorageAgent::new("storage", store.clone(), tx.clone()));
        let retrieval = Arc::new(RetrievalAgent::new("retrieval", retriever.clone(), tx.clone()));
        let rag = Arc::new(RagAgent::with_generation_config(
            "rag",
            retriever.clone(),
            generator,
            &config.generation,
            tx.clone(),
        ));
        let maintenance = Arc::new(MaintenanceAgent::new("maintenance", store, retriever, tx));

        Ok(Self {
            collection,
            processing,
            storage,
            retrieval,
            rag,
            maintenance,
            inbox: Mutex::new(rx),
        })
    }

    async fn dispatch(&self, agent: &dyn BaseAgent, task: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        let task_id = Uuid::new_v4().to_string();
        let message = AgentMessage::task(
            "orchestrator",
            agent.name(),
            json!({ "task_id": task_id, "task": task, "params": params }),
        );
        let correlation_id = message.id.clone();
        agent.process_message(message).await?;
        self.await_completion(&correlation_id).await
    }

    async fn await_completion(&self, correlation_id: &str) -> Result<serde_json::Value> {
        let mut inbox = self.inbox.lock().await;
        loop {
            let message = inbox.recv().await.ok_or(KbError::Cancelled)?;
            if message.correlation_id.as_deref() != Some(correlation_id) {
                continue;
            }
            match message.message_type {
                MessageType::TaskComplete => return Ok(message.payload["result"].clone()),
                MessageType::TaskError => {
                    let reason = message
                        .payload
                        .get("error")
                        .and_then(|v| v.as_str())
                        .unwrap_or("unknown error")
                        .to_string();
                    return Err(KbError::Agent(AgentError::Malformed(reason)));
                }
                _ => continue,
            }
        }
    }

    pub async fn add_document(&self, document: Document) -> Result<AddDocumentOutcome> {
        let document_id = document.id.clone();

        self.dispatch(
            self.collection.as_ref(),
            "add_document",
            json!({ "document": document.clone() }),
        )
        .await?;

        let processed = self
            .dispatch(self.processing.as_ref(), "process_document", json!({ "document": document }))
            .await?;
        let fragments: Vec<Fragment> = serde_json::from_value(processed["chunks"].clone())?;
        let chunk_count = fragments.len();

        let stored = self
            .dispatch(self.storage.as_ref(), "add_fragments", json!({ "fragments": fragments }))
            .await?;
        let accepted = stored.get("accepted").and_then(|v| v.as_bool()).unwrap_or(false);

        Ok(AddDocumentOutcome {
            document_id,
            chunk_count,
            accepted,
        })
    }

    pub async fn delete_document(&self, document_id: &str) -> Result<usize> {
        self.dispatch(
            self.collection.as_ref(),
            "remove_document",
            json!({ "document_id": document_id }),
        )
        .await?;

        let result = self
            .dispatch(
                self.storage.as_ref(),
                "delete_document",
                json!({ "document_id": document_id }),
            )
            .await?;
        Ok(result.get("removed").and_then(|v| v.as_u64()).unwrap_or(0) as usize)
    }

    /// Fetch matching fragments without generating an answer, for callers
    /// that only need the retrieval step.
    pub async fn retrieve(&self, query: &str, top_k: Option<usize>) -> Result<Vec<RetrievalResult>> {
        let result = self
            .dispatch(self.retrieval.as_ref(), "retrieve", json!({ "query": query, "top_k": top_k }))
            .await?;
        Ok(serde_json::from_value(
            result.get("results").cloned().unwrap_or(serde_json::Value::Array(vec![])),
        )?)
    }

    pub async fn query(&self, query: &str, top_k: Option<usize>) -> Result<QueryResult> {
        let result = self
            .dispatch(self.rag.as_ref(), "query", json!({ "query": query, "top_k": top_k }))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    pub async fn health_check(&self) -> Result<serde_json::Value> {
        self.dispatch(self.maintenance.as_ref(), "health_check", json!({})).await
    }

    pub async fn maintain(&self) -> Result<serde_json::Value> {
        self.dispatch(self.maintenance.as_ref(), "cleanup_cache", json!({})).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KbConfig;
    use crate::document::DocumentType;
    use crate::fragment::Vector;
    use crate::generation::GenerationRequest;
    use async_trait::async_trait;

    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vector> {
            Ok(vec![text.len() as f32])
        }
        fn dimensions(&self) -> usize {
            1
        }
    }

    struct StubModel;

    #[async_trait]
    impl TextGenerationModel for StubModel {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            Ok(format!("answer to: {}", request.query))
        }
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(KbConfig::default(), Arc::new(StubEmbedder), Arc::new(StubModel)).unwrap()
    }

    #[tokio::test]
    async fn add_document_then_query_round_trips() {
        let orchestrator = orchestrator();
        let doc = Document::new("d1", "the sky is blue and vast", DocumentType::Text);
        let outcome = orchestrator.add_document(doc).await.unwrap();
        assert_eq!(outcome.document_id, "d1");
        assert!(outcome.accepted);
        assert!(outcome.chunk_count > 0);

        let result = orchestrator.query("the sky is blue and vast", None).await.unwrap();
        assert!(result.answer.contains("the sky is blue and vast"));
        assert!(!result.sources.is_empty());
    }

    #[tokio::test]
    async fn delete_document_removes_its_fragments() {
        let orchestrator = orchestrator();
        let doc = Document::new("d1", "some content to chunk and store", DocumentType::Text);
        orchestrator.add_document(doc).await.unwrap();

        let removed = orchestrator.delete_document("d1").await.unwrap();
        assert!(removed > 0);
    }

    #[tokio::test]
    async fn retrieve_returns_fragments_without_generating_an_answer() {
        let orchestrator = orchestrator();
        let doc = Document::new("d1", "rust is a systems programming language", DocumentType::Text);
        orchestrator.add_document(doc).await.unwrap();

        let results = orchestrator
            .retrieve("rust is a systems programming language", None)
            .await
            .unwrap();
        assert!(!results.is_empty());
    }

    #[tokio::test]
    async fn health_check_reports_zero_fragments_initially() {
        let orchestrator = orchestrator();
        let health = orchestrator.health_check().await.unwrap();
        assert_eq!(health["fragment_count"], 0);
    }
}
