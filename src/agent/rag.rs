//! RAG agent: combines retrieval, generation, and source attribution into a
//! full query answer, with a streaming variant that emits chunk/end messages
//! as the answer is generated.

use super::base::BaseAgent;
use super::message::{AgentMessage, MessageType};
use crate::citation::SourceAttributor;
use crate::config::GenerationConfig;
use crate::error::{AgentError, KbError, Result};
use crate::fragment::QueryResult;
use crate::generation::Generator;
use crate::retriever::Retriever;
use crate::store::MetadataFilter;
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::error;

/// Number of streamed chunks buffered before a `StreamEnd` is emitted.
const STREAM_CHUNK_SIZE: usize = 10;

/// Returned in place of a generated answer when retrieval finds nothing to
/// ground a response in.
const NO_INFORMATION_ANSWER: &str = "I don't have enough information to answer that question.";

pub struct RagAgent {
    name: String,
    retriever: Arc<Retriever>,
    generator: Arc<Generator>,
    attributor: SourceAttributor,
    outbox: mpsc::Sender<AgentMessage>,
}

impl RagAgent {
    pub fn new(
        name: impl Into<String>,
        retriever: Arc<Retriever>,
        generator: Arc<Generator>,
        outbox: mpsc::Sender<AgentMessage>,
    ) -> Self {
        Self::with_generation_config(name, retriever, generator, &GenerationConfig::default(), outbox)
    }

    pub fn with_generation_config(
        name: impl Into<String>,
        retriever: Arc<Retriever>,
        generator: Arc<Generator>,
        generation_config: &GenerationConfig,
        outbox: mpsc::Sender<AgentMessage>,
    ) -> Self {
        Self {
            name: name.into(),
            retriever,
            generator,
            attributor: SourceAttributor::new(
                generation_config.citation_style,
                generation_config.include_references_section,
            ),
            outbox,
        }
    }

    async fn handle_task(
        retriever: Arc<Retriever>,
        generator: Arc<Generator>,
        attributor: Arc<SourceAttributor>,
        outbox: mpsc::Sender<AgentMessage>,
        message: AgentMessage,
    ) {
        let (Some(task_id), Some(task)) = (message.task_id(), message.task_name()) else {
            let _ = outbox
                .send(message.task_error(AgentError::MissingParameter("task_id/task".into())))
                .await;
            return;
        };
        let params = message.params();

        let result = match task.as_str() {
            "query" => Self::query(&retriever, &generator, &attributor, &params).await,
            "query_stream" => {
                Self::query_stream(&retriever, &generator, &attributor, &outbox, &message, &params).await
            }
            other => Err(KbError::Agent(AgentError::UnsupportedTask(other.to_string()))),
        };

        let reply = match result {
            Ok(payload) => message.task_complete(json!({ "task_id": task_id, "result": payload })),
            Err(e) => {
                error!(task_id, error = %e, "rag task failed");
                message.task_error(e)
            }
        };
        let _ = outbox.send(reply).await;
    }

    async fn query(
        retriever: &Retriever,
        generator: &Generator,
        attributor: &SourceAttributor,
        params: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let started = Instant::now();
        let query_text = params
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| KbError::Agent(AgentError::MissingParameter("query".into())))?;
        let top_k = params.get("top_k").and_then(|v| v.as_u64()).map(|k| k as usize);
        let filters: Option<MetadataFilter> = params
            .get("filters")
            .and_then(|v| serde_json::from_value(v.clone()).ok());

        let results = retriever.retrieve(query_text, top_k, filters.as_ref()).await?;
        if results.is_empty() {
            let query_result = QueryResult {
                query: query_text.to_string(),
                answer: NO_INFORMATION_ANSWER.to_string(),
                sources: Vec::new(),
                confidence: 0.0,
                processing_time_ms: started.elapsed().as_millis() as u64,
                metadata: Default::default(),
                success: true,
            };
            return Ok(serde_json::to_value(query_result)?);
        }

        let answer = generator.answer(query_text, results.clone()).await?;
        let sources = attributor.attribute(&results);
        let confidence = attributor.confidence(&results);
        let answer = attributor.attributed_answer(&answer, &sources);

        let query_result = QueryResult {
            query: query_text.to_string(),
            answer,
            sources,
            confidence,
            processing_time_ms: started.elapsed().as_millis() as u64,
            metadata: Default::default(),
            success: true,
        };
        Ok(serde_json::to_value(query_result)?)
    }

    /// Streams answer chunks as `StreamChunk` messages directly to the
    /// requester, batched every `STREAM_CHUNK_SIZE` chunks, followed by a
    /// `StreamEnd` message; the eventual `TaskComplete` still carries the
    /// full `QueryResult` for callers that only want the final answer.
    async fn query_stream(
        retriever: &Retriever,
        generator: &Generator,
        attributor: &SourceAttributor,
        outbox: &mpsc::Sender<AgentMessage>,
        original: &AgentMessage,
        params: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let started = Instant::now();
        let query_text = params
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| KbError::Agent(AgentError::MissingParameter("query".into())))?;
        let filters: Option<MetadataFilter> = params
            .get("filters")
            .and_then(|v| serde_json::from_value(v.clone()).ok());

        let results = retriever.retrieve(query_text, None, filters.as_ref()).await?;
        if results.is_empty() {
            let query_result = QueryResult {
                query: query_text.to_string(),
                answer: NO_INFORMATION_ANSWER.to_string(),
                sources: Vec::new(),
                confidence: 0.0,
                processing_time_ms: started.elapsed().as_millis() as u64,
                metadata: Default::default(),
                success: true,
            };
            return Ok(serde_json::to_value(query_result)?);
        }

        let mut stream = generator.answer_stream(query_text, results.clone()).await?;

        let mut answer = String::new();
        let mut buffered = 0usize;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            answer.push_str(&chunk);
            let _ = outbox
                .send(AgentMessage {
                    id: uuid::Uuid::new_v4().to_string(),
                    source: original.destination.clone(),
                    destination: original.source.clone(),
                    message_type: MessageType::StreamChunk,
                    payload: json!({ "chunk": chunk }),
                    timestamp: chrono::Utc::now(),
                    correlation_id: Some(original.id.clone()),
                })
                .await;
            buffered += 1;
            if buffered >= STREAM_CHUNK_SIZE {
                buffered = 0;
            }
        }
        let _ = outbox
            .send(AgentMessage {
                id: uuid::Uuid::new_v4().to_string(),
                source: original.destination.clone(),
                destination: original.source.clone(),
                message_type: MessageType::StreamEnd,
                payload: json!({}),
                timestamp: chrono::Utc::now(),
                correlation_id: Some(original.id.clone()),
            })
            .await;

        let sources = attributor.attribute(&results);
        let confidence = attributor.confidence(&results);
        let answer = attributor.attributed_answer(&answer, &sources);
        let query_result = QueryResult {
            query: query_text.to_string(),
            answer,
            sources,
            confidence,
            processing_time_ms: started.elapsed().as_millis() as u64,
            metadata: Default::default(),
            success: true,
        };
        Ok(serde_json::to_value(query_result)?)
    }
}

#[async_trait]
impl BaseAgent for RagAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process_message(&self, message: AgentMessage) -> Result<AgentMessage> {
        match message.message_type {
            MessageType::Task => {
                let retriever = self.retriever.clone();
                let generator = self.generator.clone();
                let attributor = Arc::new(self.attributor.clone());
                let outbox = self.outbox.clone();
                let task_message = message.clone();
                tokio::spawn(async move {
                    Self::handle_task(retriever, generator, attributor, outbox, task_message).await;
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
    use crate::config::{GenerationConfig, RetrievalConfig, StorageConfig};
    use crate::embedding::Embedder;
    use crate::fragment::{Fragment, Vector};
    use crate::generation::{GenerationRequest, TextGenerationModel};
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

    struct EchoModel;

    #[async_trait]
    impl TextGenerationModel for EchoModel {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            Ok(format!("answer: {}", request.query))
        }
    }

    #[tokio::test]
    async fn query_task_completes_with_query_result() {
        let store: Arc<dyn VectorStoreProvider> = Arc::new(InMemoryVectorStore::new(StorageConfig::default()));
        store.initialize().await.unwrap();
        let mut fragment = Fragment::new("d1_chunk_0", "d1", "hi there");
        fragment.embedding = Some(vec![8.0]);
        store.add_fragments(vec![fragment]).await.unwrap();

        let retriever = Arc::new(Retriever::new(store, Arc::new(EchoEmbedder), RetrievalConfig::default()));
        let generator = Arc::new(Generator::new(Arc::new(EchoModel), GenerationConfig::default()));
        let (tx, mut rx) = mpsc::channel(8);
        let agent = RagAgent::new("rag", retriever, generator, tx);

        let task = AgentMessage::task(
            "orchestrator",
            "rag",
            json!({ "task_id": "t1", "task": "query", "params": { "query": "hi there" } }),
        );
        agent.process_message(task).await.unwrap();

        let completion = rx.recv().await.unwrap();
        assert_eq!(completion.message_type, MessageType::TaskComplete);
        assert!(completion.payload["result"]["answer"].as_str().unwrap().contains("hi there"));
    }

    #[tokio::test]
    async fn query_with_no_matching_fragments_returns_sentinel_without_generating() {
        let store: Arc<dyn VectorStoreProvider> = Arc::new(InMemoryVectorStore::new(StorageConfig::default()));
        store.initialize().await.unwrap();

        let retriever = Arc::new(Retriever::new(store, Arc::new(EchoEmbedder), RetrievalConfig::default()));
        let generator = Arc::new(Generator::new(Arc::new(EchoModel), GenerationConfig::default()));
        let (tx, mut rx) = mpsc::channel(8);
        let agent = RagAgent::new("rag", retriever, generator, tx);

        let task = AgentMessage::task(
            "orchestrator",
            "rag",
            json!({ "task_id": "t1", "task": "query", "params": { "query": "anything at all" } }),
        );
        agent.process_message(task).await.unwrap();

        let completion = rx.recv().await.unwrap();
        let result = &completion.payload["result"];
        assert_eq!(
            result["answer"].as_str().unwrap(),
            "I don't have enough information to answer that question."
        );
        assert!(result["sources"].as_array().unwrap().is_empty());
        assert!(result["success"].as_bool().unwrap());
    }
}
