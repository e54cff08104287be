//! Document processing orchestration: chunk -> extract metadata -> embed,
//! plus the batch fan-out with bounded concurrency and partial-failure skip
//! semantics.

use crate::chunking::Chunker;
use crate::config::ChunkingConfig;
use crate::document::{Document, DocumentType};
use crate::embedding::Embedder;
use crate::error::{KbError, ProcessingError, Result};
use crate::format;
use crate::fragment::Fragment;
use crate::metadata::MetadataExtractor;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::error;

/// Result of processing a single document: its generated fragments.
#[derive(Debug, Clone)]
pub struct ProcessingOutcome {
    pub document_id: String,
    pub fragments: Vec<Fragment>,
}

pub struct Processor {
    chunking_config: ChunkingConfig,
    metadata: MetadataExtractor,
    embedder: Arc<dyn Embedder>,
    max_concurrent_tasks: usize,
}

impl Processor {
    pub fn new(chunking_config: ChunkingConfig, embedder: Arc<dyn Embedder>, max_concurrent_tasks: usize) -> Self {
        Self {
            chunking_config,
            metadata: MetadataExtractor::new(),
            embedder,
            max_concurrent_tasks: max_concurrent_tasks.max(1),
        }
    }

    /// Chunk, tag with metadata, and embed a single document's fragments.
    /// Documents of an unknown declared type are sniffed from their content;
    /// HTML is converted down to plain text before chunking, since none of
    /// the chunking strategies understand markup.
    pub async fn process_document(&self, document: &Document) -> Result<ProcessingOutcome> {
        let detected_type = if document.doc_type == DocumentType::Unknown {
            format::detect_type(&document.content, document.source.as_deref())
        } else {
            document.doc_type
        };
        let content = match detected_type {
            DocumentType::Html => format::convert(&document.content, DocumentType::Html, DocumentType::Text)?,
            _ => document.content.clone(),
        };

        let chunker = Chunker::new(self.chunking_config.clone());
        let spans = chunker.chunk(&content);
        let chunk_count = spans.len();

        let mut fragments = Vec::with_capacity(spans.len());
        for (i, span) in spans.into_iter().enumerate() {
            let id = format!("{}_chunk_{}", document.id, i);
            let mut fragment = Fragment::new(id, document.id.clone(), span.text);
            fragment.start_offset = span.start;
            fragment.end_offset = span.end;
            self.metadata.extract(document, &mut fragment, i, chunk_count);
            fragments.push(fragment);
        }

        if fragments.is_empty() {
            return Ok(ProcessingOutcome {
                document_id: document.id.clone(),
                fragments,
            });
        }

        let texts: Vec<String> = fragments.iter().map(|f| f.text.clone()).collect();
        let embeddings = self
            .embedder
            .embed_batch(&texts)
            .await
            .map_err(|e| KbError::Processing(ProcessingError::Embedding(e.to_string())))?;

        for (fragment, embedding) in fragments.iter_mut().zip(embeddings.into_iter()) {
            fragment.embedding = Some(embedding);
        }

        Ok(ProcessingOutcome {
            document_id: document.id.clone(),
            fragments,
        })
    }

    /// Process a batch of documents concurrently, bounded by a semaphore.
    /// A document that fails is logged and skipped rather than aborting the
    /// whole batch.
    pub async fn process_batch(&self, documents: &[Document]) -> Vec<ProcessingOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_tasks));
        let futures = documents.iter().map(|doc| {
            let semaphore = semaphore.clone();
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore not closed");
                self.process_document(doc).await
            }
        });

        let results = futures::future::join_all(futures).await;

        results
            .into_iter()
            .zip(documents.iter())
            .filter_map(|(result, doc)| match result {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    error!(document_id = %doc.id, error = %e, "document processing failed, skipping");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentType;
    use async_trait::async_trait;
    use crate::fragment::Vector;

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

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vector> {
            Err(KbError::Processing(ProcessingError::Embedding("boom".into())))
        }

        fn dimensions(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn process_document_assigns_deterministic_ids() {
        let processor = Processor::new(ChunkingConfig::default(), Arc::new(StubEmbedder), 4);
        let doc = Document::new("doc1", "hello world, this is a test document.", DocumentType::Text);
        let outcome = processor.process_document(&doc).await.unwrap();
        assert_eq!(outcome.fragments[0].id, "doc1_chunk_0");
        assert!(outcome.fragments[0].embedding.is_some());
    }

    #[tokio::test]
    async fn process_document_sets_chunk_count_and_document_id_on_every_fragment() {
        let mut config = ChunkingConfig::default();
        config.strategy = crate::config::ChunkingStrategy::Fixed;
        config.chunk_size = 20;
        config.chunk_overlap = 0;
        let processor = Processor::new(config, Arc::new(StubEmbedder), 4);
        let doc = Document::new("doc1", "x".repeat(40), DocumentType::Text);
        let outcome = processor.process_document(&doc).await.unwrap();

        assert_eq!(outcome.fragments.len(), 2);
        for fragment in &outcome.fragments {
            assert_eq!(
                fragment.metadata.get("chunk_count"),
                Some(&crate::document::MetadataValue::Number(2.0))
            );
            assert_eq!(
                fragment.metadata.get("document_id"),
                Some(&crate::document::MetadataValue::String("doc1".into()))
            );
        }
    }

    #[tokio::test]
    async fn process_document_converts_html_to_text_before_chunking() {
        let processor = Processor::new(ChunkingConfig::default(), Arc::new(StubEmbedder), 4);
        let doc = Document::new("doc1", "<p>hello world</p>", DocumentType::Html);
        let outcome = processor.process_document(&doc).await.unwrap();
        assert_eq!(outcome.fragments[0].text, "hello world");
    }

    #[tokio::test]
    async fn process_batch_skips_failed_documents() {
        let processor = Processor::new(ChunkingConfig::default(), Arc::new(FailingEmbedder), 2);
        let docs = vec![
            Document::new("d1", "text one", DocumentType::Text),
            Document::new("d2", "text two", DocumentType::Text),
        ];
        let outcomes = processor.process_batch(&docs).await;
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn process_batch_keeps_successful_documents() {
        let processor = Processor::new(ChunkingConfig::default(), Arc::new(StubEmbedder), 2);
        let docs = vec![
            Document::new("d1", "text one", DocumentType::Text),
            Document::new("d2", "text two", DocumentType::Text),
        ];
        let outcomes = processor.process_batch(&docs).await;
        assert_eq!(outcomes.len(), 2);
    }
}
