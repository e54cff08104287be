//! archivist: a retrieval-augmented knowledge base.
//!
//! Ingests documents, chunks and embeds them into fragments, stores
//! fragments in a pluggable vector store, retrieves relevant fragments for a
//! query through a cached retriever, and answers queries with citations
//! through a small agent-based orchestration fabric.

pub mod agent;
pub mod cache;
pub mod chunking;
pub mod citation;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod format;
pub mod fragment;
pub mod generation;
pub mod metadata;
pub mod processor;
pub mod retriever;
pub mod store;

pub use agent::{AddDocumentOutcome, AgentMessage, BaseAgent, MessageType, Orchestrator, RetrievalAgent};
pub use cache::{CacheStats, RetrievalCache};
pub use chunking::{ChunkSpan, Chunker};
pub use citation::SourceAttributor;
pub use config::{
    ChunkingConfig, ChunkingStrategy, CitationStyle, EmbeddingConfig, GenerationConfig, KbConfig, RetrievalConfig,
    StorageConfig,
};
pub use document::{Document, DocumentId, DocumentType, Metadata, MetadataValue};
pub use embedding::Embedder;
pub use error::{KbError, Result};
pub use format::{convert, detect_type};
pub use fragment::{Citation, Fragment, FragmentId, QueryResult, RetrievalResult, Vector};
pub use generation::{build_prompt, GenerationRequest, Generator, TextGenerationModel};
pub use metadata::MetadataExtractor;
pub use processor::{Processor, ProcessingOutcome};
pub use retriever::Retriever;
pub use store::{cosine_similarity, MetadataFilter, StoreStats, VectorStoreProvider};

/// Crate version, exposed for diagnostics and compatibility checks.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
