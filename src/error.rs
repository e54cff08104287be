//! Error taxonomy for the knowledge base

use thiserror::Error;

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, KbError>;

/// Top-level error type for the knowledge base
#[derive(Error, Debug)]
pub enum KbError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Processing error: {0}")]
    Processing(#[from] ProcessingError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

/// Chunking, embedding, or metadata extraction failures for a single document
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("chunking failed: {0}")]
    Chunking(String),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("metadata extraction failed: {0}")]
    Metadata(String),

    #[error("unsupported format conversion from {from:?} to {to:?}")]
    UnsupportedConversion { from: String, to: String },
}

/// Storage provider-level failures
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("operation failed: {0}")]
    Operation(String),

    #[error("capacity exceeded: would exceed max_chunks={max_chunks}")]
    CapacityExceeded { max_chunks: usize },

    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

/// Query embedding or provider search failures
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("query embedding failed: {0}")]
    Embedding(String),

    #[error("search failed: {0}")]
    Search(String),
}

/// Generator call failures
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("generation call failed: {0}")]
    CallFailed(String),

    #[error("generator produced an empty response")]
    EmptyResponse,
}

/// Malformed task, unsupported verb, or missing parameter in the agent fabric
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("unsupported task: {0}")]
    UnsupportedTask(String),

    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("unknown destination agent: {0}")]
    UnknownDestination(String),
}

impl KbError {
    /// Whether the error is retryable (provider connection errors retry with
    /// backoff; processing/generation errors do not).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            KbError::Storage(StorageError::Connection(_)) | KbError::Timeout(_)
        )
    }

    /// Category tag for logging/metrics.
    pub fn category(&self) -> &'static str {
        match self {
            KbError::Configuration(_) => "configuration",
            KbError::Processing(_) => "processing",
            KbError::Storage(_) => "storage",
            KbError::Retrieval(_) => "retrieval",
            KbError::Generation(_) => "generation",
            KbError::Agent(_) => "agent",
            KbError::Cancelled => "cancelled",
            KbError::Timeout(_) => "timeout",
            KbError::Io(_) => "io",
            KbError::Serialization(_) => "serialization",
            KbError::Generic(_) => "generic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        let conn = KbError::Storage(StorageError::Connection("down".into()));
        assert!(conn.is_retryable());

        let cfg = KbError::Configuration("bad".into());
        assert!(!cfg.is_retryable());
    }

    #[test]
    fn category_tags() {
        let e = KbError::Agent(AgentError::UnsupportedTask("frobnicate".into()));
        assert_eq!(e.category(), "agent");
    }
}
