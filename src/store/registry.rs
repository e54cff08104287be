//! Provider registry: resolves a configured provider name string to a
//! concrete `VectorStoreProvider` constructor.

use super::memory::InMemoryVectorStore;
use super::VectorStoreProvider;
use crate::config::StorageConfig;
use crate::error::{KbError, Result, StorageError};
use std::sync::Arc;

/// Construct a `VectorStoreProvider` for the named provider. Only `"memory"`
/// ships with the crate; external providers register by extending this
/// match in application code that depends on `archivist`.
pub fn build_provider(config: &StorageConfig) -> Result<Arc<dyn VectorStoreProvider>> {
    match config.provider.as_str() {
        "memory" => Ok(Arc::new(InMemoryVectorStore::new(config.clone()))),
        other => Err(KbError::Storage(StorageError::UnknownProvider(other.to_string()))),
    }
}
