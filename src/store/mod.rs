//! Pluggable vector store contract and an in-memory reference
//! implementation.

pub mod memory;
pub mod registry;

use crate::document::Metadata;
use crate::error::Result;
use crate::fragment::{Fragment, FragmentId, RetrievalResult, Vector};
use async_trait::async_trait;
use std::collections::HashMap;

/// Optional equality filters applied to the metadata index before similarity
/// scoring.
pub type MetadataFilter = HashMap<String, String>;

/// Storage-layer statistics, surfaced for health checks.
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub fragment_count: usize,
    pub document_count: usize,
}

/// A pluggable backing store for fragments and their embeddings.
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    async fn initialize(&self) -> Result<()>;

    /// Add fragments (which must already carry embeddings) to the store.
    /// Returns `false` rather than an error when doing so would exceed
    /// configured capacity.
    async fn add_fragments(&self, fragments: Vec<Fragment>) -> Result<bool>;

    async fn search(
        &self,
        query: &Vector,
        top_k: usize,
        filters: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalResult>>;

    /// Term-overlap search over fragment text, independent of embeddings.
    /// Used as the keyword half of a hybrid retrieval path.
    async fn keyword_search(
        &self,
        query: &str,
        top_k: usize,
        filters: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalResult>>;

    async fn get_fragment(&self, id: &FragmentId) -> Result<Option<Fragment>>;

    /// Batch fetch by id; ids with no matching fragment are simply absent
    /// from the result rather than erroring.
    async fn get_chunks(&self, ids: &[FragmentId]) -> Result<Vec<Fragment>>;

    /// Fetch every fragment belonging to one document, in no particular order.
    async fn get_document(&self, document_id: &str) -> Result<Vec<Fragment>>;

    async fn delete_document(&self, document_id: &str) -> Result<usize>;

    /// Delete specific fragments by id, returning how many existed.
    async fn delete_chunks(&self, ids: &[FragmentId]) -> Result<usize>;

    /// Merge `updates` into a fragment's existing metadata, leaving keys not
    /// present in `updates` untouched, and re-indexing any changed keys.
    async fn update_metadata(&self, id: &FragmentId, updates: Metadata) -> Result<bool>;

    async fn stats(&self) -> Result<StoreStats>;

    async fn clear(&self) -> Result<()>;

    /// Flush any pending state (e.g. to disk) and release resources. A no-op
    /// for providers with nothing to flush.
    async fn close(&self) -> Result<()>;
}

/// Cosine similarity between two equal-length vectors, clamped to `[0, 1]`.
/// Returns 0.0 for mismatched lengths or zero-magnitude vectors; opposed
/// vectors are floored to 0 rather than reported as negative.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

pub fn matches_filters(metadata: &Metadata, filters: &MetadataFilter) -> bool {
    filters.iter().all(|(k, v)| {
        metadata
            .get(k)
            .map(|value| &value.index_key() == v)
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_similarity_of_identical_vectors_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn cosine_similarity_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn cosine_similarity_of_opposed_vectors_is_clamped_to_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), 0.0);
    }
}
