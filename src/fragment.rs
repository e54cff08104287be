//! Fragment and query-result data model.

use crate::document::{DocumentId, Metadata};
use serde::{Deserialize, Serialize};

/// Opaque fragment identifier, deterministically derived by the Processor as
/// `{document_id}_chunk_{index}`.
pub type FragmentId = String;

/// A dense embedding vector.
pub type Vector = Vec<f32>;

/// A chunk of a document carrying its text, optional embedding, and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    pub id: FragmentId,
    pub document_id: DocumentId,
    pub text: String,
    pub embedding: Option<Vector>,
    #[serde(default)]
    pub metadata: Metadata,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl Fragment {
    pub fn new(id: impl Into<String>, document_id: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let end_offset = text.len();
        Self {
            id: id.into(),
            document_id: document_id.into(),
            text,
            embedding: None,
            metadata: Metadata::new(),
            start_offset: 0,
            end_offset,
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A single search hit: a fragment plus its similarity score and rank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub fragment: Fragment,
    pub score: f32,
    pub rank: usize,
}

impl RetrievalResult {
    pub fn text(&self) -> &str {
        &self.fragment.text
    }

    pub fn metadata(&self) -> &Metadata {
        &self.fragment.metadata
    }
}

/// A source attribution produced by the SourceAttributor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub document_id: DocumentId,
    pub fragment_id: FragmentId,
    pub text_excerpt: String,
    pub score: f32,
}

/// The full result of a retrieval-augmented query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub query: String,
    pub answer: String,
    pub sources: Vec<Citation>,
    #[serde(default)]
    pub confidence: f32,
    pub processing_time_ms: u64,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default = "default_success")]
    pub success: bool,
}

fn default_success() -> bool {
    true
}

impl QueryResult {
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_new_sets_default_offsets() {
        let f = Fragment::new("d1_chunk_0", "d1", "hello");
        assert_eq!(f.start_offset, 0);
        assert_eq!(f.end_offset, 5);
        assert!(!f.is_empty());
    }

    #[test]
    fn query_result_source_count() {
        let qr = QueryResult {
            query: "q".into(),
            answer: "a".into(),
            sources: vec![Citation {
                document_id: "d1".into(),
                fragment_id: "d1_chunk_0".into(),
                text_excerpt: "hello".into(),
                score: 0.9,
            }],
            confidence: 0.5,
            processing_time_ms: 10,
            metadata: Metadata::new(),
            success: true,
        };
        assert_eq!(qr.source_count(), 1);
    }
}
