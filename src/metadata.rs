//! Metadata extraction and merging, the seam between chunking and embedding.

use crate::document::{Document, Metadata, MetadataValue};
use crate::fragment::Fragment;

/// Derives per-fragment metadata from the owning document and chunk position,
/// merging in any document-level metadata. This is also the path through
/// which the optional `quality_score` is attached.
pub struct MetadataExtractor;

impl MetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, document: &Document, fragment: &mut Fragment, index: usize, chunk_count: usize) {
        for (k, v) in &document.metadata {
            fragment.metadata.entry(k.clone()).or_insert_with(|| v.clone());
        }
        fragment
            .metadata
            .insert("document_id".into(), MetadataValue::from(document.id.clone()));
        fragment
            .metadata
            .insert("document_type".into(), MetadataValue::from(document.doc_type.as_str()));
        fragment
            .metadata
            .insert("chunk_index".into(), MetadataValue::from(index as i64));
        fragment
            .metadata
            .insert("chunk_count".into(), MetadataValue::from(chunk_count as i64));
        if let Some(source) = &document.source {
            fragment.metadata.entry("source".into()).or_insert_with(|| source.clone().into());
        }
    }

    pub fn with_quality_score(&self, fragment: &mut Fragment, score: f32) {
        fragment
            .metadata
            .insert("quality_score".into(), MetadataValue::from(score as f64));
    }
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn _assert_metadata_type(_: &Metadata) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentType;

    #[test]
    fn extracts_document_type_index_and_chunk_count() {
        let doc = Document::new("d1", "hello", DocumentType::Markdown).with_source("a.md");
        let mut frag = Fragment::new("d1_chunk_0", "d1", "hello");
        MetadataExtractor::new().extract(&doc, &mut frag, 0, 2);
        assert_eq!(
            frag.metadata.get("document_id"),
            Some(&MetadataValue::String("d1".into()))
        );
        assert_eq!(
            frag.metadata.get("document_type"),
            Some(&MetadataValue::String("markdown".into()))
        );
        assert_eq!(frag.metadata.get("chunk_index"), Some(&MetadataValue::Number(0.0)));
        assert_eq!(frag.metadata.get("chunk_count"), Some(&MetadataValue::Number(2.0)));
        assert_eq!(frag.metadata.get("source"), Some(&MetadataValue::String("a.md".into())));
    }

    #[test]
    fn document_metadata_does_not_override_existing_fragment_metadata() {
        let doc = Document::new("d1", "hello", DocumentType::Text)
            .with_metadata("author", "jane");
        let mut frag = Fragment::new("d1_chunk_0", "d1", "hello");
        frag.metadata.insert("author".into(), MetadataValue::from("override"));
        MetadataExtractor::new().extract(&doc, &mut frag, 0, 1);
        assert_eq!(
            frag.metadata.get("author"),
            Some(&MetadataValue::String("override".into()))
        );
    }
}
