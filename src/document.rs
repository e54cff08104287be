//! Document data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque document identifier
pub type DocumentId = String;

/// A restricted JSON-compatible union used for document and fragment metadata.
///
/// Keeping this bounded (rather than an arbitrary `serde_json::Value`) means the
/// in-memory store's metadata index only ever has to reason about a fixed set of
/// shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    String(String),
    Number(f64),
    Bool(bool),
    List(Vec<MetadataValue>),
    Map(HashMap<String, MetadataValue>),
}

impl MetadataValue {
    /// String rendering used by the metadata index, which only keys scalar values
    /// (string/number/bool) and stringifies everything else.
    pub fn index_key(&self) -> String {
        match self {
            MetadataValue::String(s) => s.clone(),
            MetadataValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            MetadataValue::Bool(b) => b.to_string(),
            MetadataValue::List(_) | MetadataValue::Map(_) => serde_json::to_string(self)
                .unwrap_or_default(),
        }
    }

    /// Heuristically decode a string coerced by a JSON round-trip back into
    /// int/float/bool where the textual form permits.
    pub fn decode_heuristic(s: &str) -> MetadataValue {
        if let Ok(i) = s.parse::<i64>() {
            return MetadataValue::Number(i as f64);
        }
        if let Ok(f) = s.parse::<f64>() {
            return MetadataValue::Number(f);
        }
        match s {
            "true" => MetadataValue::Bool(true),
            "false" => MetadataValue::Bool(false),
            _ => MetadataValue::String(s.to_string()),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::String(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::String(s)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        MetadataValue::Bool(b)
    }
}

impl From<i64> for MetadataValue {
    fn from(n: i64) -> Self {
        MetadataValue::Number(n as f64)
    }
}

impl From<usize> for MetadataValue {
    fn from(n: usize) -> Self {
        MetadataValue::Number(n as f64)
    }
}

impl From<f64> for MetadataValue {
    fn from(n: f64) -> Self {
        MetadataValue::Number(n)
    }
}

/// Bounded metadata mapping attached to documents and fragments.
pub type Metadata = HashMap<String, MetadataValue>;

/// Enumerated document content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Text,
    Markdown,
    Html,
    Pdf,
    Docx,
    Code,
    Image,
    Audio,
    Video,
    Url,
    Unknown,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Text => "text",
            DocumentType::Markdown => "markdown",
            DocumentType::Html => "html",
            DocumentType::Pdf => "pdf",
            DocumentType::Docx => "docx",
            DocumentType::Code => "code",
            DocumentType::Image => "image",
            DocumentType::Audio => "audio",
            DocumentType::Video => "video",
            DocumentType::Url => "url",
            DocumentType::Unknown => "unknown",
        }
    }
}

impl std::str::FromStr for DocumentType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => DocumentType::Text,
            "markdown" | "md" => DocumentType::Markdown,
            "html" | "htm" => DocumentType::Html,
            "pdf" => DocumentType::Pdf,
            "docx" => DocumentType::Docx,
            "code" => DocumentType::Code,
            "image" => DocumentType::Image,
            "audio" => DocumentType::Audio,
            "video" => DocumentType::Video,
            "url" => DocumentType::Url,
            _ => DocumentType::Unknown,
        })
    }
}

/// A document ingested into the knowledge base. Immutable after creation;
/// the Collection layer is the only component that constructs one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub content: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    #[serde(default)]
    pub metadata: Metadata,
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>, doc_type: DocumentType) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            doc_type,
            metadata: Metadata::new(),
            source: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}
