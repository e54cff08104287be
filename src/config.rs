//! Typed configuration for the knowledge base: nested section structs,
//! `Default` impls, `validate()`, and file loading dispatched by extension.

use crate::error::{KbError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Chunking strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingStrategy {
    Recursive,
    Sentence,
    Paragraph,
    Fixed,
}

impl Default for ChunkingStrategy {
    fn default() -> Self {
        ChunkingStrategy::Recursive
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub strategy: ChunkingStrategy,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub separators: Vec<String>,
    pub respect_sentence_boundary: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: ChunkingStrategy::default(),
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: vec!["\n\n".into(), "\n".into(), " ".into(), "".into()],
            respect_sentence_boundary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimensions: usize,
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "default".into(),
            dimensions: 384,
            batch_size: 32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub provider: String,
    pub max_chunks: usize,
    pub persistence_enabled: bool,
    pub persistence_path: String,
    pub auto_save: bool,
    pub auto_save_interval_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: "memory".into(),
            max_chunks: 100_000,
            persistence_enabled: false,
            persistence_path: "./kb_storage".into(),
            auto_save: true,
            auto_save_interval_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub min_score: f32,
    pub cache_enabled: bool,
    pub cache_size: usize,
    pub cache_ttl_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_score: 0.0,
            cache_enabled: true,
            cache_size: 1000,
            cache_ttl_secs: 3600,
        }
    }
}

/// Reference-marker style used when rendering a query answer's sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationStyle {
    Numbered,
    Bullet,
}

impl Default for CitationStyle {
    fn default() -> Self {
        CitationStyle::Numbered
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub stream: bool,
    pub citation_style: CitationStyle,
    pub include_references_section: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "default".into(),
            max_tokens: 512,
            temperature: 0.3,
            stream: false,
            citation_style: CitationStyle::default(),
            include_references_section: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentFabricConfig {
    pub batch_size: usize,
    pub max_concurrent_tasks: usize,
}

impl Default for AgentFabricConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_concurrent_tasks: 5,
        }
    }
}

/// Top-level configuration aggregating every subsystem section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KbConfig {
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub storage: StorageConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
    pub agents: AgentFabricConfig,
}

impl KbConfig {
    /// Load configuration from a file, dispatching on extension (toml/json/yaml/yml).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&contents)
                .map_err(|e| KbError::Configuration(format!("invalid TOML: {e}")))?,
            Some("json") => serde_json::from_str(&contents)?,
            Some("yaml") | Some("yml") => serde_yml::from_str(&contents)
                .map_err(|e| KbError::Configuration(format!("invalid YAML: {e}")))?,
            other => {
                return Err(KbError::Configuration(format!(
                    "unsupported config extension: {other:?}"
                )))
            }
        };
        Ok(config)
    }

    /// Persist configuration to a file, dispatching on extension.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let serialized = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => {
                toml::to_string_pretty(self).map_err(|e| KbError::Configuration(e.to_string()))?
            }
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("yaml") | Some("yml") => {
                serde_yml::to_string(self).map_err(|e| KbError::Configuration(e.to_string()))?
            }
            other => {
                return Err(KbError::Configuration(format!(
                    "unsupported config extension: {other:?}"
                )))
            }
        };
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Validate cross-field invariants, mirroring `AgentConfig::validate`.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(KbError::Configuration("chunk_size must be > 0".into()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(KbError::Configuration(
                "chunk_overlap must be smaller than chunk_size".into(),
            ));
        }
        if self.embedding.dimensions == 0 {
            return Err(KbError::Configuration("embedding dimensions must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.retrieval.min_score) {
            return Err(KbError::Configuration(
                "retrieval.min_score must be within [0, 1]".into(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(KbError::Configuration("retrieval.top_k must be > 0".into()));
        }
        if self.storage.max_chunks == 0 {
            return Err(KbError::Configuration("storage.max_chunks must be > 0".into()));
        }
        if self.agents.max_concurrent_tasks == 0 {
            return Err(KbError::Configuration(
                "agents.max_concurrent_tasks must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let cfg = KbConfig::default();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_overlap_exceeding_chunk_size() {
        let mut cfg = KbConfig::default();
        cfg.chunking.chunk_overlap = cfg.chunking.chunk_size;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_min_score() {
        let mut cfg = KbConfig::default();
        cfg.retrieval.min_score = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn round_trips_through_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let cfg = KbConfig::default();
        cfg.to_file(&path).unwrap();
        let loaded = KbConfig::from_file(&path).unwrap();
        assert_eq!(loaded.chunking.chunk_size, cfg.chunking.chunk_size);
    }
}
