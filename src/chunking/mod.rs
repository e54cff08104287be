//! Chunking strategies.
//!
//! Each strategy splits a document's text into `(text, start, end)` spans. The
//! `Chunker` facade dispatches to the configured strategy and is the seam a
//! caller interacts with; the dispatch is keyed by `ChunkingStrategy`, a
//! pluggable-provider-selected-by-config pattern shared with the vector
//! store.

mod fixed;
mod paragraph;
mod recursive;
mod sentence;

use crate::config::{ChunkingConfig, ChunkingStrategy};

/// A single chunk span produced by a strategy, before fragment ids are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Common interface implemented by every chunking strategy.
pub trait TextChunker {
    fn split(&self, text: &str, config: &ChunkingConfig) -> Vec<ChunkSpan>;
}

/// Dispatches to one of the four named chunking strategies based on the
/// configured `ChunkingStrategy`.
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn chunk(&self, text: &str) -> Vec<ChunkSpan> {
        if text.is_empty() {
            return Vec::new();
        }
        let strategy: Box<dyn TextChunker> = match self.config.strategy {
            ChunkingStrategy::Recursive => Box::new(recursive::RecursiveChunker),
            ChunkingStrategy::Sentence => Box::new(sentence::SentenceChunker),
            ChunkingStrategy::Paragraph => Box::new(paragraph::ParagraphChunker),
            ChunkingStrategy::Fixed => Box::new(fixed::FixedChunker),
        };
        strategy.split(text, &self.config)
    }
}
