//! Recursive chunking: try separators in order, falling back to a hard split
//! with overlap when none apply.

use super::{ChunkSpan, TextChunker};
use crate::config::ChunkingConfig;

pub struct RecursiveChunker;

impl TextChunker for RecursiveChunker {
    fn split(&self, text: &str, config: &ChunkingConfig) -> Vec<ChunkSpan> {
        let mut spans = Vec::new();
        split_into(text, 0, config, &config.separators, &mut spans);
        spans
    }
}

fn split_into(
    text: &str,
    base_offset: usize,
    config: &ChunkingConfig,
    separators: &[String],
    out: &mut Vec<ChunkSpan>,
) {
    if text.is_empty() {
        return;
    }
    if text.len() <= config.chunk_size {
        out.push(ChunkSpan {
            text: text.to_string(),
            start: base_offset,
            end: base_offset + text.len(),
        });
        return;
    }

    let Some((sep, rest)) = separators.split_first() else {
        hard_split(text, base_offset, config, out);
        return;
    };

    if sep.is_empty() {
        hard_split(text, base_offset, config, out);
        return;
    }

    let parts: Vec<&str> = text.split(sep.as_str()).collect();
    if parts.len() <= 1 {
        split_into(text, base_offset, config, rest, out);
        return;
    }

    let mut current = String::new();
    let mut current_start = base_offset;
    let mut cursor = base_offset;

    for (i, part) in parts.iter().enumerate() {
        let candidate_len = if current.is_empty() {
            part.len()
        } else {
            current.len() + sep.len() + part.len()
        };

        if candidate_len > config.chunk_size && !current.is_empty() {
            out.push(ChunkSpan {
                text: current.clone(),
                start: current_start,
                end: current_start + current.len(),
            });
            let overlap_start = current.len().saturating_sub(config.chunk_overlap);
            let overlap_text: String = current[overlap_start..].to_string();
            current_start = current_start + overlap_start;
            current = overlap_text;
        }

        if !current.is_empty() {
            current.push_str(sep);
        }
        current.push_str(part);

        cursor += part.len();
        if i + 1 < parts.len() {
            cursor += sep.len();
        }
    }

    if !current.is_empty() {
        if current.len() > config.chunk_size {
            split_into(&current.clone(), current_start, config, rest, out);
        } else {
            out.push(ChunkSpan {
                text: current.clone(),
                start: current_start,
                end: current_start + current.len(),
            });
        }
    }
}

/// No separator applies: split at fixed byte boundaries with overlap.
fn hard_split(text: &str, base_offset: usize, config: &ChunkingConfig, out: &mut Vec<ChunkSpan>) {
    let bytes = text.as_bytes();
    let mut start = 0usize;
    while start < bytes.len() {
        let end = (start + config.chunk_size).min(bytes.len());
        out.push(ChunkSpan {
            text: text[start..end].to_string(),
            start: base_offset + start,
            end: base_offset + end,
        });
        if end == bytes.len() {
            break;
        }
        let next_start = if config.chunk_overlap >= end - start {
            end
        } else {
            end - config.chunk_overlap
        };
        start = next_start;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(chunk_size: usize, overlap: usize) -> ChunkingConfig {
        let mut c = ChunkingConfig::default();
        c.chunk_size = chunk_size;
        c.chunk_overlap = overlap;
        c
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunker = RecursiveChunker;
        let spans = chunker.split("hello world", &config(1000, 200));
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "hello world");
    }

    #[test]
    fn long_text_splits_on_paragraphs() {
        let text = "para one is here.\n\npara two is here.\n\npara three is here.".repeat(20);
        let chunker = RecursiveChunker;
        let spans = chunker.split(&text, &config(100, 20));
        assert!(spans.len() > 1);
        assert_eq!(spans.last().unwrap().end, text.len());
    }

    #[test]
    fn hard_split_terminates_and_covers() {
        let text = "x".repeat(1000);
        let chunker = RecursiveChunker;
        let spans = chunker.split(&text, &config(50, 10));
        assert!(spans.len() > 1);
        assert_eq!(spans.last().unwrap().end, text.len());
    }
}
