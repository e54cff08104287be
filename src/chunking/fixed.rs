//! Fixed-size chunking: advance by `chunk_size - chunk_overlap`, optionally
//! nudging the boundary backward onto a sentence or word break.

use super::{ChunkSpan, TextChunker};
use crate::config::ChunkingConfig;

const SENTENCE_ENDS: [&str; 6] = [". ", "! ", "? ", ".\n", "!\n", "?\n"];

fn find_better_split_point(text: &str, position: usize, window: usize) -> usize {
    let lo = position.saturating_sub(window);
    let search_region = &text[lo..position];

    let mut best: Option<usize> = None;
    for marker in SENTENCE_ENDS {
        if let Some(idx) = search_region.rfind(marker) {
            let candidate = lo + idx + marker.len();
            best = Some(best.map_or(candidate, |b: usize| b.max(candidate)));
        }
    }
    if let Some(b) = best {
        return b;
    }
    if let Some(idx) = search_region.rfind(' ') {
        return lo + idx + 1;
    }
    position
}

pub struct FixedChunker;

impl TextChunker for FixedChunker {
    fn split(&self, text: &str, config: &ChunkingConfig) -> Vec<ChunkSpan> {
        let mut spans = Vec::new();
        let len = text.len();
        let mut start = 0usize;
        let window = 50usize.min((config.chunk_size / 10).max(1));

        while start < len {
            let mut end = (start + config.chunk_size).min(len);

            if config.respect_sentence_boundary && end != len && end != start {
                let adjusted = find_better_split_point(text, end, window);
                if adjusted > start {
                    end = adjusted;
                }
            }

            spans.push(ChunkSpan {
                text: text[start..end].to_string(),
                start,
                end,
            });

            if end == len {
                break;
            }

            start = if config.chunk_overlap >= end - start {
                end
            } else {
                end - config.chunk_overlap
            };
        }

        spans
    }
}
