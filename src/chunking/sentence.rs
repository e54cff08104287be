//! Sentence-boundary chunking: pack sentences up to `chunk_size`, overlapping
//! on a sentence boundary when one falls near the desired overlap point.

use super::{ChunkSpan, TextChunker};
use crate::config::ChunkingConfig;
use regex::Regex;
use std::sync::OnceLock;

fn boundary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+\s+|[。！？]+\s*").unwrap())
}

struct Sentence<'a> {
    text: &'a str,
    start: usize,
    end: usize,
}

fn split_sentences(text: &str) -> Vec<Sentence<'_>> {
    let re = boundary_re();
    let mut sentences = Vec::new();
    let mut last_end = 0usize;
    for m in re.find_iter(text) {
        let end = m.end();
        if end > last_end {
            sentences.push(Sentence {
                text: &text[last_end..end],
                start: last_end,
                end,
            });
        }
        last_end = end;
    }
    if last_end < text.len() {
        sentences.push(Sentence {
            text: &text[last_end..],
            start: last_end,
            end: text.len(),
        });
    }
    sentences
}

/// Search a +-100 char window around `target` for a sentence boundary in `sentences`.
fn find_sentence_overlap(sentences: &[Sentence], target: usize) -> Option<usize> {
    const WINDOW: usize = 100;
    sentences
        .iter()
        .map(|s| s.start)
        .filter(|&start| start.abs_diff(target) <= WINDOW)
        .min_by_key(|&start| start.abs_diff(target))
}

pub struct SentenceChunker;

impl TextChunker for SentenceChunker {
    fn split(&self, text: &str, config: &ChunkingConfig) -> Vec<ChunkSpan> {
        let sentences = split_sentences(text);
        if sentences.is_empty() {
            return Vec::new();
        }

        let mut spans = Vec::new();
        let mut current_start = sentences[0].start;
        let mut current_end = sentences[0].start;
        let mut i = 0usize;

        while i < sentences.len() {
            let s = &sentences[i];
            let candidate_len = s.end - current_start;
            if candidate_len > config.chunk_size && current_end > current_start {
                spans.push(ChunkSpan {
                    text: text[current_start..current_end].to_string(),
                    start: current_start,
                    end: current_end,
                });

                let desired_overlap_start = current_end.saturating_sub(config.chunk_overlap);
                let next_start = find_sentence_overlap(&sentences[..i], desired_overlap_start)
                    .filter(|&start| current_end - start <= config.chunk_overlap * 2)
                    .unwrap_or(desired_overlap_start.max(current_start));

                current_start = next_start;
                current_end = next_start;
                continue;
            }
            current_end = s.end;
            i += 1;
        }

        if current_end > current_start {
            spans.push(ChunkSpan {
                text: text[current_start..current_end].to_string(),
                start: current_start,
                end: current_end,
            });
        }

        if let Some(last) = spans.last() {
            if last.end < text.len() {
                spans.push(ChunkSpan {
                    text: text[last.end..].to_string(),
                    start: last.end,
                    end: text.len(),
                });
            }
        }

        spans
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
    fn single_short_sentence_is_one_chunk() {
        let chunker = SentenceChunker;
        let spans = chunker.split("Hello world.", &config(1000, 200));
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn long_text_splits_on_sentence_boundaries_and_covers() {
        let text = "This is a sentence. ".repeat(50);
        let chunker = SentenceChunker;
        let spans = chunker.split(&text, &config(100, 20));
        assert!(spans.len() > 1);
        assert_eq!(spans.last().unwrap().end, text.len());
    }
}
