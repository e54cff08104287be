//! Paragraph chunking: split on blank-line boundaries, packing paragraphs up
//! to `chunk_size`; any paragraph exceeding `chunk_size` on its own is handed
//! to the recursive strategy.

use super::recursive::RecursiveChunker;
use super::{ChunkSpan, TextChunker};
use crate::config::ChunkingConfig;

fn split_paragraphs(text: &str) -> Vec<(&str, usize, usize)> {
    let mut paragraphs = Vec::new();
    let mut start = 0usize;
    let bytes = text.as_bytes();
    let mut i = 0usize;
    while i + 1 < bytes.len() {
        if &bytes[i..i + 2] == b"\n\n" {
            if i > start {
                paragraphs.push((&text[start..i], start, i));
            }
            let mut j = i + 2;
            while j + 1 < bytes.len() && &bytes[j..j + 2] == b"\n\n" {
                j += 2;
            }
            start = j;
            i = j;
        } else {
            i += 1;
        }
    }
    if start < text.len() {
        paragraphs.push((&text[start..], start, text.len()));
    }
    paragraphs
}

pub struct ParagraphChunker;

impl TextChunker for ParagraphChunker {
    fn split(&self, text: &str, config: &ChunkingConfig) -> Vec<ChunkSpan> {
        let paragraphs = split_paragraphs(text);
        if paragraphs.is_empty() {
            return Vec::new();
        }

        let mut spans = Vec::new();
        let mut current = String::new();
        let mut current_start = paragraphs[0].1;

        for (para, start, end) in &paragraphs {
            if para.len() > config.chunk_size {
                if !current.is_empty() {
                    spans.push(ChunkSpan {
                        text: current.clone(),
                        start: current_start,
                        end: current_start + current.len(),
                    });
                    current.clear();
                }
                let sub = RecursiveChunker;
                for mut span in sub.split(para, config) {
                    span.start += start;
                    span.end += start;
                    spans.push(span);
                }
                current_start = *end;
                continue;
            }

            let candidate_len = if current.is_empty() {
                para.len()
            } else {
                current.len() + 2 + para.len()
            };

            if candidate_len > config.chunk_size && !current.is_empty() {
                spans.push(ChunkSpan {
                    text: current.clone(),
                    start: current_start,
                    end: current_start + current.len(),
                });
                current.clear();
                current_start = *start;
            }

            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(para);
        }

        if !current.is_empty() {
            spans.push(ChunkSpan {
                text: current.clone(),
                start: current_start,
                end: current_start + current.len(),
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
