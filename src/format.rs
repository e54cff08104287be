//! Content type detection and lightweight format conversion between plain
//! text, markdown, and HTML documents.

use crate::document::DocumentType;
use crate::error::{KbError, ProcessingError, Result};
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;

fn html_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

/// Detect a document's content type: first from a source hint's extension
/// (MIME-style "type/subtype" hints fall back to the subtype), then by
/// sniffing the content itself.
pub fn detect_type(content: &str, source_hint: Option<&str>) -> DocumentType {
    if let Some(hint) = source_hint {
        let candidate = hint.rsplit(['.', '/']).next().unwrap_or(hint);
        let detected = DocumentType::from_str(candidate).expect("DocumentType::from_str is infallible");
        if detected != DocumentType::Unknown {
            return detected;
        }
    }
    sniff_content(content)
}

fn sniff_content(content: &str) -> DocumentType {
    let trimmed = content.trim_start();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("<!doctype html") || lower.starts_with("<html") || html_tag_re().is_match(trimmed) {
        return DocumentType::Html;
    }
    const MARKDOWN_MARKERS: [&str; 6] = ["# ", "## ", "```", "](", "**", "\n- "];
    if MARKDOWN_MARKERS.iter().any(|m| trimmed.contains(m)) {
        return DocumentType::Markdown;
    }
    DocumentType::Text
}

/// Convert content between supported formats. Converting to the same type is
/// a no-op. Unsupported pairs return `ProcessingError::UnsupportedConversion`.
pub fn convert(content: &str, from: DocumentType, to: DocumentType) -> Result<String> {
    if from == to {
        return Ok(content.to_string());
    }
    match (from, to) {
        (DocumentType::Markdown, DocumentType::Text) => Ok(strip_markdown(content)),
        (DocumentType::Html, DocumentType::Text) => Ok(strip_html(content)),
        (DocumentType::Html, DocumentType::Markdown) => Ok(html_to_markdown(content)),
        _ => Err(KbError::Processing(ProcessingError::UnsupportedConversion {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        })),
    }
}

fn strip_markdown(content: &str) -> String {
    content
        .lines()
        .map(|line| {
            let line = line.trim_start_matches('#').trim_start();
            line.trim_start_matches("- ").trim_start_matches("* ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_html(content: &str) -> String {
    html_tag_re().replace_all(content, "").trim().to_string()
}

fn html_to_markdown(content: &str) -> String {
    let mut text = content.to_string();
    for level in (1..=6).rev() {
        let marker = "#".repeat(level);
        text = text.replace(&format!("<h{level}>"), &format!("{marker} "));
        text = text.replace(&format!("</h{level}>"), "\n");
    }
    text = text.replace("<strong>", "**").replace("</strong>", "**");
    text = text.replace("<em>", "_").replace("</em>", "_");
    text = text.replace("<li>", "- ").replace("</li>", "\n");
    text = text.replace("<p>", "").replace("</p>", "\n\n");
    html_tag_re().replace_all(&text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_html_from_content() {
        assert_eq!(detect_type("<html><body>hi</body></html>", None), DocumentType::Html);
    }

    #[test]
    fn detects_markdown_from_content() {
        assert_eq!(detect_type("# Title\n\nsome body text", None), DocumentType::Markdown);
    }

    #[test]
    fn falls_back_to_text() {
        assert_eq!(detect_type("just plain words here", None), DocumentType::Text);
    }

    #[test]
    fn source_hint_extension_takes_priority() {
        assert_eq!(detect_type("plain words", Some("notes.md")), DocumentType::Markdown);
    }

    #[test]
    fn markdown_to_text_round_trips_through_detection() {
        let markdown = "# Title\n\nsome body text";
        let text = convert(markdown, DocumentType::Markdown, DocumentType::Text).unwrap();
        assert_eq!(detect_type(&text, None), DocumentType::Text);
    }

    #[test]
    fn html_to_text_round_trips_through_detection() {
        let html = "<p>hello there</p>";
        let text = convert(html, DocumentType::Html, DocumentType::Text).unwrap();
        assert_eq!(detect_type(&text, None), DocumentType::Text);
    }

    #[test]
    fn html_to_markdown_round_trips_through_detection() {
        let html = "<h1>Title</h1><p>body</p>";
        let markdown = convert(html, DocumentType::Html, DocumentType::Markdown).unwrap();
        assert_eq!(detect_type(&markdown, None), DocumentType::Markdown);
    }

    #[test]
    fn unsupported_conversion_errors() {
        let err = convert("text", DocumentType::Text, DocumentType::Pdf);
        assert!(err.is_err());
    }
}
