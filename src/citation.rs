//! Source attribution: turns retrieval results into citations attached to a
//! generated answer, with an optional rendered references section.

use crate::config::CitationStyle;
use crate::fragment::{Citation, RetrievalResult};

const EXCERPT_LEN: usize = 200;

#[derive(Clone)]
pub struct SourceAttributor {
    style: CitationStyle,
    include_references: bool,
}

impl SourceAttributor {
    pub fn new(style: CitationStyle, include_references: bool) -> Self {
        Self {
            style,
            include_references,
        }
    }

    pub fn attribute(&self, results: &[RetrievalResult]) -> Vec<Citation> {
        results
            .iter()
            .map(|r| Citation {
                document_id: r.fragment.document_id.clone(),
                fragment_id: r.fragment.id.clone(),
                text_excerpt: excerpt(&r.fragment.text),
                score: r.score,
            })
            .collect()
    }

    /// Mean of retrieved scores, used as the query's overall confidence.
    pub fn confidence(&self, results: &[RetrievalResult]) -> f32 {
        if results.is_empty() {
            return 0.0;
        }
        results.iter().map(|r| r.score).sum::<f32>() / results.len() as f32
    }

    /// The generated answer with a rendered references section appended,
    /// honoring `citation_style` and `include_references_section`.
    pub fn attributed_answer(&self, answer: &str, citations: &[Citation]) -> String {
        if !self.include_references || citations.is_empty() {
            return answer.to_string();
        }
        format!("{answer}\n\n{}", self.render_references(citations))
    }

    /// Render a "References" block: `[n] document_id — excerpt` for
    /// `CitationStyle::Numbered`, `- document_id — excerpt` for
    /// `CitationStyle::Bullet`.
    pub fn render_references(&self, citations: &[Citation]) -> String {
        let mut section = String::from("References:");
        for (i, citation) in citations.iter().enumerate() {
            let marker = match self.style {
                CitationStyle::Numbered => format!("[{}]", i + 1),
                CitationStyle::Bullet => "-".to_string(),
            };
            section.push_str(&format!(
                "\n{marker} {} — {}",
                citation.document_id, citation.text_excerpt
            ));
        }
        section
    }
}

impl Default for SourceAttributor {
    fn default() -> Self {
        Self::new(CitationStyle::default(), true)
    }
}

fn excerpt(text: &str) -> String {
    if text.len() <= EXCERPT_LEN {
        text.to_string()
    } else {
        let mut end = EXCERPT_LEN;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Fragment;

    fn result(text: &str, score: f32) -> RetrievalResult {
        RetrievalResult {
            fragment: Fragment::new("d1_chunk_0", "d1", text),
            score,
            rank: 0,
        }
    }

    fn attributor(style: CitationStyle) -> SourceAttributor {
        SourceAttributor::new(style, true)
    }

    #[test]
    fn attribute_maps_one_citation_per_result() {
        let results = vec![result("short text", 0.8)];
        let citations = attributor(CitationStyle::Numbered).attribute(&results);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].text_excerpt, "short text");
    }

    #[test]
    fn excerpt_truncates_long_text() {
        let long_text = "a".repeat(300);
        let results = vec![result(&long_text, 0.5)];
        let citations = attributor(CitationStyle::Numbered).attribute(&results);
        assert!(citations[0].text_excerpt.ends_with("..."));
        assert!(citations[0].text_excerpt.len() <= EXCERPT_LEN + 3);
    }

    #[test]
    fn confidence_is_mean_score() {
        let results = vec![result("a", 1.0), result("b", 0.0)];
        assert_eq!(attributor(CitationStyle::Numbered).confidence(&results), 0.5);
    }

    #[test]
    fn confidence_of_no_results_is_zero() {
        assert_eq!(attributor(CitationStyle::Numbered).confidence(&[]), 0.0);
    }

    #[test]
    fn numbered_style_renders_bracketed_markers() {
        let results = vec![result("alpha", 0.9), result("beta", 0.7)];
        let source_attributor = attributor(CitationStyle::Numbered);
        let citations = source_attributor.attribute(&results);
        let rendered = source_attributor.render_references(&citations);
        assert!(rendered.contains("[1]"));
        assert!(rendered.contains("[2]"));
    }

    #[test]
    fn bullet_style_renders_dash_markers() {
        let results = vec![result("alpha", 0.9)];
        let source_attributor = attributor(CitationStyle::Bullet);
        let citations = source_attributor.attribute(&results);
        let rendered = source_attributor.render_references(&citations);
        assert!(rendered.contains("- d1"));
        assert!(!rendered.contains("[1]"));
    }

    #[test]
    fn attributed_answer_omits_references_when_disabled() {
        let results = vec![result("alpha", 0.9)];
        let source_attributor = SourceAttributor::new(CitationStyle::Numbered, false);
        let citations = source_attributor.attribute(&results);
        assert_eq!(source_attributor.attributed_answer("the answer", &citations), "the answer");
    }

    #[test]
    fn attributed_answer_appends_references_when_enabled() {
        let results = vec![result("alpha", 0.9)];
        let source_attributor = attributor(CitationStyle::Numbered);
        let citations = source_attributor.attribute(&results);
        let full = source_attributor.attributed_answer("the answer", &citations);
        assert!(full.starts_with("the answer"));
        assert!(full.contains("References:"));
    }
}
