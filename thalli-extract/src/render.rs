//! Joining, budget enforcement, and the end-to-end entry points.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use serde::Serialize;

use crate::lines::filter_lines;
use crate::walker::walk;
use crate::{ExtractError, ExtractOptions};

/// Default character budget for a rendered document.
pub const DEFAULT_MAX_CHARS: usize = 12_000;

/// Appended when a document is cut at the budget.
pub const TRUNCATION_MARKER: &str = "\n\n[... content truncated ...]";

const LINE_SEPARATOR: &str = "\n\n";

static BODY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body[\s>/]").expect("BODY_TAG regex"));

/// Final cleaned document handed to the summarizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedDocument {
    pub text: String,
    /// Lines that survived both filter passes.
    pub lines: usize,
    pub truncated: bool,
}

impl RenderedDocument {
    /// Join `lines` with blank lines and cap the result at `max_chars`.
    ///
    /// ```
    /// use thalli_extract::{RenderedDocument, TRUNCATION_MARKER};
    ///
    /// let lines = vec!["alpha".to_string(), "beta".to_string()];
    /// let doc = RenderedDocument::from_lines(&lines, 8);
    /// assert_eq!(doc.text, format!("alpha\n\nb{TRUNCATION_MARKER}"));
    /// assert!(doc.truncated);
    /// ```
    pub fn from_lines(lines: &[String], max_chars: usize) -> Self {
        let mut text = lines.join(LINE_SEPARATOR);
        let truncated = match text.char_indices().nth(max_chars) {
            Some((cut, _)) => {
                text.truncate(cut);
                text.push_str(TRUNCATION_MARKER);
                true
            }
            None => false,
        };
        Self {
            text,
            lines: lines.len(),
            truncated,
        }
    }

    /// Degenerate-content outcome: the walk succeeded but nothing survived.
    pub fn is_empty(&self) -> bool {
        self.lines == 0
    }
}

/// Walk, filter, join, and cap an already parsed document.
///
/// The parser implies a `<body>` for most markup, so only trees without one
/// (framesets, fragments) fail here. Use [`extract_html`] on raw input.
pub fn extract(
    document: &mut Html,
    options: &ExtractOptions,
) -> Result<RenderedDocument, ExtractError> {
    let lines = filter_lines(walk(document, options)?);
    let rendered = RenderedDocument::from_lines(&lines, options.max_chars);
    tracing::debug!(
        target: "extract",
        lines = rendered.lines,
        chars = rendered.text.len(),
        truncated = rendered.truncated,
        "extract.render.done"
    );
    Ok(rendered)
}

/// Parse raw markup and run [`extract`] over it.
///
/// Markup without an explicit `<body>` start tag, blank input included, is
/// [`ExtractError::MissingBody`].
pub fn extract_html(html: &str, options: &ExtractOptions) -> Result<RenderedDocument, ExtractError> {
    if !BODY_TAG.is_match(html) {
        tracing::debug!(target: "extract", bytes = html.len(), "extract.render.no_body_tag");
        return Err(ExtractError::MissingBody);
    }
    let mut document = Html::parse_document(html);
    extract(&mut document, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn joins_with_blank_lines() {
        let doc = RenderedDocument::from_lines(&lines(&["# Title", "Body"]), 100);
        assert_eq!(doc.text, "# Title\n\nBody");
        assert_eq!(doc.lines, 2);
        assert!(!doc.truncated);
    }

    #[test]
    fn exact_budget_is_not_truncated() {
        let doc = RenderedDocument::from_lines(&lines(&["12345"]), 5);
        assert_eq!(doc.text, "12345");
        assert!(!doc.truncated);
    }

    #[test]
    fn output_never_exceeds_budget_plus_marker() {
        let body: Vec<String> = (0..500)
            .map(|i| format!("Line number {i} with some filler words"))
            .collect();
        for max in [0, 1, 10, 999, 12_000, 50_000] {
            let doc = RenderedDocument::from_lines(&body, max);
            assert!(doc.text.chars().count() <= max + TRUNCATION_MARKER.chars().count());
        }
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let doc = RenderedDocument::from_lines(&lines(&["\u{e9}\u{e9}\u{e9}"]), 2);
        assert_eq!(doc.text, format!("\u{e9}\u{e9}{TRUNCATION_MARKER}"));
    }

    #[test]
    fn empty_documents_are_flagged() {
        let doc = RenderedDocument::from_lines(&[], 10);
        assert!(doc.is_empty());
        assert_eq!(doc.text, "");
    }

    #[test]
    fn extract_html_runs_both_filter_passes() {
        let html = "<html><body>\
            <h2>Overview of the topic</h2>\
            <p>Summary text here today</p>\
            <p><b>John Doe wrote this</b></p>\
            <p>Read our privacy policy now</p>\
            </body></html>";
        let doc = extract_html(html, &ExtractOptions::default()).unwrap();
        assert_eq!(
            doc.text,
            "## Overview of the topic\n\nSummary text here today\n\nJohn Doe wrote this"
        );
    }

    #[test]
    fn one_word_headings_fall_below_the_token_floor() {
        let html = "<html><body><h2>Overview</h2><p>Summary text here today</p></body></html>";
        let doc = extract_html(html, &ExtractOptions::default()).unwrap();
        assert_eq!(doc.text, "Summary text here today");
    }

    #[test]
    fn body_tag_detection_ignores_case_and_lookalikes() {
        assert!(BODY_TAG.is_match("<BODY class='x'>"));
        assert!(BODY_TAG.is_match("<body>"));
        assert!(BODY_TAG.is_match("<body/>"));
        assert!(!BODY_TAG.is_match("<bodyguard>"));
        assert!(!BODY_TAG.is_match("</body>"));
    }

    #[test]
    fn extract_html_applies_budget() {
        let html = format!(
            "<html><body>{}</body></html>",
            "<p>some words repeated here</p>".repeat(1_000)
        );
        let opts = ExtractOptions {
            max_chars: 100,
            ..ExtractOptions::default()
        };
        let doc = extract_html(&html, &opts).unwrap();
        assert!(doc.truncated);
        assert_eq!(doc.text.len(), 100 + TRUNCATION_MARKER.len());
    }
}
