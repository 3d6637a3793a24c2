//! Post-pass over rendered lines.
//!
//! These heuristics need the finished line (a byline only looks like a byline
//! once rendered), so they run after the walk rather than per element. Each
//! rule is a standalone predicate.

use std::sync::LazyLock;

use regex::Regex;

pub const PLACEHOLDER_MARKER: &str = "[Content Placeholder";

static BYLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z]+\s[A-Z][a-z]+$").expect("BYLINE regex"));

static BOLD_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*[^()\n]+\*\*").expect("BOLD_SPAN regex"));

static PARENTHETICAL_BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*\(.*\)\*\*").expect("PARENTHETICAL_BOLD regex"));

static SHORT_BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[*-]\s+(\w+\s*){1,3}$").expect("SHORT_BULLET regex"));

/// Which rule flagged a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRule {
    Byline,
    BareBold,
    ShortBullet,
    Placeholder,
}

/// Exactly two capitalized words, e.g. an author name.
pub fn is_byline(line: &str) -> bool {
    BYLINE.is_match(line.trim())
}

/// A bold span without a parenthetical qualifier.
pub fn is_bare_bold(line: &str) -> bool {
    BOLD_SPAN.is_match(line) && !PARENTHETICAL_BOLD.is_match(line)
}

/// `- ` or `* ` followed by one to three words.
pub fn is_short_bullet(line: &str) -> bool {
    SHORT_BULLET.is_match(line.trim())
}

pub fn is_placeholder(line: &str) -> bool {
    line.contains(PLACEHOLDER_MARKER)
}

pub fn unwanted(line: &str) -> Option<LineRule> {
    if is_byline(line) {
        Some(LineRule::Byline)
    } else if is_bare_bold(line) {
        Some(LineRule::BareBold)
    } else if is_short_bullet(line) {
        Some(LineRule::ShortBullet)
    } else if is_placeholder(line) {
        Some(LineRule::Placeholder)
    } else {
        None
    }
}

/// Drop unwanted lines, keeping the survivors in their original order.
///
/// ```
/// use thalli_extract::filter_lines;
///
/// let kept = filter_lines(vec![
///     "## Overview".to_string(),
///     "Summary text here".to_string(),
///     "**John Doe**".to_string(),
///     "John Doe".to_string(),
/// ]);
/// assert_eq!(kept, vec!["## Overview", "Summary text here"]);
/// ```
pub fn filter_lines(mut lines: Vec<String>) -> Vec<String> {
    let before = lines.len();
    lines.retain(|line| unwanted(line).is_none());
    tracing::debug!(
        target: "extract",
        kept = lines.len(),
        dropped = before - lines.len(),
        "extract.lines.filtered"
    );
    lines
}
