//! Lightweight per-page summaries used when several search results are
//! compared side by side.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::dom::element_text;
use crate::normalize::normalize;

static PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("PARAGRAPH selector"));

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("TITLE selector"));

static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").expect("H1 selector"));

/// Text of the first `max_paragraphs` paragraphs, joined by spaces and
/// normalized.
///
/// ```
/// use thalli_extract::paragraph_digest;
///
/// let html = "<p>One.</p><div><p>Two[1].</p></div><p>Three.</p>";
/// assert_eq!(paragraph_digest(html, 2), "One. Two.");
/// ```
pub fn paragraph_digest(html: &str, max_paragraphs: usize) -> String {
    let document = Html::parse_document(html);
    let joined = document
        .select(&PARAGRAPH)
        .take(max_paragraphs)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ");
    normalize(&joined)
}

/// `<title>`, falling back to the first `<h1>`.
pub fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    [&*TITLE, &*H1].into_iter().find_map(|selector| {
        document
            .select(selector)
            .map(element_text)
            .map(|t| normalize(&t))
            .find(|t| !t.is_empty())
    })
}
