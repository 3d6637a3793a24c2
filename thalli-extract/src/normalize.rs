//! Single-line ASCII coercion applied to every rendered line.

use std::sync::LazyLock;

use regex::Regex;

/// Bracketed numeric citation markers such as `[12]`.
static CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d+\]").expect("CITATION regex"));

/// Bare http(s) URLs up to the next whitespace.
static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("BARE_URL regex"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE_RUN regex"));

/// Normalize raw text into a single trimmed line of printable ASCII.
///
/// Citation markers and bare URLs are removed, whitespace runs collapse to
/// one space, and anything outside `0x20..=0x7E` is dropped without
/// transliteration. Never fails; unusable input becomes an empty string.
///
/// The output is a fixed point: `normalize(&normalize(s)) == normalize(s)`.
///
/// ```
/// use thalli_extract::normalize;
///
/// assert_eq!(normalize("Water boils at 100C[1]."), "Water boils at 100C.");
/// assert_eq!(normalize("  see https://example.com/a?b=c\tnow "), "see now");
/// assert_eq!(normalize("caf\u{e9}\u{a0}au lait"), "caf au lait");
/// ```
pub fn normalize(raw: &str) -> String {
    let mut text = coerce_ascii(raw);

    // Removing one marker can expose another (`[[1]2]`), so strip to a fixed point.
    loop {
        let stripped = CITATION.replace_all(&text, "");
        let stripped = BARE_URL.replace_all(&stripped, "").into_owned();
        if stripped == text {
            break;
        }
        text = stripped;
    }

    WHITESPACE_RUN.replace_all(&text, " ").trim().to_string()
}

/// Map every whitespace character to a space and drop the rest of the
/// non-printable or non-ASCII range.
fn coerce_ascii(raw: &str) -> String {
    raw.chars()
        .filter_map(|ch| {
            if ch.is_whitespace() {
                Some(' ')
            } else if matches!(ch, ' '..='~') {
                Some(ch)
            } else {
                None
            }
        })
        .collect()
}
