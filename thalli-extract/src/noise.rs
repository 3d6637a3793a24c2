//! Pre-pass noise filter: per-element rejection ahead of classification.
//!
//! Token-count and substring checks are cheap proxies for "UI chrome, not
//! article content". They trade recall for precision and will sometimes drop
//! short legitimate content.

use scraper::ElementRef;

use crate::dom::extracted_text;
use crate::ExtractOptions;

/// Containers that never hold article content. The walker also detaches
/// these from the tree before traversal.
pub const NON_CONTENT_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "object", "embed", "applet", "header", "footer",
    "nav",
];

/// Why an element was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NonContentTag,
    BoilerplateContainer,
    Empty,
    TooFewTokens,
    JunkTerm,
}

pub fn is_non_content_tag(tag: &str) -> bool {
    NON_CONTENT_TAGS.contains(&tag)
}

/// `id` or any class token equals a known boilerplate identifier.
pub fn has_boilerplate_identifier(element: ElementRef<'_>, identifiers: &[String]) -> bool {
    let value = element.value();
    let matches = |candidate: &str| identifiers.iter().any(|id| id.eq_ignore_ascii_case(candidate));
    value.id().is_some_and(matches) || value.classes().any(matches)
}

pub fn too_few_tokens(text: &str, min_tokens: usize) -> bool {
    text.split_whitespace().take(min_tokens).count() < min_tokens
}

pub fn contains_junk_term(text: &str, junk_terms: &[String]) -> bool {
    let lower = text.to_lowercase();
    junk_terms
        .iter()
        .any(|term| lower.contains(term.to_lowercase().as_str()))
}

/// Rows, tables, and images carry short text by nature.
fn exempt_from_token_floor(tag: &str) -> bool {
    matches!(tag, "table" | "tr" | "img")
}

/// First rule the element trips, if any.
pub fn rejection(element: ElementRef<'_>, options: &ExtractOptions) -> Option<Rejection> {
    let tag = element.value().name();
    if is_non_content_tag(tag) {
        return Some(Rejection::NonContentTag);
    }
    if has_boilerplate_identifier(element, &options.boilerplate_ids) {
        return Some(Rejection::BoilerplateContainer);
    }

    let text = extracted_text(element);
    if text.is_empty() {
        return Some(Rejection::Empty);
    }
    if !exempt_from_token_floor(tag) && too_few_tokens(&text, options.min_tokens) {
        return Some(Rejection::TooFewTokens);
    }
    if contains_junk_term(&text, &options.junk_terms) {
        return Some(Rejection::JunkTerm);
    }
    None
}

pub fn should_reject(element: ElementRef<'_>, options: &ExtractOptions) -> bool {
    rejection(element, options).is_some()
}
