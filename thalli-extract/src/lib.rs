//! Content extraction core: HTML in, cleaned line-oriented text out.
//!
//! The pipeline runs in five steps, each in its own module:
//!
//! - [`walker`]: prune non-content tags, visit `<body>` in document order
//! - [`noise`]: per-element rejection before classification
//! - [`rules`]: tag to [`RenderRule`] dispatch and line rendering
//! - [`normalize()`]: single-line ASCII coercion of every rendered line
//! - [`lines`]: boilerplate predicates over the finished line sequence
//!
//! [`render`] joins the survivors and enforces the character budget.
//! Nothing here performs I/O or holds state between calls.
//!
//! ```
//! use thalli_extract::{extract_html, ExtractOptions};
//!
//! let html = "<html><body><h2>Boiling points of water</h2>\
//!             <p>Water boils at 100C[1] at sea level.</p></body></html>";
//! let doc = extract_html(html, &ExtractOptions::default()).unwrap();
//! assert_eq!(doc.text, "## Boiling points of water\n\nWater boils at 100C at sea level.");
//! ```

use serde::{Deserialize, Serialize};

mod dom;
pub mod digest;
pub mod lines;
pub mod noise;
pub mod normalize;
pub mod render;
pub mod rules;
pub mod walker;

pub use digest::{page_title, paragraph_digest};
pub use lines::filter_lines;
pub use normalize::normalize;
pub use render::{extract, extract_html, RenderedDocument, DEFAULT_MAX_CHARS, TRUNCATION_MARKER};
pub use rules::{classify, rule_for, RenderRule, Style};
pub use walker::walk;

/// Structural failures. Heuristic misses are never errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExtractError {
    /// The parsed markup has no `<body>` element to walk.
    #[error("no <body> element found in markup")]
    MissingBody,
}

/// Tunables for the noise filter and the output budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Character budget for the joined document before truncation.
    pub max_chars: usize,
    /// Elements with fewer whitespace-separated tokens are treated as chrome.
    pub min_tokens: usize,
    /// Lower-case substrings that mark an element as boilerplate.
    pub junk_terms: Vec<String>,
    /// `id`/`class` values of known sidebar and menu containers.
    pub boilerplate_ids: Vec<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            min_tokens: 3,
            junk_terms: ["cookie", "privacy", "login", "subscribe", "terms", "accept"]
                .map(String::from)
                .to_vec(),
            boilerplate_ids: [
                "sidebar",
                "menu",
                "navbar",
                "nav-wrapper",
                "breadcrumbs",
                "site-header",
                "site-footer",
                "cookie-banner",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}
