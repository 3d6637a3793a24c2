//! Tag dispatch and per-element line rendering.
//!
//! Every supported tag maps to one [`RenderRule`]; tags without a rule
//! produce no line. Lines come out raw here and are normalized by the walker.

use scraper::ElementRef;

use crate::dom::{attr, element_text};
use crate::lines::PLACEHOLDER_MARKER;

pub const TABLE_MARKER: &str = "--- Table ---";

/// Inline emphasis flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    /// Italic text followed by the `title` attribute in parentheses.
    Abbreviation,
    InlineCode,
}

/// Closed set of rendering strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderRule {
    Heading(u8),
    Paragraph,
    ListItem,
    Quote,
    CodeBlock,
    Link,
    Image,
    TableMarker,
    TableRow,
    Styled(Style),
    /// Embedded media; stands in for fallback text and is dropped by the line filter.
    Placeholder,
}

/// Rendering rule for a lower-case tag name.
///
/// ```
/// use thalli_extract::{rule_for, RenderRule, Style};
///
/// assert_eq!(rule_for("h3"), Some(RenderRule::Heading(3)));
/// assert_eq!(rule_for("mark"), Some(RenderRule::Styled(Style::Bold)));
/// assert_eq!(rule_for("div"), None);
/// ```
pub fn rule_for(tag: &str) -> Option<RenderRule> {
    use RenderRule::*;

    let rule = match tag {
        "h1" => Heading(1),
        "h2" => Heading(2),
        "h3" => Heading(3),
        "h4" => Heading(4),
        "h5" => Heading(5),
        "h6" => Heading(6),
        "p" => Paragraph,
        "li" => ListItem,
        "blockquote" => Quote,
        "pre" | "code" => CodeBlock,
        "a" => Link,
        "img" => Image,
        "table" => TableMarker,
        "tr" => TableRow,
        "video" | "audio" | "canvas" | "svg" => Placeholder,
        "b" | "strong" => Styled(Style::Bold),
        "i" | "em" => Styled(Style::Italic),
        "u" | "ins" => Styled(Style::Underline),
        "s" | "strike" | "del" => Styled(Style::Strikethrough),
        "abbr" => Styled(Style::Abbreviation),
        "mark" | "dfn" | "dt" | "caption" | "figcaption" => Styled(Style::Bold),
        "kbd" | "samp" | "tt" | "var" | "q" => Styled(Style::InlineCode),
        _ => return None,
    };
    Some(rule)
}

impl RenderRule {
    /// Render `element` under this rule; `None` when there is nothing to show.
    pub fn render(self, element: ElementRef<'_>) -> Option<String> {
        match self {
            RenderRule::Image => {
                let alt = attr(element, "alt").unwrap_or("Image");
                Some(format!("[Image: {alt}]"))
            }
            RenderRule::TableMarker => Some(TABLE_MARKER.to_string()),
            RenderRule::Placeholder => Some(format!(
                "{PLACEHOLDER_MARKER}: {}]",
                element.value().name()
            )),
            RenderRule::TableRow => table_row(element),
            RenderRule::Link => link_text(element),
            RenderRule::Styled(Style::Abbreviation) => {
                let text = non_empty(element_text(element))?;
                Some(match attr(element, "title") {
                    Some(title) => format!("*{text}* ({title})"),
                    None => format!("*{text}*"),
                })
            }
            rule => {
                let text = non_empty(element_text(element))?;
                Some(rule.wrap(&text))
            }
        }
    }

    fn wrap(self, text: &str) -> String {
        match self {
            RenderRule::Heading(level) => format!("{} {text}", "#".repeat(level as usize)),
            RenderRule::ListItem => format!("- {text}"),
            RenderRule::Quote => format!("> {text}"),
            RenderRule::CodeBlock => format!("```\n{text}\n```"),
            RenderRule::Styled(Style::Bold) => format!("**{text}**"),
            RenderRule::Styled(Style::Italic) | RenderRule::Styled(Style::Abbreviation) => {
                format!("*{text}*")
            }
            RenderRule::Styled(Style::Underline) => format!("<u>{text}</u>"),
            RenderRule::Styled(Style::Strikethrough) => format!("~~{text}~~"),
            RenderRule::Styled(Style::InlineCode) => format!("`{text}`"),
            _ => text.to_string(),
        }
    }
}

/// Classify and render one element.
pub fn classify(element: ElementRef<'_>) -> Option<String> {
    rule_for(element.value().name())?.render(element)
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

/// Visible text, then `title`, then `name`, with non-breaking spaces flattened.
fn link_text(element: ElementRef<'_>) -> Option<String> {
    let visible = element_text(element).replace('\u{a0}', " ");
    let visible = visible.trim();
    let chosen = if visible.is_empty() {
        attr(element, "title").or_else(|| attr(element, "name"))?
    } else {
        visible
    };
    non_empty(chosen.replace('\u{a0}', " ").trim().to_string())
}

/// `| a | b |` over the row's own cells; nested tables keep their own rows.
fn table_row(element: ElementRef<'_>) -> Option<String> {
    let cells: Vec<String> = element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
        .map(element_text)
        .collect();
    if cells.is_empty() {
        return None;
    }
    Some(format!("| {} |", cells.join(" | ")))
}
