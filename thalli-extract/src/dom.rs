use scraper::ElementRef;

/// Concatenated descendant text, trimmed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Text the noise filter judges an element by: its own text, or the first
/// non-empty of `alt`, `title`, `name` for elements that carry none (images,
/// icon links, named anchors). Matches the fallbacks the classifier renders.
pub(crate) fn extracted_text(element: ElementRef<'_>) -> String {
    let text = element_text(element);
    if !text.is_empty() {
        return text;
    }
    ["alt", "title", "name"]
        .into_iter()
        .find_map(|name| attr(element, name))
        .map(str::to_string)
        .unwrap_or_default()
}

/// Non-empty trimmed attribute value.
pub(crate) fn attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
