//! Document-order traversal of `<body>`.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::noise::{self, is_non_content_tag};
use crate::normalize::normalize;
use crate::rules::classify;
use crate::{ExtractError, ExtractOptions};

static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("BODY selector"));

/// Detach every non-content element (script, nav, footer, ...) from the tree.
/// Returns how many subtrees were removed.
pub fn prune(document: &mut Html) -> usize {
    let doomed: Vec<_> = document
        .tree
        .nodes()
        .filter(|node| {
            node.value()
                .as_element()
                .is_some_and(|el| is_non_content_tag(el.name()))
        })
        .map(|node| node.id())
        .collect();

    for id in &doomed {
        if let Some(mut node) = document.tree.get_mut(*id) {
            node.detach();
        }
    }
    doomed.len()
}

/// Prune, then render every surviving element under `<body>` in pre-order.
///
/// Rejection is per element: a rejected container's children are still
/// visited. Only the fixed non-content tags lose their whole subtree.
///
/// Returns [`ExtractError::MissingBody`] rather than an empty list when the
/// markup has no `<body>`, so callers can tell "nothing extracted" apart from
/// "document malformed".
pub fn walk(document: &mut Html, options: &ExtractOptions) -> Result<Vec<String>, ExtractError> {
    let pruned = prune(document);

    let body = document.select(&BODY).next().ok_or_else(|| {
        tracing::debug!(target: "extract", pruned, "extract.walk.missing_body");
        ExtractError::MissingBody
    })?;

    let mut visited = 0usize;
    let mut rejected = 0usize;
    let mut lines = Vec::new();

    for element in body
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.id() != body.id())
    {
        visited += 1;
        if noise::should_reject(element, options) {
            rejected += 1;
            continue;
        }
        if let Some(raw) = classify(element) {
            let line = normalize(&raw);
            if !line.is_empty() {
                lines.push(line);
            }
        }
    }

    tracing::debug!(
        target: "extract",
        pruned,
        visited,
        rejected,
        emitted = lines.len(),
        "extract.walk.done"
    );
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk_html(html: &str) -> Result<Vec<String>, ExtractError> {
        let mut doc = Html::parse_document(html);
        walk(&mut doc, &ExtractOptions::default())
    }

    #[test]
    fn emits_lines_in_document_order() {
        let lines = walk_html(
            "<body><h1>The first heading here</h1>\
             <div><p>A paragraph in a div</p>\
             <ul><li>list item number one</li></ul></div>\
             <blockquote>a quote with words</blockquote></body>",
        )
        .unwrap();
        assert_eq!(
            lines,
            vec![
                "# The first heading here",
                "A paragraph in a div",
                "- list item number one",
                "> a quote with words",
            ]
        );
    }

    #[test]
    fn prunes_non_content_subtrees() {
        let lines = walk_html(
            "<body><nav><p>Home page link list</p></nav>\
             <script>var a = 'some script text';</script>\
             <footer><p>Footer text with words</p></footer>\
             <p>Article text survives here</p></body>",
        )
        .unwrap();
        assert_eq!(lines, vec!["Article text survives here"]);
    }

    #[test]
    fn rejected_containers_still_have_children_visited() {
        let lines = walk_html(
            r#"<body><div id="sidebar"><p>Inside the sidebar div</p></div></body>"#,
        )
        .unwrap();
        assert_eq!(lines, vec!["Inside the sidebar div"]);
    }

    #[test]
    fn table_renders_marker_then_rows() {
        let lines = walk_html(
            "<body><table><tr><td>A</td><td>B</td></tr>\
             <tr><td>C</td><td>D</td></tr></table></body>",
        )
        .unwrap();
        assert_eq!(lines, vec!["--- Table ---", "| A | B |", "| C | D |"]);
    }

    #[test]
    fn lines_are_normalized() {
        let lines = walk_html(
            "<body><p>Visit https://example.com for\n more [3] info \u{2014} today</p></body>",
        )
        .unwrap();
        assert_eq!(lines, vec!["Visit for more info today"]);
    }

    #[test]
    fn empty_body_is_a_successful_empty_walk() {
        assert_eq!(walk_html("<html><body></body></html>").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn frameset_documents_have_no_body() {
        let err = walk_html(
            "<html><head><title>x</title></head>\
             <frameset><frame src='a.html'></frameset></html>",
        )
        .unwrap_err();
        assert_eq!(err, ExtractError::MissingBody);
    }

    #[test]
    fn fragments_have_no_body() {
        let mut doc = Html::parse_fragment("<p>A fragment with words</p>");
        assert_eq!(
            walk(&mut doc, &ExtractOptions::default()),
            Err(ExtractError::MissingBody)
        );
    }
}
