use scraper::{ElementRef, Html, Selector};
use thalli_extract::{
    classify, extract_html, filter_lines, normalize, walk, ExtractError, ExtractOptions,
    TRUNCATION_MARKER,
};

const ARTICLE: &str = r#"<!doctype html>
<html>
<head>
  <title>How kettles work</title>
  <style>body { color: red }</style>
  <script>window.tracking = "load analytics now";</script>
</head>
<body>
  <header><h1>Kettle Weekly site banner</h1></header>
  <nav><ul><li>Home</li><li>About</li><li>Contact</li></ul></nav>
  <div id="cookie-banner"><p>We use cookies to improve your experience</p></div>
  <main>
    <h1>How electric kettles boil water</h1>
    <p>Jane Smith</p>
    <p>An electric kettle heats water with a coiled element[1] under the base.</p>
    <h2>The heating element</h2>
    <p>Current through the element produces heat, see https://example.com/physics for more.</p>
    <ul>
      <li>Fill the kettle to the minimum line</li>
      <li>Close the lid</li>
    </ul>
    <blockquote>Never run a kettle dry, it damages the element.</blockquote>
    <table>
      <tr><th>Size</th><th>Time</th></tr>
      <tr><td>1 litre</td><td>3 minutes</td></tr>
    </table>
    <img src="kettle.png" alt="Cutaway of a kettle">
    <pre>boil(water, 100, fast);</pre>
    <p>Subscribe to our newsletter for more kettle facts</p>
  </main>
  <footer><p>Copyright Kettle Weekly all rights reserved</p></footer>
</body>
</html>"#;

#[test]
fn article_renders_expected_lines() {
    let doc = extract_html(ARTICLE, &ExtractOptions::default()).unwrap();
    let got: Vec<&str> = doc.text.split("\n\n").collect();
    assert_eq!(
        got,
        vec![
            "# How electric kettles boil water",
            "An electric kettle heats water with a coiled element under the base.",
            "## The heating element",
            "Current through the element produces heat, see for more.",
            "- Fill the kettle to the minimum line",
            "> Never run a kettle dry, it damages the element.",
            "--- Table ---",
            "| Size | Time |",
            "| 1 litre | 3 minutes |",
            "[Image: Cutaway of a kettle]",
            "``` boil(water, 100, fast); ```",
        ]
    );
    assert!(!doc.truncated);
    assert_eq!(doc.lines, got.len());
}

#[test]
fn survivors_follow_pre_order_of_elements() {
    let opts = ExtractOptions::default();
    let mut parsed = Html::parse_document(ARTICLE);
    let walked = walk(&mut parsed, &opts).unwrap();

    // Every rendered element, in pre-order, with no filtering at all.
    let parsed = Html::parse_document(ARTICLE);
    let body = parsed
        .select(&Selector::parse("body").unwrap())
        .next()
        .unwrap();
    let all_rendered: Vec<String> = body
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter_map(classify)
        .map(|raw| normalize(&raw))
        .collect();

    let filtered = filter_lines(walked.clone());
    for sequence in [&walked, &filtered] {
        let mut cursor = all_rendered.iter();
        for line in sequence.iter() {
            assert!(
                cursor.any(|candidate| candidate == line),
                "{line:?} is out of document order"
            );
        }
    }
}

#[test]
fn normalizer_is_idempotent_on_rendered_output() {
    let doc = extract_html(ARTICLE, &ExtractOptions::default()).unwrap();
    for line in doc.text.split("\n\n") {
        assert_eq!(normalize(line), line);
    }
}

#[test]
fn budget_bounds_total_length() {
    let opts = ExtractOptions {
        max_chars: 120,
        ..ExtractOptions::default()
    };
    let doc = extract_html(ARTICLE, &opts).unwrap();
    assert!(doc.truncated);
    assert!(doc.text.ends_with(TRUNCATION_MARKER));
    assert!(doc.text.len() <= opts.max_chars + TRUNCATION_MARKER.len());
}

#[test]
fn boilerplate_only_page_is_empty_not_an_error() {
    let html = "<html><body><nav>Home About Contact</nav>\
                <p>Accept all cookies to continue</p>\
                <p>Short text</p></body></html>";
    let doc = extract_html(html, &ExtractOptions::default()).unwrap();
    assert!(doc.is_empty());
    assert_eq!(doc.text, "");
}

#[test]
fn bodyless_markup_is_a_structural_failure() {
    let html = "<html><frameset cols='50%,50%'><frame src='l.html'><frame src='r.html'></frameset></html>";
    assert_eq!(
        extract_html(html, &ExtractOptions::default()),
        Err(ExtractError::MissingBody)
    );
}

#[test]
fn markup_without_a_body_tag_is_a_structural_failure() {
    let cases = [
        "",
        "   ",
        "<p>No body tag anywhere in this markup</p>",
        "<html><head><title>t</title></head></html>",
    ];
    for html in cases {
        assert_eq!(
            extract_html(html, &ExtractOptions::default()),
            Err(ExtractError::MissingBody),
            "{html:?}"
        );
    }
}

#[test]
fn walk_uses_the_implied_body_of_a_parsed_tree() {
    let mut doc = Html::parse_document("<p>Paragraph without any body tag</p>");
    let lines = walk(&mut doc, &ExtractOptions::default()).unwrap();
    assert_eq!(lines, vec!["Paragraph without any body tag"]);
}

#[test]
fn custom_junk_terms_replace_the_defaults() {
    let opts = ExtractOptions {
        junk_terms: vec!["sponsored".into()],
        ..ExtractOptions::default()
    };
    let html = "<html><body><p>Sponsored content from a partner</p>\
                <p>Accept the terms and carry on</p></body></html>";
    let doc = extract_html(html, &opts).unwrap();
    assert_eq!(doc.text, "Accept the terms and carry on");
}

#[test]
fn embedded_media_fallback_text_never_reaches_the_document() {
    let html = "<html><body>\
        <p>The kettle clicks off at the boil.</p>\
        <video src='boil.mp4'>Your browser cannot play this clip</video>\
        </body></html>";
    let doc = extract_html(html, &ExtractOptions::default()).unwrap();
    assert_eq!(doc.text, "The kettle clicks off at the boil.");
}

#[test]
fn attribute_fallbacks_reach_the_document() {
    let html = "<html><body>\
        <a name='methods and materials used'></a>\
        <a href='/x' title='Download the full report'></a>\
        <img src='x.png' title='Boiling curve'>\
        <img src='pixel.gif'>\
        </body></html>";
    let doc = extract_html(html, &ExtractOptions::default()).unwrap();
    assert_eq!(
        doc.text,
        "methods and materials used\n\nDownload the full report\n\n[Image: Image]"
    );
}

