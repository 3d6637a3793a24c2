//! Query to ranked result URLs.

use std::sync::LazyLock;

use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use scraper::{Html, Selector};
use thalli_common::{Result, ThalliError};
use thalli_http::{HttpClient, RequestOpts};
use url::Url;

/// Result pages fetched per query unless configured otherwise.
pub const DEFAULT_RESULT_COUNT: usize = 3;

const DDG_HTML_BASE: &str = "https://html.duckduckgo.com/";

static RESULT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".result").expect("RESULT selector"));

static RESULT_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.result__a").expect("RESULT_LINK selector"));

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Up to `count` distinct http(s) URLs in rank order.
    async fn search(&self, query: &str, count: usize) -> Result<Vec<Url>>;
}

/// DuckDuckGo's no-JavaScript HTML endpoint.
pub struct DuckDuckGo {
    client: HttpClient,
}

impl DuckDuckGo {
    pub fn new(user_agent: Option<&str>) -> Result<Self> {
        Self::with_base_url(DDG_HTML_BASE, user_agent)
    }

    pub fn with_base_url(base: &str, user_agent: Option<&str>) -> Result<Self> {
        let mut client = HttpClient::new(base)
            .map_err(|e| ThalliError::Fetch(format!("search client init failed: {e}")))?;
        if let Some(agent) = user_agent {
            client = client.with_user_agent(agent);
        }
        Ok(Self { client })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGo {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<Url>> {
        tracing::debug!(target: "web", query, count, "web.search.start");
        let body = self
            .client
            .post_form_text("html/", &[("q", query)], RequestOpts::default())
            .await
            .map_err(|e| ThalliError::Fetch(format!("DuckDuckGo search failed: {e}")))?;

        // Html is !Send; parse_results keeps it off the await path.
        let urls = parse_results(&body, count);
        tracing::debug!(target: "web", query, found = urls.len(), "web.search.done");
        Ok(urls)
    }
}

/// Pull result links out of a DuckDuckGo HTML results page.
pub fn parse_results(html: &str, count: usize) -> Vec<Url> {
    let doc = Html::parse_document(html);
    let mut urls: Vec<Url> = Vec::new();
    for result in doc.select(&RESULT) {
        if urls.len() >= count {
            break;
        }
        let Some(href) = result
            .select(&RESULT_LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };
        let Ok(url) = Url::parse(&unwrap_redirect(href)) else {
            continue;
        };
        if matches!(url.scheme(), "http" | "https") && !urls.contains(&url) {
            urls.push(url);
        }
    }
    urls
}

/// Result links go through `/l/?uddg=<encoded target>`; return the target.
fn unwrap_redirect(href: &str) -> String {
    if let Some(pos) = href.find("uddg=") {
        let start = pos + "uddg=".len();
        let end = href[start..]
            .find('&')
            .map_or(href.len(), |i| start + i);
        let encoded = &href[start..end];
        if !encoded.is_empty() {
            return percent_decode_str(encoded).decode_utf8_lossy().into_owned();
        }
    }
    href.to_string()
}
