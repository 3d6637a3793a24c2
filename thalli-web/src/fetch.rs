//! Page acquisition: one GET per URL with a desktop browser User-Agent.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thalli_common::{Result, ThalliError};
use thalli_http::{HttpClient, RequestOpts};
use url::Url;

/// Default per-request timeout for page fetches.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub html: String,
    pub retrieved_at: DateTime<Utc>,
    /// blake3 of the raw markup, hex encoded.
    pub html_checksum: String,
}

impl FetchedPage {
    pub fn new(url: Url, html: String) -> Self {
        let html_checksum = blake3::hash(html.as_bytes()).to_hex().to_string();
        Self {
            url,
            html,
            retrieved_at: Utc::now(),
            html_checksum,
        }
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage>;
}

/// Fetcher backed by [`thalli_http::HttpClient`].
pub struct HttpPageFetcher {
    client: HttpClient,
}

impl HttpPageFetcher {
    pub fn new(user_agent: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut client = HttpClient::unanchored()
            .map_err(|e| ThalliError::Fetch(format!("http client init failed: {e}")))?
            .with_timeout(timeout)
            .with_retries(1);
        if let Some(agent) = user_agent {
            client = client.with_user_agent(agent);
        }
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        tracing::debug!(target: "web", url = %url, "web.fetch.start");
        let html = self
            .client
            .get_text(url.as_str(), RequestOpts::default())
            .await
            .map_err(|e| ThalliError::Fetch(format!("{url}: {e}")))?;
        let page = FetchedPage::new(url.clone(), html);
        tracing::debug!(
            target: "web",
            url = %page.url,
            bytes = page.html.len(),
            checksum = %page.html_checksum,
            "web.fetch.done"
        );
        Ok(page)
    }
}
