//! Input routing: page summary, search synthesis, or video summary.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use thalli_common::{Result, ThalliError};
use thalli_extract::{extract_html, paragraph_digest, ExtractOptions, RenderedDocument};
use thalli_llm::traits::LlmClient;
use url::Url;

use crate::fetch::PageFetcher;
use crate::search::{SearchProvider, DEFAULT_RESULT_COUNT};
use crate::video::{video_id, TranscriptSource};

/// Per-orchestrator settings, passed in explicitly.
#[derive(Debug, Clone)]
pub struct IntelConfig {
    pub extract: ExtractOptions,
    /// Result pages compared per query.
    pub results: usize,
    /// Paragraphs digested from each result page.
    pub page_paragraphs: usize,
    /// Upper bound on one page fetch, retries included.
    pub fetch_timeout: Duration,
}

impl Default for IntelConfig {
    fn default() -> Self {
        Self {
            extract: ExtractOptions::default(),
            results: DEFAULT_RESULT_COUNT,
            page_paragraphs: 5,
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

/// What the user typed, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Video link, by id.
    Video(String),
    Url(Url),
    Query(String),
}

impl Input {
    /// `None` for blank input.
    ///
    /// ```
    /// use thalli_web::intel::Input;
    ///
    /// assert!(matches!(Input::classify("https://youtu.be/abcdefghijk"), Some(Input::Video(_))));
    /// assert!(matches!(Input::classify("https://example.com/a"), Some(Input::Url(_))));
    /// assert!(matches!(Input::classify("what is a kettle"), Some(Input::Query(_))));
    /// assert_eq!(Input::classify("   "), None);
    /// ```
    pub fn classify(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Some(id) = video_id(trimmed) {
            return Some(Input::Video(id));
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            if let Ok(url) = Url::parse(trimmed) {
                return Some(Input::Url(url));
            }
        }
        Some(Input::Query(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerKind {
    Page,
    Search,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub kind: AnswerKind,
    pub text: String,
    pub sources: Vec<Url>,
}

pub struct WebIntel {
    config: IntelConfig,
    fetcher: Arc<dyn PageFetcher>,
    search: Arc<dyn SearchProvider>,
    transcripts: Arc<dyn TranscriptSource>,
    llm: Arc<dyn LlmClient>,
}

impl WebIntel {
    pub fn new(
        config: IntelConfig,
        fetcher: Arc<dyn PageFetcher>,
        search: Arc<dyn SearchProvider>,
        transcripts: Arc<dyn TranscriptSource>,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        Self {
            config,
            fetcher,
            search,
            transcripts,
            llm,
        }
    }

    pub fn config(&self) -> &IntelConfig {
        &self.config
    }

    /// Classify `raw` and route it.
    pub async fn answer(&self, raw: &str) -> Result<Answer> {
        match Input::classify(raw) {
            Some(Input::Video(id)) => self.summarize_video(&id).await,
            Some(Input::Url(url)) => self.summarize_page(&url).await,
            Some(Input::Query(query)) => self.answer_query(&query).await,
            None => Err(ThalliError::Config("input is empty".into())),
        }
    }

    /// Fetch, extract, and grammar-correct one page.
    pub async fn summarize_page(&self, url: &Url) -> Result<Answer> {
        let page = self.fetch(url).await?;
        let rendered = render_page(&page.html, &self.config.extract)?;
        tracing::info!(
            target: "web",
            url = %url,
            lines = rendered.lines,
            truncated = rendered.truncated,
            "web.page.extracted"
        );

        let text = if rendered.is_empty() {
            format!("No readable content found at {url}.")
        } else {
            self.llm.correct_document(&rendered.text).await?
        };
        Ok(Answer {
            kind: AnswerKind::Page,
            text,
            sources: vec![page.url],
        })
    }

    /// Search, digest every result concurrently, and synthesize one answer.
    pub async fn answer_query(&self, query: &str) -> Result<Answer> {
        let urls = self.search.search(query, self.config.results).await?;
        if urls.is_empty() {
            tracing::info!(target: "web", query, "web.query.no_results");
            return Ok(Answer {
                kind: AnswerKind::Search,
                text: format!("No websites found for \"{query}\"."),
                sources: Vec::new(),
            });
        }

        let digests = join_all(urls.iter().map(|url| self.digest(url))).await;
        tracing::info!(
            target: "web",
            query,
            sites = digests.len(),
            "web.query.digested"
        );

        let text = self.llm.synthesize_answer(query, &digests).await?;
        Ok(Answer {
            kind: AnswerKind::Search,
            text,
            sources: urls,
        })
    }

    pub async fn summarize_video(&self, id: &str) -> Result<Answer> {
        let transcript = self.transcripts.transcript(id).await?;
        tracing::info!(
            target: "web",
            video_id = id,
            language = %transcript.language,
            chars = transcript.text.len(),
            "web.video.transcribed"
        );
        let text = self.llm.summarize_transcript(&transcript.text).await?;
        let source = Url::parse(&format!("https://www.youtube.com/watch?v={id}"))
            .map_err(|e| ThalliError::Transcript(format!("{id}: {e}")))?;
        Ok(Answer {
            kind: AnswerKind::Video,
            text,
            sources: vec![source],
        })
    }

    async fn fetch(&self, url: &Url) -> Result<crate::fetch::FetchedPage> {
        tokio::time::timeout(self.config.fetch_timeout, self.fetcher.fetch(url))
            .await
            .map_err(|_| ThalliError::Timeout)?
    }

    /// One result page as text for the synthesis prompt; failures become notes.
    async fn digest(&self, url: &Url) -> String {
        match self.fetch(url).await {
            Ok(page) => {
                let digest = paragraph_digest(&page.html, self.config.page_paragraphs);
                if digest.is_empty() {
                    format!("No paragraph text found at {url}.")
                } else {
                    digest
                }
            }
            Err(e) => {
                tracing::warn!(target: "web", url = %url, error = %e, "web.query.fetch_failed");
                format!("Could not fetch content from {url}: {e}")
            }
        }
    }
}

/// Parse and extract in one synchronous step; `Html` never crosses an await.
fn render_page(html: &str, options: &ExtractOptions) -> Result<RenderedDocument> {
    extract_html(html, options).map_err(|e| ThalliError::Extract(e.to_string()))
}
