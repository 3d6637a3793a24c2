//! Video links: id detection, caption track discovery, and transcript text.
//!
//! The watch page embeds its player configuration as JSON; the
//! `captionTracks` array inside it lists one timed-text URL per language.
//! Fetching one of those URLs yields XML with a `<text>` node per caption cue.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use thalli_common::{Result, ThalliError};
use thalli_extract::normalize;
use thalli_http::{HttpClient, RequestOpts};

const YOUTUBE_BASE: &str = "https://www.youtube.com/";

static VIDEO_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:www\.|m\.)?(?:youtube\.com/(?:watch\?(?:[^#]*&)?v=|shorts/|embed/)|youtu\.be/)([A-Za-z0-9_-]{11})(?:[?&#/].*)?$",
    )
    .expect("VIDEO_LINK regex")
});

static CAPTION_TRACKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""captionTracks"\s*:\s*"#).expect("CAPTION_TRACKS regex"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#x[0-9a-fA-F]+|amp|lt|gt|quot|apos);").expect("ENTITY regex")
});

static CUE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("text").expect("CUE selector"));

/// The 11-character video id if `input` is a recognised video link.
///
/// ```
/// use thalli_web::video::video_id;
///
/// assert_eq!(video_id("https://youtu.be/dQw4w9WgXcQ?t=42").as_deref(), Some("dQw4w9WgXcQ"));
/// assert_eq!(video_id("rust borrow checker"), None);
/// ```
pub fn video_id(input: &str) -> Option<String> {
    VIDEO_LINK
        .captures(input.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    /// `Some("asr")` for auto-generated captions.
    #[serde(default)]
    pub kind: Option<String>,
}

impl CaptionTrack {
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// Caption tracks advertised by a watch page; empty when none are embedded.
pub fn caption_tracks(watch_html: &str) -> Vec<CaptionTrack> {
    let Some(found) = CAPTION_TRACKS.find(watch_html) else {
        return Vec::new();
    };
    let rest = &watch_html[found.end()..];
    match serde_json::Deserializer::from_str(rest)
        .into_iter::<Vec<CaptionTrack>>()
        .next()
    {
        Some(Ok(tracks)) => tracks,
        Some(Err(e)) => {
            tracing::warn!(target: "web", error = %e, "web.video.caption_tracks_malformed");
            Vec::new()
        }
        None => Vec::new(),
    }
}

/// Preferred language first, then any manual track, then whatever is first.
pub fn pick_track<'a>(tracks: &'a [CaptionTrack], language: &str) -> Option<&'a CaptionTrack> {
    let in_language = |t: &&CaptionTrack| t.language_code.eq_ignore_ascii_case(language);
    tracks
        .iter()
        .filter(in_language)
        .find(|t| !t.is_generated())
        .or_else(|| tracks.iter().find(in_language))
        .or_else(|| tracks.iter().find(|t| !t.is_generated()))
        .or_else(|| tracks.first())
}

/// Plain text of a timed-text XML document, one space between cues.
///
/// ```
/// use thalli_web::video::transcript_text;
///
/// let xml = r#"<transcript><text start="0" dur="2">It&amp;#39;s  here</text>
///              <text start="2" dur="1">next cue</text></transcript>"#;
/// assert_eq!(transcript_text(xml), "It's here next cue");
/// ```
pub fn transcript_text(timedtext_xml: &str) -> String {
    let doc = Html::parse_fragment(timedtext_xml);
    let joined = doc
        .select(&CUE)
        .map(|cue| decode_entities(&cue.text().collect::<String>()))
        .collect::<Vec<_>>()
        .join(" ");
    normalize(&joined)
}

/// Cue text is entity-encoded twice; the parser undoes the outer layer.
fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            let decoded = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => name
                    .strip_prefix("#x")
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .unwrap_or_else(|| name[1..].parse())
                    .ok()
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub video_id: String,
    pub language: String,
    pub text: String,
}

#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn transcript(&self, video_id: &str) -> Result<Transcript>;
}

/// Reads caption tracks straight from the public watch page.
pub struct YouTubeTranscripts {
    client: HttpClient,
    language: String,
}

impl YouTubeTranscripts {
    pub fn new(language: impl Into<String>, user_agent: Option<&str>) -> Result<Self> {
        Self::with_base_url(YOUTUBE_BASE, language, user_agent)
    }

    pub fn with_base_url(
        base: &str,
        language: impl Into<String>,
        user_agent: Option<&str>,
    ) -> Result<Self> {
        let mut client = HttpClient::new(base)
            .map_err(|e| ThalliError::Transcript(format!("client init failed: {e}")))?;
        if let Some(agent) = user_agent {
            client = client.with_user_agent(agent);
        }
        Ok(Self {
            client,
            language: language.into(),
        })
    }
}

#[async_trait]
impl TranscriptSource for YouTubeTranscripts {
    async fn transcript(&self, video_id: &str) -> Result<Transcript> {
        tracing::debug!(target: "web", video_id, "web.video.start");
        let watch = self
            .client
            .get_text(
                "watch",
                RequestOpts {
                    query: Some(vec![("v", video_id.into())]),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| ThalliError::Transcript(format!("{video_id}: {e}")))?;

        let tracks = caption_tracks(&watch);
        let track = pick_track(&tracks, &self.language)
            .ok_or_else(|| ThalliError::Transcript(format!("{video_id}: no caption tracks")))?;

        let xml = self
            .client
            .get_text(
                &track.base_url,
                RequestOpts {
                    allow_absolute: true,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| ThalliError::Transcript(format!("{video_id}: {e}")))?;

        let text = transcript_text(&xml);
        if text.is_empty() {
            return Err(ThalliError::Transcript(format!(
                "{video_id}: caption track is empty"
            )));
        }
        tracing::debug!(
            target: "web",
            video_id,
            language = %track.language_code,
            generated = track.is_generated(),
            chars = text.len(),
            "web.video.done"
        );
        Ok(Transcript {
            video_id: video_id.to_string(),
            language: track.language_code.clone(),
            text,
        })
    }
}
