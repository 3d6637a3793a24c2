//! Web acquisition and orchestration around the extraction core.
//!
//! - [`fetch`]: page fetcher trait and HTTP implementation
//! - [`search`]: search provider trait and DuckDuckGo HTML client
//! - [`video`]: video link detection and caption transcripts
//! - [`intel`]: [`WebIntel`], which routes an input to the right pipeline
//!
//! Every collaborator sits behind a trait so the orchestrator can be driven by
//! fakes in tests.

pub mod fetch;
pub mod intel;
pub mod search;
pub mod video;

pub use fetch::{FetchedPage, HttpPageFetcher, PageFetcher};
pub use intel::{Answer, AnswerKind, Input, IntelConfig, WebIntel};
pub use search::{DuckDuckGo, SearchProvider};
pub use video::{Transcript, TranscriptSource, YouTubeTranscripts};
