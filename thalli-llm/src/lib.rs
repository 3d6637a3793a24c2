//! Provider-agnostic LLM integration for Thalli.
//!
//! This crate exposes a common [`traits::LlmClient`] interface, with the three
//! text tasks the pipeline needs (grammar correction, search synthesis,
//! transcript summary) as default methods over `generate`. Concrete clients
//! exist for Gemini and OpenAI; [`ensure_llm_ready`] builds one from a
//! [`thalli_common::LlmConfig`].
//!
//! # Examples
//! ```no_run
//! use thalli_common::{LlmConfig, Result};
//! use thalli_llm::ensure_llm_ready;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let cfg = LlmConfig::Gemini {
//!     api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
//!     model: "gemini-1.5-pro-latest".into(),
//!     temperature: None,
//!     max_tokens: None,
//! };
//! let client = ensure_llm_ready(&cfg)?;
//! let text = client.correct_document("teh kettle boil water").await?;
//! println!("{text}");
//! # Ok(())
//! # }
//! ```
#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "openai")]
pub mod openai;
pub mod traits;

use std::sync::Arc;
use thalli_common::{LlmConfig, ThalliError};
use traits::LlmClient;

/// Build the client described by `config`.
///
/// `LlmConfig::None` is a configuration error: every answer path needs a model.
pub fn ensure_llm_ready(
    config: &LlmConfig,
) -> thalli_common::Result<Arc<dyn LlmClient + Send + Sync + 'static>> {
    match config {
        #[cfg(feature = "gemini")]
        LlmConfig::Gemini {
            api_key,
            model,
            temperature,
            max_tokens,
        } => {
            let client = gemini::GeminiClient::new(api_key.clone(), model.clone())?
                .with_generation(*temperature, *max_tokens);
            tracing::info!(provider = "gemini", model = %model, "llm.ready");
            Ok(Arc::new(client))
        }
        #[cfg(feature = "openai")]
        LlmConfig::OpenAi {
            api_key,
            model,
            base_url,
        } => {
            let client =
                openai::OpenAiClient::new(api_key.clone(), model.clone(), base_url.as_deref())?;
            tracing::info!(provider = "openai", model = %model, "llm.ready");
            Ok(Arc::new(client))
        }
        LlmConfig::None => Err(ThalliError::Config(
            "No LLM configured; set llm.provider in thalli.yaml".to_string(),
        )),
        #[allow(unreachable_patterns)]
        _ => Err(ThalliError::Config("LLM provider not enabled".to_string())),
    }
}
