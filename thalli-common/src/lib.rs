//! Common types and utilities shared across Thalli crates.
//!
//! This crate defines the provider-agnostic LLM configuration, observability
//! helpers, and the shared error type used throughout the Thalli workspace.
//! It is intentionally lightweight so that every crate can depend on it
//! without pulling in the HTTP or HTML stacks.
//!
//! # Overview
//!
//! - [`LlmConfig`]: Provider-agnostic LLM configuration
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`ThalliError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use thalli_common::{LlmConfig, ThalliError};
//!
//! let cfg = LlmConfig::default();
//! assert!(matches!(cfg, LlmConfig::None));
//!
//! let err = ThalliError::Fetch("https://example.com: timed out".into());
//! assert!(err.to_string().starts_with("Fetch error"));
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// Model used when a Gemini config omits `model`.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro-latest";
/// Model used when an OpenAI config omits `model`.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Configuration for the LLM provider that corrects and summarizes text.
///
/// Feature flags control which variants are compiled in. The value is passed
/// explicitly into the orchestrator; there is no process-wide client.
/// See the `thalli-llm` crate for concrete client implementations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum LlmConfig {
    #[cfg(feature = "gemini")]
    Gemini {
        api_key: String,
        #[serde(default = "default_gemini_model")]
        model: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        temperature: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_tokens: Option<u32>,
    },
    #[cfg(feature = "openai")]
    #[serde(rename = "openai")]
    OpenAi {
        api_key: String,
        #[serde(default = "default_openai_model")]
        model: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },
    #[default]
    None,
}

#[cfg(feature = "gemini")]
fn default_gemini_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

#[cfg(feature = "openai")]
fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.to_string()
}

/// Error types used across the Thalli system.
#[derive(thiserror::Error, Debug)]
pub enum ThalliError {
    /// The LLM collaborator failed to complete a requested operation.
    #[error("Agent error: {0}")]
    Agent(String),

    /// A driver (network, parser, etc.) reported an error.
    #[error("Driver error: {0}")]
    Driver(#[from] anyhow::Error),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Markup was structurally unusable (for example, no `<body>`).
    #[error("Extraction error: {0}")]
    Extract(String),

    /// A page or search request could not be completed.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// No transcript could be obtained for a video link.
    #[error("Transcript unavailable: {0}")]
    Transcript(String),

    /// Operation exceeded the configured timeout.
    #[error("Timeout occurred")]
    Timeout,
}

/// Convenient alias for results that use [`ThalliError`].
pub type Result<T> = std::result::Result<T, ThalliError>;
