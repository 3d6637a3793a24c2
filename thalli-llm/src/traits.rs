use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thalli_common::{Result, ThalliError};
use thalli_http::HttpError;

/// Instruction prepended to a cleaned page before grammar correction.
pub const CORRECTION_PREFIX: &str = "Correct grammar, improve formatting, preserve structure:\n\n";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

#[derive(thiserror::Error, Debug)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(HttpError),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Provider rejected credentials: {0}")]
    Unauthorized(String),

    #[error("Content blocked by provider: {0}")]
    Blocked(String),

    #[error("Provider returned no text")]
    EmptyResponse,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<HttpError> for LlmError {
    fn from(e: HttpError) -> Self {
        match e.status().map(|s| s.as_u16()) {
            Some(429) => LlmError::RateLimit,
            Some(401 | 403) => LlmError::Unauthorized(e.to_string()),
            _ => LlmError::Http(e),
        }
    }
}

impl From<LlmError> for ThalliError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Config(msg) => ThalliError::Config(msg),
            other => ThalliError::Agent(other.to_string()),
        }
    }
}

/// Prompt comparing several search-result digests for one question.
///
/// ```
/// use thalli_llm::traits::synthesis_prompt;
///
/// let prompt = synthesis_prompt("why is the sky blue", &["Rayleigh.".into(), "Light.".into()]);
/// assert!(prompt.contains("--- Website 1 ---\nRayleigh."));
/// assert!(prompt.contains("--- Website 2 ---\nLight."));
/// assert!(prompt.contains("top 2 websites"));
/// ```
pub fn synthesis_prompt(query: &str, site_contents: &[String]) -> String {
    let sections = site_contents
        .iter()
        .enumerate()
        .map(|(i, content)| format!("--- Website {} ---\n{}", i + 1, content))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are a helpful AI assistant. Here is a question:\n\n{query}\n\n\
         Below are the extracted responses from the top {n} websites. Compare them, \
         correct inaccuracies, and summarize the most reliable and accurate answer.\n\n\
         {sections}\n\n\
         Return only the best and most accurate answer.",
        n = site_contents.len(),
    )
}

pub fn transcript_prompt(transcript: &str) -> String {
    format!(
        "Summarize this video transcript. Start with a one-paragraph overview, \
         then list the key points as '-' bullets in the order they are discussed.\n\n\
         {transcript}"
    )
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response to the given prompt with optional system prompt
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse>;

    /// Check if the LLM service is available
    async fn health_check(&self) -> Result<bool>;

    fn model_name(&self) -> &str;

    /// Grammar and formatting pass over an extracted page.
    async fn correct_document(&self, text: &str) -> Result<String> {
        let prompt = format!("{CORRECTION_PREFIX}{text}");
        tracing::debug!(chars = text.len(), model = self.model_name(), "llm.correct.start");
        let response = self.generate(&prompt, None, None, None).await?;
        Ok(response.text)
    }

    /// Reconcile several page digests into one answer to `query`.
    async fn synthesize_answer(&self, query: &str, site_contents: &[String]) -> Result<String> {
        let prompt = synthesis_prompt(query, site_contents);
        tracing::debug!(
            sites = site_contents.len(),
            model = self.model_name(),
            "llm.synthesize.start"
        );
        let response = self.generate(&prompt, None, None, Some(0.3)).await?;
        Ok(response.text)
    }

    async fn summarize_transcript(&self, transcript: &str) -> Result<String> {
        let prompt = transcript_prompt(transcript);
        tracing::debug!(
            chars = transcript.len(),
            model = self.model_name(),
            "llm.transcript.start"
        );
        let response = self.generate(&prompt, None, None, None).await?;
        Ok(response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmClient for Recorder {
        async fn generate(
            &self,
            prompt: &str,
            _system_prompt: Option<&str>,
            _max_tokens: Option<u32>,
            _temperature: Option<f32>,
        ) -> Result<LlmResponse> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(LlmResponse {
                text: "done".into(),
                model: None,
                tokens_used: None,
            })
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn model_name(&self) -> &str {
            "recorder"
        }
    }

    #[tokio::test]
    async fn correction_uses_fixed_prefix() {
        let llm = Recorder::default();
        let out = llm.correct_document("# Title\n\nbody text").await.unwrap();
        assert_eq!(out, "done");
        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(
            prompts[0],
            "Correct grammar, improve formatting, preserve structure:\n\n# Title\n\nbody text"
        );
    }

    #[tokio::test]
    async fn synthesis_lists_every_site_in_order() {
        let llm = Recorder::default();
        let sites = vec!["alpha".to_string(), "beta".into(), "gamma".into()];
        llm.synthesize_answer("what is rust", &sites).await.unwrap();
        let prompt = llm.prompts.lock().unwrap()[0].clone();
        let a = prompt.find("--- Website 1 ---\nalpha").unwrap();
        let b = prompt.find("--- Website 2 ---\nbeta").unwrap();
        let c = prompt.find("--- Website 3 ---\ngamma").unwrap();
        assert!(a < b && b < c);
        assert!(prompt.starts_with("You are a helpful AI assistant. Here is a question:\n\nwhat is rust"));
        assert!(prompt.ends_with("Return only the best and most accurate answer."));
    }

    #[tokio::test]
    async fn transcript_summary_embeds_transcript() {
        let llm = Recorder::default();
        llm.summarize_transcript("hello and welcome").await.unwrap();
        assert!(llm.prompts.lock().unwrap()[0].ends_with("hello and welcome"));
    }

    #[test]
    fn http_status_maps_to_llm_error() {
        let rate = HttpError::Api {
            status: thalli_http::StatusCode::TOO_MANY_REQUESTS,
            message: "slow down".into(),
            request_id: "-".into(),
        };
        assert!(matches!(LlmError::from(rate), LlmError::RateLimit));

        let denied = HttpError::Api {
            status: thalli_http::StatusCode::FORBIDDEN,
            message: "bad key".into(),
            request_id: "-".into(),
        };
        assert!(matches!(LlmError::from(denied), LlmError::Unauthorized(_)));
    }

    #[test]
    fn config_errors_stay_config_errors() {
        let err: ThalliError = LlmError::Config("no key".into()).into();
        assert!(matches!(err, ThalliError::Config(_)));
        let err: ThalliError = LlmError::EmptyResponse.into();
        assert!(matches!(err, ThalliError::Agent(_)));
    }
}
