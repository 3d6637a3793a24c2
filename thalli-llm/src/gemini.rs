use crate::traits::{LlmClient, LlmError, LlmResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;
use thalli_common::{Result, ThalliError};
use thalli_http::{Auth, HttpClient, RequestOpts};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
    safety_settings: Vec<GeminiSafetySetting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

impl GeminiContent {
    fn text(text: &str) -> Self {
        Self {
            parts: vec![GeminiPart {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct GeminiSafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    total_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Google Gemini `generateContent` client.
///
/// Requires a valid API key and internet access.
pub struct GeminiClient {
    client: HttpClient,
    api_key: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl GeminiClient {
    /// Create a new client using the provided API key and model.
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::with_base_url(GEMINI_BASE_URL, api_key, model)
    }

    /// Point the client at another endpoint (proxies, local mocks).
    pub fn with_base_url(base: &str, api_key: String, model: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(LlmError::Config("Gemini api_key is empty".into()).into());
        }
        let base = if base.ends_with('/') {
            Cow::Borrowed(base)
        } else {
            Cow::Owned(format!("{base}/"))
        };
        let client = HttpClient::new(&base)
            .map_err(|e| ThalliError::Agent(format!("Failed to create HTTP client: {e}")))?
            .with_timeout(Duration::from_secs(60));

        Ok(Self {
            client,
            api_key,
            model,
            temperature: None,
            max_tokens: None,
        })
    }

    /// Defaults applied when a call does not pass its own values.
    pub fn with_generation(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    fn safety_settings() -> Vec<GeminiSafetySetting> {
        SAFETY_CATEGORIES
            .into_iter()
            .map(|category| GeminiSafetySetting {
                category,
                threshold: "BLOCK_MEDIUM_AND_ABOVE",
            })
            .collect()
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let path = format!("models/{}:generateContent", self.model);

        let temperature = temperature.or(self.temperature);
        let max_output_tokens = max_tokens.or(self.max_tokens);
        let generation_config = (temperature.is_some() || max_output_tokens.is_some()).then_some(
            GeminiGenerationConfig {
                temperature,
                max_output_tokens,
            },
        );

        let request = GeminiRequest {
            contents: vec![GeminiContent::text(prompt)],
            generation_config,
            safety_settings: Self::safety_settings(),
            system_instruction: system_prompt.map(GeminiContent::text),
        };

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "llm.gemini.request");

        let opts = RequestOpts {
            auth: Some(Auth::Query {
                name: "key",
                value: Cow::Borrowed(&self.api_key),
            }),
            ..Default::default()
        };
        let response: GeminiResponse = self
            .client
            .post_json_opts(&path, &request, opts)
            .await
            .map_err(LlmError::from)?;

        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(LlmError::Blocked(reason).into());
        }

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?;

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(LlmError::Blocked("SAFETY".into()).into());
        }

        let text = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse.into());
        }

        let tokens_used = response.usage_metadata.and_then(|u| u.total_token_count);
        tracing::debug!(model = %self.model, tokens_used, "llm.gemini.response");

        Ok(LlmResponse {
            text,
            model: Some(self.model.clone()),
            tokens_used,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        match self
            .generate("Respond with just 'OK'", None, Some(5), Some(0.1))
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!(error = %e, "llm.gemini.health_check_failed");
                Ok(false)
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
