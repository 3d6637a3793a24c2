use crate::traits::{LlmClient, LlmError, LlmResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thalli_common::{Result, ThalliError};
use thalli_http::HttpClient;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1/";

/// OpenAI Responses API client; also works with compatible gateways via
/// `base_url`.
pub struct OpenAiClient {
    client: HttpClient,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ResponsesApiRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ResponsesApiResponse {
    model: String,
    #[serde(default)]
    output: Vec<ResponseMessage>,
    usage: Option<ResponseUsage>,
}

/// One element in the `output` array
#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Vec<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    total_tokens: Option<u32>,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, base_url: Option<&str>) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(LlmError::Config("OpenAI api_key is empty".into()).into());
        }
        let base = match base_url {
            Some(url) if url.ends_with('/') => url.to_string(),
            Some(url) => format!("{url}/"),
            None => OPENAI_API_BASE.to_string(),
        };
        let client = HttpClient::new(&base)
            .map_err(|e| ThalliError::Agent(format!("HttpClient init failed: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let req = ResponsesApiRequest {
            model: &self.model,
            input: prompt,
            instructions: system_prompt,
            max_output_tokens: max_tokens,
            temperature,
        };
        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "llm.openai.request");

        let resp: ResponsesApiResponse = self
            .client
            .post_json("responses", Some(&self.api_key), &req)
            .await
            .map_err(LlmError::from)?;

        let text = resp
            .output
            .iter()
            .flat_map(|msg| &msg.content)
            .filter(|c| c.kind == "output_text")
            .map(|c| c.text.as_str())
            .collect::<String>();
        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse.into());
        }

        Ok(LlmResponse {
            text,
            model: Some(resp.model),
            tokens_used: resp.usage.and_then(|u| u.total_tokens),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        match self
            .generate("Respond with just 'OK'", None, Some(16), Some(0.1))
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!(error = %e, "llm.openai.health_check_failed");
                Ok(false)
            }
        }
    }
}
