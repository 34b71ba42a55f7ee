//! OpenAI-compatible chat-completion backend.
//!
//! One synchronous request per reply: POST with bearer-token auth, JSON
//! body `{model, messages, max_tokens, temperature}`, first choice's
//! message content as the result. Any non-success status or unexpected
//! body shape is an error; the caller treats it as "no reply this turn."

use crate::backend::{ChatBackend, ChatMessage, GenerationParams};
use crate::error::GenerationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request timeout; there is no retry, so a hung call only costs one turn.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

/// Chat-completion backend for OpenAI-compatible endpoints.
pub struct OpenAiCompatBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    params: GenerationParams,
}

impl OpenAiCompatBackend {
    /// Creates a backend for the given endpoint and fixed parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        params: GenerationParams,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GenerationError::InvalidConfig {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            params,
        })
    }
}

/// Extracts the first completion's text from a response body.
fn parse_completion(body: &str) -> Result<String, GenerationError> {
    let response: CompletionResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::MalformedResponse {
            reason: e.to_string(),
        })?;

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| GenerationError::MalformedResponse {
            reason: "empty choices".to_string(),
        })
}

#[async_trait]
impl ChatBackend for OpenAiCompatBackend {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, GenerationError> {
        let request = CompletionRequest {
            model: &self.params.model,
            messages,
            max_tokens: self.params.max_tokens,
            temperature: self.params.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::BadStatus {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::RequestFailed {
                reason: e.to_string(),
            })?;

        parse_completion(&body)
    }

    fn model(&self) -> &str {
        &self.params.model
    }
}
