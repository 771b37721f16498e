//! Chat-completions client for any endpoint speaking the OpenAI dialect
//! (OpenAI, OpenRouter, Ollama, vLLM, llama.cpp server, ...).

use std::time::Duration;

use assistd_core::error::ProviderError;
use assistd_core::provider::{PromptMessage, Provider, ProviderRequest, ProviderResponse, Usage};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::router::Endpoint;

/// Seconds to back off on a 429 that carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

pub struct OpenAiCompatProvider {
    name: String,
    completions_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    pub fn new(
        name: impl Into<String>,
        base_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            completions_url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            // Local servers (Ollama, vLLM) run without a key.
            api_key: (!api_key.is_empty()).then(|| api_key.to_string()),
            client,
        })
    }

    pub fn from_endpoint(endpoint: &Endpoint, timeout: Duration) -> Result<Self, ProviderError> {
        Self::new(&endpoint.name, &endpoint.base_url, &endpoint.api_key, timeout)
    }

    pub fn completions_url(&self) -> &str {
        &self.completions_url
    }

    /// Map a non-success status to the matching provider error.
    fn status_error(status: StatusCode, retry_after: Option<u64>, body: String) -> ProviderError {
        match status {
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
                retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ProviderError::AuthenticationFailed(format!("{status}: {body}"))
            }
            _ => ProviderError::ApiError {
                status_code: status.as_u16(),
                message: body,
            },
        }
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let body = ChatRequest::from(&request);
        debug!(
            provider = %self.name,
            model = %request.model,
            turns = request.messages.len(),
            "Sending completion request"
        );

        let mut call = self.client.post(&self.completions_url).json(&body);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let response = call.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(e.to_string())
            } else {
                ProviderError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            let text = response.text().await.unwrap_or_default();
            warn!(provider = %self.name, %status, body = %text, "Provider returned error");
            return Err(Self::status_error(status, retry_after, text));
        }

        let completion: ChatResponse = response.json().await.map_err(|e| {
            ProviderError::ApiError {
                status_code: status.as_u16(),
                message: format!("Malformed completion: {e}"),
            }
        })?;

        completion.into_response(&request.model)
    }
}

// --- Wire types ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatTurn<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatTurn<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a ProviderRequest> for ChatRequest<'a> {
    fn from(request: &'a ProviderRequest) -> Self {
        Self {
            model: &request.model,
            messages: request
                .messages
                .iter()
                .map(|m: &'a PromptMessage| ChatTurn {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl ChatResponse {
    fn into_response(self, requested_model: &str) -> Result<ProviderResponse, ProviderError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ApiError {
                status_code: 200,
                message: "Completion had no choices".into(),
            })?;

        Ok(ProviderResponse {
            content: choice.message.content.unwrap_or_default(),
            usage: self.usage.map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            model: self
                .model
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| requested_model.to_string()),
        })
    }
}
