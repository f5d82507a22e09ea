//! OpenAI-compatible `chat/completions` client
//!
//! Works with any endpoint speaking the OpenAI chat format (OpenAI, OpenRouter,
//! local gateways). The system instructions are sent as the first message.
//! One attempt per call; HTTP status codes map onto [`ProviderError`] variants.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::providers::{CompletionRequest, LlmProvider, LlmResponse, LlmRole, ProviderError};

/// OpenAI API request body format
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

/// OpenAI message format
#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI API response format
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<ChatUsage>,
    #[serde(default)]
    error: Option<ChatError>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatError {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<String>,
}

/// Client for a single OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct ChatCompletionsProvider {
    api_key: String,
    base_url: String,
    default_model: String,
    timeout_seconds: u64,
    client: Client,
}

impl ChatCompletionsProvider {
    /// Creates a new client, failing if the HTTP client cannot be built
    pub fn try_new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        default_model: impl Into<String>,
        timeout_seconds: u64,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ProviderError::config(format!("Failed to build HTTP client: {}", e)))?;

        let base_url: String = base_url.into();

        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model: default_model.into(),
            timeout_seconds,
            client,
        })
    }

    /// Creates a client from the loaded configuration
    ///
    /// Fails with [`ProviderError::Config`] when no API key is configured.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::config("No API key configured"))?;

        Self::try_new(
            api_key,
            config.base_url(),
            config.model(),
            config.timeout_seconds(),
        )
    }

    fn build_request(&self, request: CompletionRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(ChatMessage {
            role: LlmRole::System.as_str().to_string(),
            content: Some(request.system),
        });
        messages.extend(request.messages.into_iter().map(|msg| ChatMessage {
            role: msg.role.as_str().to_string(),
            content: Some(msg.content),
        }));

        ChatRequest {
            model: request.model.unwrap_or_else(|| self.default_model.clone()),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    fn parse_response(&self, response: ChatResponse) -> Result<LlmResponse, ProviderError> {
        if let Some(error) = response.error {
            return Err(ProviderError::provider(
                error.message,
                error.code.or(error.error_type),
            ));
        }

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::provider("No response choices returned", None::<&str>))?;

        let mut llm_response = LlmResponse::new(choice.message.content.unwrap_or_default());
        llm_response.model = response.model;
        llm_response.finish_reason = choice.finish_reason;

        if let Some(usage) = response.usage {
            llm_response = llm_response.with_tokens(usage.prompt_tokens, usage.completion_tokens);
        }

        Ok(llm_response)
    }

    async fn send(&self, body: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(url = %url, model = %body.model, "Sending chat completion request");

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Request failed");
                if e.is_timeout() {
                    ProviderError::timeout(self.timeout_seconds)
                } else if e.is_connect() {
                    ProviderError::network(format!("Connection failed: {}", e))
                } else {
                    ProviderError::network(format!("Request failed: {}", e))
                }
            })?;

        let status = resp.status();
        debug!(status = %status, "Received response");

        if status == StatusCode::OK {
            return resp.json::<ChatResponse>().await.map_err(|e| {
                ProviderError::serialization(format!("Failed to parse response: {}", e))
            });
        }

        let error_text = resp.text().await.unwrap_or_default();
        Err(status_error(status, error_text))
    }
}

fn status_error(status: StatusCode, error_text: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::auth(format!(
            "Authentication failed ({}): {}",
            status, error_text
        )),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limit(error_text),
        status if status.is_client_error() => {
            ProviderError::invalid_request(format!("Client error ({}): {}", status, error_text))
        }
        status if status.is_server_error() => ProviderError::provider(
            format!("Server error ({}): {}", status, error_text),
            Some(status.as_u16().to_string()),
        ),
        _ => ProviderError::provider(
            format!("Unexpected status ({}): {}", status, error_text),
            Some(status.as_u16().to_string()),
        ),
    }
}

#[async_trait::async_trait]
impl LlmProvider for ChatCompletionsProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<LlmResponse, ProviderError> {
        let body = self.build_request(request);
        info!(
            model = %body.model,
            message_count = body.messages.len(),
            max_tokens = body.max_tokens,
            "Requesting completion"
        );

        let response = self.send(&body).await?;
        let llm_response = self.parse_response(response)?;

        info!(
            content_length = llm_response.content.len(),
            prompt_tokens = ?llm_response.prompt_tokens,
            completion_tokens = ?llm_response.completion_tokens,
            total_tokens = ?llm_response.total_tokens(),
            "Received completion"
        );

        Ok(llm_response)
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn provider_name(&self) -> &'static str {
        "chat_completions"
    }
}
