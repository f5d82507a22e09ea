//! Remote completion client for askcmd
//!
//! A single text-generation endpoint is used per invocation. The `LlmProvider`
//! trait sits at the seam so the orchestration code can be driven by a fake
//! client in tests; `ChatCompletionsProvider` is the only real implementation.
//!
//! # Example
//!
//! ```rust,no_run
//! use askcmd::providers::{CompletionRequest, LlmMessage, LlmProvider, LlmRole};
//!
//! async fn example(provider: &dyn LlmProvider) {
//!     let request = CompletionRequest::new(
//!         "You are a shell expert",
//!         vec![LlmMessage::new(LlmRole::User, "Query: list files")],
//!     );
//!
//!     let response = provider.complete(request).await.unwrap();
//!     println!("Response: {}", response.content);
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod error;
#[cfg(test)]
pub mod mock;
pub mod openai;

pub use error::ProviderError;
pub use openai::ChatCompletionsProvider;

/// Default upper bound on generated tokens
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// A single conversation turn
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmMessage {
    /// Role of the message sender
    pub role: LlmRole,
    /// Content of the message
    pub content: String,
}

impl LlmMessage {
    /// Creates a new message with the specified role and content
    pub fn new(role: LlmRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Returns true if this message is from the user
    pub fn is_user(&self) -> bool {
        matches!(self.role, LlmRole::User)
    }

    /// Returns true if this message is from the assistant
    pub fn is_assistant(&self) -> bool {
        matches!(self.role, LlmRole::Assistant)
    }
}

/// Role of a message sender in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    /// System instructions
    System,
    /// User input
    User,
    /// Assistant response
    Assistant,
}

impl LlmRole {
    /// Returns the string representation of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmRole::System => "system",
            LlmRole::User => "user",
            LlmRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for LlmRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything the remote endpoint needs for one completion
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompletionRequest {
    /// System instructions, sent ahead of the turns
    pub system: String,
    /// Alternating user/assistant turns ending with the new user query
    pub messages: Vec<LlmMessage>,
    /// Sampling temperature; askcmd always uses 0
    pub temperature: f32,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
    /// Model override; the provider default is used when `None`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl CompletionRequest {
    /// Creates a deterministic request with the default token bound
    pub fn new(system: impl Into<String>, messages: Vec<LlmMessage>) -> Self {
        Self {
            system: system.into(),
            messages,
            temperature: 0.0,
            max_tokens: DEFAULT_MAX_TOKENS,
            model: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Response from the remote endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmResponse {
    /// Raw text of the assistant's answer
    pub content: String,
    /// Model that produced the answer, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Why generation stopped, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    /// Number of tokens in the prompt (if provided by provider)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    /// Number of tokens in the completion (if provided by provider)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
}

impl LlmResponse {
    /// Creates a new response with just content
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: None,
            finish_reason: None,
            prompt_tokens: None,
            completion_tokens: None,
        }
    }

    /// Adds token usage information
    pub fn with_tokens(mut self, prompt: u32, completion: u32) -> Self {
        self.prompt_tokens = Some(prompt);
        self.completion_tokens = Some(completion);
        self
    }

    /// Returns the total token count if available
    pub fn total_tokens(&self) -> Option<u32> {
        match (self.prompt_tokens, self.completion_tokens) {
            (Some(p), Some(c)) => Some(p + c),
            _ => None,
        }
    }
}

/// Trait for the remote completion endpoint
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Sends one request and returns the raw response text.
    ///
    /// Implementations make exactly one attempt; failures are reported, not retried.
    async fn complete(&self, request: CompletionRequest) -> Result<LlmResponse, ProviderError>;

    /// Returns the model used when the request carries no override
    fn default_model(&self) -> String;

    /// Returns the provider name, used for logging
    fn provider_name(&self) -> &'static str;
}
