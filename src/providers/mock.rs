//! Mock completion provider for testing
//!
//! Returns a configured response (or error) and records every request it
//! receives, so orchestration tests can inspect what would have been sent.

use std::sync::{Arc, Mutex};

use crate::providers::{CompletionRequest, LlmProvider, LlmResponse, ProviderError};

pub struct MockLlmProvider {
    response: Arc<Mutex<LlmResponse>>,
    error: Arc<Mutex<Option<ProviderError>>>,
    default_model: String,
    call_count: Arc<Mutex<usize>>,
    last_request: Arc<Mutex<Option<CompletionRequest>>>,
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self {
            response: Arc::new(Mutex::new(LlmResponse::new("Mock response"))),
            error: Arc::new(Mutex::new(None)),
            default_model: "mock-model".to_string(),
            call_count: Arc::new(Mutex::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Creates a mock that answers with `content`
    pub fn with_response(content: impl Into<String>) -> Self {
        let mock = Self::new();
        mock.set_response(content);
        mock
    }

    /// Sets the response content to return
    pub fn set_response(&self, content: impl Into<String>) {
        *self.response.lock().unwrap() = LlmResponse::new(content);
    }

    /// Sets the error to return instead of the response
    pub fn set_error(&self, error: ProviderError) {
        *self.error.lock().unwrap() = Some(error);
    }

    /// Returns the number of times complete() was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Returns the last request passed to complete()
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

impl Default for MockLlmProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<LlmResponse, ProviderError> {
        *self.call_count.lock().unwrap() += 1;
        *self.last_request.lock().unwrap() = Some(request);

        if let Some(err) = self.error.lock().unwrap().clone() {
            return Err(err);
        }

        Ok(self.response.lock().unwrap().clone())
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{LlmMessage, LlmRole};

    #[tokio::test]
    async fn test_mock_provider_basic() {
        let mock = MockLlmProvider::with_response("Hello!");

        let request = CompletionRequest::new("sys", vec![LlmMessage::new(LlmRole::User, "Hi")]);
        let response = mock.complete(request).await.unwrap();

        assert_eq!(response.content, "Hello!");
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.last_request().unwrap().system, "sys");
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let mock = MockLlmProvider::new();
        mock.set_error(ProviderError::network("Connection failed"));

        let result = mock.complete(CompletionRequest::new("sys", vec![])).await;

        assert!(result.unwrap_err().to_string().contains("Network error"));
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn test_mock_implements_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MockLlmProvider>();
    }
}
