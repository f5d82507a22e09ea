//! Error types for remote completion calls
//!
//! A failed call is never retried; the category only decides how the failure
//! is reported to the user.

use thiserror::Error;

/// Errors that can occur when calling the remote endpoint
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Network-related errors (connection issues, DNS failures)
    #[error("Network error: {message}")]
    Network {
        /// Error message
        message: String,
    },

    /// Authentication errors (invalid API key, unauthorized access)
    #[error("Authentication error: {message}")]
    Auth {
        /// Error message
        message: String,
    },

    /// Rate limit or quota errors
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        /// Error message
        message: String,
    },

    /// Invalid request errors (bad parameters, malformed input)
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Error message
        message: String,
    },

    /// Request took longer than the configured timeout
    #[error("Request timeout after {seconds} seconds")]
    Timeout {
        /// Timeout duration in seconds
        seconds: u64,
    },

    /// Errors reported by the service itself
    #[error("Provider error: {message}")]
    Provider {
        /// Error message from provider
        message: String,
        /// Optional error code from provider
        code: Option<String>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },

    /// Configuration errors (missing API key, unusable client settings)
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },
}

impl ProviderError {
    /// Hint printed next to the error, when one is useful
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            ProviderError::Auth { .. } | ProviderError::Config { .. } => {
                Some("Check your API key with 'askcmd --setup' or the ASKCMD_API_KEY variable.")
            }
            ProviderError::Network { .. } | ProviderError::Timeout { .. } => {
                Some("Check your network connection and the configured base URL.")
            }
            ProviderError::RateLimit { .. } => Some("Wait a moment before asking again."),
            _ => None,
        }
    }

    /// Creates a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates an authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Creates a rate limit error
    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::RateLimit {
            message: message.into(),
        }
    }

    /// Creates an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a timeout error
    pub fn timeout(seconds: u64) -> Self {
        Self::Timeout { seconds }
    }

    /// Creates a provider error
    pub fn provider(message: impl Into<String>, code: Option<impl Into<String>>) -> Self {
        Self::Provider {
            message: message.into(),
            code: code.map(|c| c.into()),
        }
    }

    /// Creates a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}
