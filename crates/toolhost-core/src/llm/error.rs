//! LLM provider error types

use thiserror::Error;

/// Errors that can occur while generating a completion
#[derive(Error, Debug)]
pub enum LlmError {
    /// Missing API key
    #[error("API key is required for {provider}")]
    MissingApiKey { provider: String },

    /// API request failed
    #[error("{provider} request failed: {message}")]
    Request { provider: String, message: String },

    /// The provider answered without any text
    #[error("{provider} returned an empty completion")]
    EmptyResponse { provider: String },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl LlmError {
    /// Create a request error
    pub fn request(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a missing API key error
    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }
}

pub type LlmResult<T> = Result<T, LlmError>;
