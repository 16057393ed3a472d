//! LLM provider trait definition

use async_trait::async_trait;

use crate::types::ChatMessage;

use super::error::LlmResult;

/// Requested shape of the completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Free text
    #[default]
    Text,
    /// A JSON object
    Json,
}

/// Options for a single generation request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateOptions {
    /// Temperature for response generation (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Output format hint
    pub format: OutputFormat,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl GenerateOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set temperature
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Ask for a JSON object
    pub fn json(mut self) -> Self {
        self.format = OutputFormat::Json;
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}

/// Provider trait for LLM implementations
///
/// One call is one complete, non-streaming completion.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "ollama", "openai")
    fn name(&self) -> &str;

    /// Generate a completion for the given messages
    async fn generate(&self, messages: Vec<ChatMessage>, options: GenerateOptions) -> LlmResult<String>;
}
