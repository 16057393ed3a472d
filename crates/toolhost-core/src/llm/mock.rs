//! Mock provider for testing
//!
//! Provides deterministic, configurable completions without network
//! dependencies. Every request is recorded so tests can inspect the prompts
//! and options the orchestration layer sent.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{LlmError, LlmResult};
use super::traits::{GenerateOptions, LlmProvider};
use crate::logging::Logger;
use crate::types::{last_user_text, ChatMessage};

/// Mock response mode
#[derive(Debug, Clone, Default)]
pub enum MockMode {
    /// Echo back the last user message
    #[default]
    Echo,
    /// Return a fixed response
    Fixed(String),
    /// Return responses in order; each entry is a completion or an error
    /// message. Once exhausted, further calls fail.
    Script(Vec<Result<String, String>>),
    /// Fail every call
    Error(String),
}

/// A request the mock received
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub options: GenerateOptions,
}

/// Mock LLM provider for testing
pub struct MockProvider {
    mode: MockMode,
    script: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<RecordedCall>>,
    logger: Arc<dyn Logger>,
}

impl MockProvider {
    /// Create a mock in the given mode
    pub fn new(mode: MockMode, logger: Arc<dyn Logger>) -> Self {
        let script = match &mode {
            MockMode::Script(steps) => steps.iter().cloned().collect(),
            _ => VecDeque::new(),
        };
        Self {
            mode,
            script: Mutex::new(script),
            calls: Mutex::new(Vec::new()),
            logger,
        }
    }

    /// Create an echo provider (echoes back the user message)
    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self::new(MockMode::Echo, logger)
    }

    /// Create a fixed response provider
    pub fn fixed(response: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::new(MockMode::Fixed(response.into()), logger)
    }

    /// Create a provider that answers with `responses` in order
    pub fn script<I, S>(responses: I, logger: Arc<dyn Logger>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            MockMode::Script(responses.into_iter().map(|r| Ok(r.into())).collect()),
            logger,
        )
    }

    /// Create an error-producing provider
    pub fn error(message: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::new(MockMode::Error(message.into()), logger)
    }

    /// All requests received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, messages: Vec<ChatMessage>, options: GenerateOptions) -> LlmResult<String> {
        self.logger.debug("MockProvider: generate called");

        let result = match &self.mode {
            MockMode::Echo => {
                let user = last_user_text(&messages).unwrap_or("Hello from MockProvider!");
                Ok(format!("Echo: {}", user))
            }
            MockMode::Fixed(response) => Ok(response.clone()),
            MockMode::Script(_) => match self.script.lock().pop_front() {
                Some(Ok(response)) => Ok(response),
                Some(Err(message)) => Err(LlmError::Other(format!("Mock error: {}", message))),
                None => Err(LlmError::Other("Mock script exhausted".to_string())),
            },
            MockMode::Error(message) => Err(LlmError::Other(format!("Mock error: {}", message))),
        };

        self.calls.lock().push(RecordedCall { messages, options });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::types::MessageRole;

    fn test_logger() -> Arc<dyn Logger> {
        Arc::new(NoOpLogger::new())
    }

    fn test_messages(content: &str) -> Vec<ChatMessage> {
        vec![ChatMessage::system("rules"), ChatMessage::user(content)]
    }

    #[tokio::test]
    async fn test_echo_mode() {
        let provider = MockProvider::echo(test_logger());
        let result = provider
            .generate(test_messages("Hello, world!"), GenerateOptions::default())
            .await
            .unwrap();
        assert_eq!(result, "Echo: Hello, world!");
    }

    #[tokio::test]
    async fn test_script_mode() {
        let provider = MockProvider::new(
            MockMode::Script(vec![Ok("first".into()), Err("boom".into())]),
            test_logger(),
        );

        assert_eq!(provider.generate(test_messages("a"), GenerateOptions::default()).await.unwrap(), "first");
        assert!(provider.generate(test_messages("b"), GenerateOptions::default()).await.is_err());
        assert!(matches!(
            provider.generate(test_messages("c"), GenerateOptions::default()).await,
            Err(LlmError::Other(msg)) if msg.contains("exhausted")
        ));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_records_calls() {
        let provider = MockProvider::fixed("ok", test_logger());
        let options = GenerateOptions::new().with_temperature(0.1).json();
        provider.generate(test_messages("hi"), options.clone()).await.unwrap();

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].options, options);
        assert_eq!(calls[0].messages[0].role, MessageRole::System);
    }

    #[tokio::test]
    async fn test_error_mode() {
        let provider = MockProvider::error("offline", test_logger());
        let err = provider
            .generate(test_messages("hi"), GenerateOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("offline"));
        assert_eq!(provider.name(), "mock");
    }
}
