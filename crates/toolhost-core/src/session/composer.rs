//! Natural-language replies from raw tool output

use std::sync::Arc;

use crate::decision::DecisionParser;
use crate::llm::{GenerateOptions, LlmProvider};
use crate::logging::Logger;
use crate::types::ChatMessage;

use super::prompt::{build_compose_instructions, tool_result_message};

/// Reply used whenever a tool result cannot be turned into text
pub const COMPOSE_APOLOGY: &str = "I had trouble formulating a response based on the tool's output.";

/// Sampling temperature for composed replies
pub const COMPOSE_TEMPERATURE: f32 = 0.3;

/// Asks the model to phrase a tool result for the user
pub struct ResponseComposer {
    llm: Arc<dyn LlmProvider>,
    parser: DecisionParser,
    logger: Arc<dyn Logger>,
}

impl ResponseComposer {
    pub fn new(llm: Arc<dyn LlmProvider>, logger: Arc<dyn Logger>) -> Self {
        Self {
            llm,
            parser: DecisionParser::new(),
            logger,
        }
    }

    /// Split completions on a different reasoning marker
    pub fn set_parser(&mut self, parser: DecisionParser) {
        self.parser = parser;
    }

    /// Compose a reply; never fails, falling back to [`COMPOSE_APOLOGY`]
    ///
    /// Only text after the reasoning marker is shown to the user. A completion
    /// without the marker is treated as unusable.
    pub async fn compose_from_tool_result(&self, tool_name: &str, raw_result: &str, original_prompt: &str) -> String {
        let messages = vec![
            ChatMessage::system(build_compose_instructions(original_prompt)),
            ChatMessage::user(tool_result_message(tool_name, raw_result)),
        ];
        let options = GenerateOptions::new().with_temperature(COMPOSE_TEMPERATURE);

        let completion = match self.llm.generate(messages, options).await {
            Ok(completion) => completion,
            Err(err) => {
                self.logger
                    .error(&format!("[ResponseComposer] Error generating response: {}", err));
                return COMPOSE_APOLOGY.to_string();
            }
        };

        let text = match self.parser.extract_final_text(&completion) {
            Ok(text) => text,
            Err(err) => {
                self.logger
                    .warn(&format!("[ResponseComposer] Could not extract reply: {}", err));
                return COMPOSE_APOLOGY.to_string();
            }
        };

        if text.is_empty() {
            self.logger.warn("[ResponseComposer] Model returned no final text");
            return COMPOSE_APOLOGY.to_string();
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockMode, MockProvider};
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};

    fn composer(mock: Arc<MockProvider>) -> ResponseComposer {
        ResponseComposer::new(mock, Arc::new(NoOpLogger::new()))
    }

    #[tokio::test]
    async fn test_strips_reasoning() {
        let mock = Arc::new(MockProvider::fixed(
            "<think>user wants the echo</think>\nThe server said hello back.",
            Arc::new(NoOpLogger::new()),
        ));
        let reply = composer(mock.clone())
            .compose_from_tool_result("echo", "Echo: hello", "say hello")
            .await;
        assert_eq!(reply, "The server said hello back.");

        let call = &mock.calls()[0];
        assert_eq!(call.options.temperature, Some(COMPOSE_TEMPERATURE));
        assert!(call.messages[0].content.contains("Original User Prompt: say hello"));
        assert_eq!(call.messages[1].content, "Tool 'echo' executed with result: Echo: hello");
    }

    #[tokio::test]
    async fn test_unmarked_completion_is_not_shown() {
        let logger = Arc::new(MemoryLogger::new());
        let mock = Arc::new(MockProvider::fixed(r#"{"temp": 21, "raw": true}"#, Arc::new(NoOpLogger::new())));
        let reply = ResponseComposer::new(mock, logger.clone())
            .compose_from_tool_result("weather", "{}", "weather?")
            .await;

        assert_eq!(reply, COMPOSE_APOLOGY);
        assert!(logger.contains(LogLevel::Warn, "Could not extract reply"));
    }

    #[tokio::test]
    async fn test_apology_on_failure_or_empty_text() {
        let failing = Arc::new(MockProvider::error("offline", Arc::new(NoOpLogger::new())));
        assert_eq!(composer(failing).compose_from_tool_result("echo", "x", "y").await, COMPOSE_APOLOGY);

        let empty = Arc::new(MockProvider::new(
            MockMode::Fixed("<think>nothing to add</think>   ".into()),
            Arc::new(NoOpLogger::new()),
        ));
        assert_eq!(composer(empty).compose_from_tool_result("echo", "x", "y").await, COMPOSE_APOLOGY);
    }
}
