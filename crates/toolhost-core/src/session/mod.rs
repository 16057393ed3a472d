//! Orchestration session
//!
//! Drives one conversation: brings the providers up, asks the model for a
//! decision on every user turn, dispatches tool calls and phrases their
//! results, and tears everything down on every exit route.
//!
//! ```text
//! Idle -> Initializing -> Ready <-> ProcessingTurn
//!              |            |             |
//!              |            +------> ShuttingDown -> Closed
//!              +---------------------------------> Closed
//! ```

mod composer;
mod prompt;

pub use composer::{ResponseComposer, COMPOSE_APOLOGY, COMPOSE_TEMPERATURE};
pub use prompt::{build_compose_instructions, build_system_instructions, tool_result_message};

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::decision::{Decision, DecisionParser};
use crate::llm::{GenerateOptions, LlmProvider};
use crate::logging::Logger;
use crate::tools::{ProviderRegistry, ToolError};
use crate::types::{CancellationToken, ChatMessage, ToolProgress};

/// Sampling temperature for the decision step
pub const DECISION_TEMPERATURE: f32 = 0.1;

/// Reply when the model's decision cannot be parsed
pub const MALFORMED_DECISION_ANSWER: &str = "I couldn't understand the model's output.";
/// Reply when the model cannot be reached
pub const LLM_FAILURE_ANSWER: &str = "An unexpected error occurred with the LLM. Please try again.";
/// Reply when the model answers with an empty string
pub const EMPTY_ANSWER: &str = "I'm sorry, I couldn't process your request.";

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    Initializing,
    Ready,
    ProcessingTurn,
    ShuttingDown,
    Closed,
}

/// Session errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// A provider failed to come up; the session is closed
    #[error("Session startup failed: {0}")]
    Startup(#[source] ToolError),

    #[error("Session is not ready (state: {0:?})")]
    NotReady(SessionState),

    #[error("Session cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// How a turn's response came about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnKind {
    /// The model answered without a tool
    DirectAnswer,
    /// A tool ran and its result was phrased by the model
    ToolResult { tool: String, provider: String },
    /// No provider advertises the requested tool
    ToolNotFound { tool: String },
    /// The tool kept failing after retries
    ToolFailed { tool: String },
    /// A canned reply replaced an unusable model output
    Fallback,
}

/// Result of one user turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    /// Text shown to the user
    pub response: String,
    pub kind: TurnKind,
    /// Progress metadata reported by the tool, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ToolProgress>,
}

impl TurnOutcome {
    fn new(response: impl Into<String>, kind: TurnKind) -> Self {
        Self {
            response: response.into(),
            kind,
            progress: None,
        }
    }
}

/// One conversation over a set of tool providers
pub struct OrchestrationSession {
    registry: ProviderRegistry,
    llm: Arc<dyn LlmProvider>,
    parser: DecisionParser,
    composer: ResponseComposer,
    system_instructions: Option<String>,
    turns: u64,
    state: SessionState,
    shut_down: bool,
    logger: Arc<dyn Logger>,
}

impl OrchestrationSession {
    pub fn new(registry: ProviderRegistry, llm: Arc<dyn LlmProvider>, logger: Arc<dyn Logger>) -> Self {
        let composer = ResponseComposer::new(Arc::clone(&llm), Arc::clone(&logger));
        Self {
            registry,
            llm,
            parser: DecisionParser::new(),
            composer,
            system_instructions: None,
            turns: 0,
            state: SessionState::Idle,
            shut_down: false,
            logger,
        }
    }

    /// Use a parser with a different reasoning marker for both steps
    pub fn with_parser(mut self, parser: DecisionParser) -> Self {
        self.composer.set_parser(parser.clone());
        self.parser = parser;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Turns processed so far
    pub fn turn_count(&self) -> u64 {
        self.turns
    }

    /// Instructions sent with every decision request, once started
    pub fn system_instructions(&self) -> Option<&str> {
        self.system_instructions.as_deref()
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Bring every provider up and build the system instructions
    ///
    /// On failure every provider is cleaned up and the session is closed.
    pub async fn start(&mut self) -> SessionResult<()> {
        if self.state != SessionState::Idle {
            return Err(SessionError::NotReady(self.state));
        }
        self.state = SessionState::Initializing;
        self.logger.info("[Session] Initializing servers...");

        if let Err(err) = self.registry.initialize_all().await {
            self.logger
                .error(&format!("[Session] Failed to initialize servers, shutting down: {}", err));
            self.shutdown().await;
            return Err(SessionError::Startup(err));
        }

        let description = self.registry.describe_tools().await;
        self.logger.debug(&format!("[Session] Tools description:\n{}", description));
        self.system_instructions = Some(build_system_instructions(description));

        self.state = SessionState::Ready;
        self.logger.info("[Session] Ready");
        Ok(())
    }

    /// Process one user input; every turn yields text for the user
    pub async fn process_turn(&mut self, input: &str) -> SessionResult<TurnOutcome> {
        if self.state != SessionState::Ready {
            return Err(SessionError::NotReady(self.state));
        }
        self.state = SessionState::ProcessingTurn;
        self.turns += 1;

        let outcome = self.handle_turn(input).await;

        self.state = SessionState::Ready;
        Ok(outcome)
    }

    /// Like [`process_turn`](Self::process_turn), abandoned when `cancel` fires
    ///
    /// A cancelled session moves to `ShuttingDown`; call `shutdown()` next.
    pub async fn process_turn_cancellable(
        &mut self,
        input: &str,
        cancel: &CancellationToken,
    ) -> SessionResult<TurnOutcome> {
        let result = if cancel.is_cancelled() {
            None
        } else {
            tokio::select! {
                result = self.process_turn(input) => Some(result),
                _ = cancel.cancelled() => None,
            }
        };

        match result {
            Some(result) => result,
            None => {
                self.logger.info("[Session] Turn cancelled");
                self.state = SessionState::ShuttingDown;
                Err(SessionError::Cancelled)
            }
        }
    }

    /// Line-oriented chat loop
    ///
    /// Reads user lines from `input` and writes replies to `output` until
    /// `quit`/`exit`, end of input or cancellation. The session is shut down
    /// on every route out, including I/O errors. Cancellation is a normal
    /// exit and returns `Ok`.
    pub async fn run<R, W>(&mut self, input: R, mut output: W, cancel: &CancellationToken) -> SessionResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let result = self.chat_loop(input, &mut output, cancel).await;
        self.shutdown().await;

        match result {
            Err(SessionError::Cancelled) => {
                // Leave the terminal on a fresh line after the interrupted prompt
                let _ = output.write_all(b"\n").await;
                let _ = output.flush().await;
                Ok(())
            }
            other => other,
        }
    }

    async fn chat_loop<R, W>(&mut self, input: R, output: &mut W, cancel: &CancellationToken) -> SessionResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();

        loop {
            output.write_all(b"You: ").await?;
            output.flush().await?;

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = cancel.cancelled() => return Err(SessionError::Cancelled),
            };

            let Some(line) = line else {
                self.logger.info("[Session] End of input");
                return Ok(());
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
                self.logger.info("[Session] Exiting chat session");
                return Ok(());
            }

            let outcome = self.process_turn_cancellable(line, cancel).await?;
            output
                .write_all(format!("Assistant: {}\n", outcome.response).as_bytes())
                .await?;
            output.flush().await?;
        }
    }

    /// Clean up every provider; only the first call does any work
    pub async fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.state = SessionState::ShuttingDown;
        self.logger.info("[Session] Cleaning up servers...");

        self.registry.cleanup_all().await;

        self.state = SessionState::Closed;
    }

    async fn handle_turn(&self, input: &str) -> TurnOutcome {
        match self.decide(input).await {
            Err(fallback) => TurnOutcome::new(fallback, TurnKind::Fallback),
            Ok(Decision::DirectAnswer { text }) if text.is_empty() => {
                self.logger
                    .warn("[Session] Model gave neither a tool call nor a usable answer");
                TurnOutcome::new(EMPTY_ANSWER, TurnKind::Fallback)
            }
            Ok(Decision::DirectAnswer { text }) => {
                self.logger.info("[Session] Model provided a direct answer");
                TurnOutcome::new(text, TurnKind::DirectAnswer)
            }
            Ok(Decision::ToolInvocation { tool_name, arguments }) => {
                self.invoke_tool(input, tool_name, arguments).await
            }
        }
    }

    /// Ask the model what to do; `Err` carries the canned reply to use instead
    async fn decide(&self, input: &str) -> Result<Decision, &'static str> {
        let instructions = self.system_instructions.clone().unwrap_or_default();
        let messages = vec![ChatMessage::system(instructions), ChatMessage::user(input)];
        let options = GenerateOptions::new()
            .with_temperature(DECISION_TEMPERATURE)
            .json();

        self.logger.info("[Session] Requesting structured response from LLM...");
        let raw = self.llm.generate(messages, options).await.map_err(|err| {
            self.logger.error(&format!("[Session] Error during LLM processing: {}", err));
            LLM_FAILURE_ANSWER
        })?;

        self.parser.parse(&raw).map_err(|err| {
            self.logger
                .warn(&format!("[Session] LLM output did not conform to schema: {}", err));
            MALFORMED_DECISION_ANSWER
        })
    }

    async fn invoke_tool(&self, input: &str, tool: String, arguments: Map<String, Value>) -> TurnOutcome {
        self.logger.info(&format!(
            "[Session] LLM requested tool: {} with arguments: {}",
            tool,
            Value::Object(arguments.clone())
        ));

        let Some(provider) = self.registry.find_provider_for(&tool).await else {
            self.logger.warn(&format!("[Session] No server found with tool '{}'", tool));
            return TurnOutcome::new(
                format!("Error: No server found with tool '{}'.", tool),
                TurnKind::ToolNotFound { tool },
            );
        };

        match provider.execute_tool(&tool, arguments).await {
            Ok(output) => {
                let raw = output.to_text();
                self.logger.info(&format!("[Session] Tool '{}' returned: {}", tool, raw));

                let response = self.composer.compose_from_tool_result(&tool, &raw, input).await;
                TurnOutcome {
                    response,
                    kind: TurnKind::ToolResult {
                        provider: provider.name().to_string(),
                        tool,
                    },
                    progress: output.progress,
                }
            }
            Err(err) => {
                self.logger
                    .error(&format!("[Session] Error processing tool call {}: {}", tool, err));
                TurnOutcome::new(
                    format!("An error occurred while executing tool '{}': {}", tool, err),
                    TurnKind::ToolFailed { tool },
                )
            }
        }
    }
}

impl Drop for OrchestrationSession {
    fn drop(&mut self) {
        if !self.shut_down && self.state != SessionState::Idle {
            self.logger
                .warn("[Session] Dropped without shutdown(); provider connections were not closed");
        }
    }
}
