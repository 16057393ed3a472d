//! Toolhost Core
//!
//! Runtime-agnostic orchestration of LLM tool sessions.
//! This crate owns the connections to external MCP tool servers, describes
//! their tools to a language model, parses the model's decision, runs the
//! chosen tool with retries, and turns the result back into a reply.
//!
//! ## Tool Orchestration
//!
//! ```rust,ignore
//! use toolhost_core::{
//!     config::{FileConfigProvider, LlmSettings},
//!     llm::create_provider,
//!     session::OrchestrationSession,
//!     tools::ProviderRegistry,
//!     logging::TracingLogger,
//! };
//!
//! let logger = Arc::new(TracingLogger::new());
//! let registry = ProviderRegistry::from_config_provider(&FileConfigProvider::new("servers_config.json"), logger.clone()).await?;
//! let llm = create_provider(LlmSettings::from_env(), logger.clone())?;
//!
//! let mut session = OrchestrationSession::new(registry, llm, logger);
//! session.start().await?;
//! let outcome = session.process_turn("echo hello").await?;
//! println!("{}", outcome.response);
//! session.shutdown().await;
//! ```

pub mod types;
pub mod logging;
pub mod config;
pub mod mcp;
pub mod tools;
pub mod decision;
pub mod llm;
pub mod session;

pub use types::{
    ChatMessage, MessageRole,
    ToolDescriptor, ParameterSpec, ToolOutput, ToolProgress,
    CancellationToken,
};

pub use logging::{Logger, NoOpLogger, TracingLogger, MemoryLogger};

pub use config::{
    ConfigProvider, ConfigError, FileConfigProvider, MemoryConfigProvider,
    ServerConfig, TransportConfig, LlmSettings,
};

pub use tools::{
    ProviderConnection, ProviderRegistry, ConnectionState, RetryPolicy,
    ToolTransport, TransportFactory, ToolError, ToolResult,
};

pub use decision::{Decision, DecisionError, DecisionParser};

pub use llm::{LlmProvider, LlmError, GenaiProvider, MockProvider, GenerateOptions};

pub use session::{
    OrchestrationSession, ResponseComposer, SessionError, SessionState, TurnKind, TurnOutcome,
};

pub use mcp::{McpClient, McpError, McpResult};
