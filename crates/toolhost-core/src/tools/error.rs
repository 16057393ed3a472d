//! Tool provider error types

use thiserror::Error;

use crate::mcp::McpError;

/// Errors raised by provider connections and the registry
#[derive(Error, Debug)]
pub enum ToolError {
    /// Transport could not be established or the handshake failed
    #[error("Failed to connect to server '{server}': {message}")]
    Connection { server: String, message: String },

    /// Operation attempted before `initialize()` succeeded
    #[error("Server '{0}' is not initialized")]
    NotInitialized(String),

    /// Retry budget exhausted; wraps the last underlying failure
    #[error("Tool '{tool}' failed after {attempts} attempt(s): {source}")]
    Execution {
        tool: String,
        attempts: u32,
        #[source]
        source: Box<ToolError>,
    },

    /// A single request on an established transport failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Handshake or request exceeded its deadline
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl ToolError {
    /// Create a connection error
    pub fn connection(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            server: server.into(),
            message: message.into(),
        }
    }

    /// Whether this is the terminal error of a retried tool call
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution { .. })
    }
}

impl From<McpError> for ToolError {
    fn from(err: McpError) -> Self {
        ToolError::Transport(err.to_string())
    }
}

pub type ToolResult<T> = Result<T, ToolError>;
