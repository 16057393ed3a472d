//! rmcp-backed client for a single tool server

use std::collections::BTreeMap;
use std::sync::Arc;

use rmcp::{
    ServiceExt,
    model::{
        CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo, Implementation,
        RawContent, Tool,
    },
    service::RunningService,
    transport::{ConfigureCommandExt, StreamableHttpClientTransport, TokioChildProcess},
    RoleClient,
};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::process::Command;

use crate::logging::Logger;
use crate::types::{ToolDescriptor, ToolOutput, ToolProgress};

/// Failures talking to an MCP server
#[derive(Error, Debug)]
pub enum McpError {
    /// The server process could not be started
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The transport came up but the MCP handshake did not complete
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// A request on an established session failed
    #[error("{method} failed: {message}")]
    Request { method: &'static str, message: String },
}

impl McpError {
    fn request(method: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Request {
            method,
            message: err.to_string(),
        }
    }
}

pub type McpResult<T> = Result<T, McpError>;

/// MCP client for one tool server
pub struct McpClient {
    /// The underlying rmcp running service
    client: RunningService<RoleClient, ClientInfo>,
    /// Logger
    logger: Arc<dyn Logger>,
}

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "toolhost".to_string(),
            title: Some("Toolhost".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

impl McpClient {
    /// Spawn a server process and connect over its stdin/stdout
    ///
    /// `command` is resolved through `PATH`; `env` entries are layered on top
    /// of the inherited environment.
    pub async fn connect_stdio(
        command: &str,
        args: &[String],
        env: &BTreeMap<String, String>,
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        logger.info(&format!(
            "[McpClient] Spawning stdio server: {} {}",
            command,
            args.join(" ")
        ));

        let transport = TokioChildProcess::new(Command::new(command).configure(|cmd| {
            cmd.args(args).envs(env);
        }))
        .map_err(|source| McpError::Spawn {
            command: command.to_string(),
            source,
        })?;

        let client = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::Handshake(e.to_string()))?;

        logger.info("[McpClient] Connected and initialized successfully");

        Ok(Self { client, logger })
    }

    /// Connect to an MCP server over HTTP (Streamable HTTP transport)
    pub async fn connect_http(url: &str, logger: Arc<dyn Logger>) -> McpResult<Self> {
        logger.info(&format!("[McpClient] Connecting to HTTP: {}", url));

        let transport = StreamableHttpClientTransport::from_uri(url);

        let client = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::Handshake(e.to_string()))?;

        logger.info("[McpClient] Connected and initialized successfully");

        Ok(Self { client, logger })
    }

    /// List all available tools
    pub async fn list_tools(&self) -> McpResult<Vec<Tool>> {
        let result = self
            .client
            .list_tools(Default::default())
            .await
            .map_err(|e| McpError::request("tools/list", e))?;

        self.logger.info(&format!(
            "[McpClient] Listed {} tools",
            result.tools.len()
        ));

        Ok(result.tools)
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> McpResult<CallToolResult> {
        self.logger.debug(&format!("[McpClient] Calling tool: {}", name));

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: Some(arguments),
            task: None,
        };

        self.client
            .call_tool(params)
            .await
            .map_err(|e| McpError::request("tools/call", e))
    }

    /// Close the connection; for stdio servers this also reaps the child
    pub async fn close(self) -> McpResult<()> {
        self.logger.info("[McpClient] Closing connection");
        self.client
            .cancel()
            .await
            .map_err(|e| McpError::request("shutdown", e))?;
        Ok(())
    }
}

/// Convert an rmcp tool into our catalog descriptor
pub fn descriptor_from_mcp(tool: &Tool) -> ToolDescriptor {
    let schema = Value::Object(tool.input_schema.as_ref().clone());
    ToolDescriptor::from_schema(
        tool.name.to_string(),
        tool.description.as_deref().unwrap_or_default().to_string(),
        schema,
    )
}

/// Convert an rmcp call result into a raw tool output
///
/// Only text content is kept. Progress is read from the structured payload,
/// then from `_meta` when the payload carries none.
pub fn output_from_mcp(result: CallToolResult) -> ToolOutput {
    let content = result
        .content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.clone()),
            _ => None,
        })
        .collect();

    let mut output = ToolOutput::from_parts(
        content,
        result.is_error.unwrap_or(false),
        result.structured_content,
    );
    if output.progress.is_none() {
        output.progress = result
            .meta
            .map(|meta| Value::Object(meta.0))
            .as_ref()
            .and_then(ToolProgress::from_value);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use rmcp::model::{Content, Meta};
    use serde_json::json;

    fn rmcp_tool(schema: Value) -> Tool {
        let Value::Object(object) = schema else {
            panic!("schema must be an object");
        };
        Tool::new("echo", "A simple echo tool", Arc::new(object))
    }

    #[test]
    fn test_descriptor_from_mcp() {
        let tool = rmcp_tool(json!({
            "type": "object",
            "properties": { "message": { "type": "string", "title": "Message" } },
            "required": ["message"]
        }));

        let descriptor = descriptor_from_mcp(&tool);
        assert_eq!(descriptor.name, "echo");
        assert_eq!(descriptor.description, "A simple echo tool");
        assert_eq!(descriptor.parameters.len(), 1);
        assert!(descriptor.parameters[0].required);
    }

    #[test]
    fn test_progress_from_meta() {
        let mut result = CallToolResult::success(vec![Content::text("working")]);
        result.meta = Some(Meta(json!({ "progress": 1, "total": 4 }).as_object().cloned().unwrap()));

        let output = output_from_mcp(result);
        assert_eq!(output.to_text(), "working");
        assert_eq!(output.progress, Some(ToolProgress { progress: 1.0, total: 4.0 }));
        assert_eq!(output.progress.and_then(|p| p.percentage()), Some(25.0));
    }

    #[test]
    fn test_structured_progress_wins_over_meta() {
        let mut result = CallToolResult::success(vec![Content::text("working")]);
        result.structured_content = Some(json!({ "progress": 3, "total": 4 }));
        result.meta = Some(Meta(json!({ "progress": 1, "total": 4 }).as_object().cloned().unwrap()));

        let output = output_from_mcp(result);
        assert_eq!(output.progress, Some(ToolProgress { progress: 3.0, total: 4.0 }));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_connection_error() {
        let result = McpClient::connect_stdio(
            "toolhost-definitely-not-a-real-binary",
            &[],
            &BTreeMap::new(),
            Arc::new(NoOpLogger::new()),
        )
        .await;

        assert!(matches!(result, Err(McpError::Spawn { .. })));
    }
}
