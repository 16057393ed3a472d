//! Tool provider transport contract
//!
//! A `TransportFactory` performs the connect + handshake step and hands back
//! a live `ToolTransport`. `ProviderConnection` only talks to these traits, so
//! process and network servers (and test fakes) are interchangeable.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::config::TransportConfig;
use crate::logging::Logger;
use crate::mcp::{descriptor_from_mcp, output_from_mcp, McpClient};
use crate::types::{ToolDescriptor, ToolOutput};

use super::error::{ToolError, ToolResult};

/// An established connection to one tool provider
#[async_trait]
pub trait ToolTransport: Send + Sync {
    /// Fetch the provider's tool catalog
    async fn list_tools(&self) -> ToolResult<Vec<ToolDescriptor>>;

    /// Invoke a tool
    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> ToolResult<ToolOutput>;

    /// Release the connection and everything it owns
    async fn close(&self) -> ToolResult<()>;
}

/// Establishes transports from configuration
#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// Connect and complete the provider handshake
    async fn connect(&self, server: &str, config: &TransportConfig) -> ToolResult<Arc<dyn ToolTransport>>;
}

/// Transport backed by an rmcp client
pub struct McpTransport {
    client: RwLock<Option<McpClient>>,
}

impl McpTransport {
    pub fn new(client: McpClient) -> Self {
        Self {
            client: RwLock::new(Some(client)),
        }
    }
}

#[async_trait]
impl ToolTransport for McpTransport {
    async fn list_tools(&self) -> ToolResult<Vec<ToolDescriptor>> {
        let guard = self.client.read().await;
        let client = guard
            .as_ref()
            .ok_or_else(|| ToolError::Transport("connection closed".to_string()))?;
        let tools = client.list_tools().await?;
        Ok(tools.iter().map(descriptor_from_mcp).collect())
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> ToolResult<ToolOutput> {
        let guard = self.client.read().await;
        let client = guard
            .as_ref()
            .ok_or_else(|| ToolError::Transport("connection closed".to_string()))?;
        let result = client.call_tool(name, arguments).await?;
        Ok(output_from_mcp(result))
    }

    async fn close(&self) -> ToolResult<()> {
        let client = self.client.write().await.take();
        match client {
            Some(client) => Ok(client.close().await?),
            None => Ok(()),
        }
    }
}

/// Factory that picks stdio or HTTP from the `TransportConfig` variant
pub struct McpTransportFactory {
    logger: Arc<dyn Logger>,
}

impl McpTransportFactory {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl TransportFactory for McpTransportFactory {
    async fn connect(&self, server: &str, config: &TransportConfig) -> ToolResult<Arc<dyn ToolTransport>> {
        let logger = Arc::clone(&self.logger);
        let client = match config {
            TransportConfig::Stdio { command, args, env } => {
                McpClient::connect_stdio(command, args, env, logger).await
            }
            TransportConfig::Http { url } => McpClient::connect_http(url, logger).await,
        }
        .map_err(|e| ToolError::connection(server, e.to_string()))?;

        Ok(Arc::new(McpTransport::new(client)))
    }
}
