//! Connection to a single tool provider
//!
//! A `ProviderConnection` owns one transport for its whole lifetime:
//!
//! ```text
//! Unconnected --initialize()--> Connected --cleanup()--> Closed
//!      |                                                   ^
//!      +------------- initialize() failure ----------------+
//! ```
//!
//! The tool catalog is fetched at most once per connected lifetime.
//! `cleanup()` drops the cache, so a reconnect lists again.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, OnceCell};

use crate::config::{ServerConfig, TransportConfig};
use crate::logging::Logger;
use crate::types::{ToolDescriptor, ToolOutput};

use super::error::{ToolError, ToolResult};
use super::retry::RetryPolicy;
use super::transport::{McpTransportFactory, ToolTransport, TransportFactory};

/// Default bound on connect + handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Lifecycle state of a provider connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unconnected,
    Connected,
    Closed,
}

type ToolCache = Arc<OnceCell<Arc<[ToolDescriptor]>>>;

/// A live (or not yet live) connection to one tool provider
pub struct ProviderConnection {
    name: String,
    config: TransportConfig,
    factory: Arc<dyn TransportFactory>,
    retry: RetryPolicy,
    connect_timeout: Duration,
    state: RwLock<ConnectionState>,
    transport: RwLock<Option<Arc<dyn ToolTransport>>>,
    tools: RwLock<ToolCache>,
    /// Serializes initialize and cleanup
    lifecycle: Mutex<()>,
    logger: Arc<dyn Logger>,
}

impl ProviderConnection {
    /// Create a connection that will use `factory` to reach the provider
    pub fn new(config: ServerConfig, factory: Arc<dyn TransportFactory>, logger: Arc<dyn Logger>) -> Self {
        Self {
            name: config.name,
            config: config.transport,
            factory,
            retry: RetryPolicy::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            state: RwLock::new(ConnectionState::Unconnected),
            transport: RwLock::new(None),
            tools: RwLock::new(Arc::new(OnceCell::new())),
            lifecycle: Mutex::new(()),
            logger,
        }
    }

    /// Create a connection backed by the MCP transports
    pub fn mcp(config: ServerConfig, logger: Arc<dyn Logger>) -> Self {
        let factory = Arc::new(McpTransportFactory::new(Arc::clone(&logger)));
        Self::new(config, factory, logger)
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transport_config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// The catalog, if it has been fetched on the current connection
    pub fn cached_tools(&self) -> Option<Arc<[ToolDescriptor]>> {
        self.tools.read().get().cloned()
    }

    /// Connect and complete the handshake
    ///
    /// A no-op when already connected. On failure the connection cleans up
    /// after itself before returning `ToolError::Connection`.
    pub async fn initialize(&self) -> ToolResult<()> {
        let guard = self.lifecycle.lock().await;
        if self.is_connected() {
            return Ok(());
        }

        self.logger.info(&format!(
            "[{}] Connecting ({} transport)",
            self.name,
            self.config.kind()
        ));

        let connect = self.factory.connect(&self.name, &self.config);
        let outcome = match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(transport)) => Ok(transport),
            Ok(Err(err @ ToolError::Connection { .. })) => Err(err),
            Ok(Err(other)) => Err(ToolError::connection(&self.name, other.to_string())),
            Err(_) => Err(ToolError::connection(
                &self.name,
                ToolError::Timeout(self.connect_timeout).to_string(),
            )),
        };

        match outcome {
            Ok(transport) => {
                *self.transport.write() = Some(transport);
                *self.state.write() = ConnectionState::Connected;
                self.logger.info(&format!("[{}] Connected", self.name));
                Ok(())
            }
            Err(err) => {
                self.logger.error(&format!("[{}] Initialization failed: {}", self.name, err));
                drop(guard);
                self.cleanup().await;
                Err(err)
            }
        }
    }

    /// List the provider's tools, fetching them on first use
    ///
    /// Concurrent first callers share a single catalog request. A failed
    /// request leaves the cache empty so the next call tries again.
    pub async fn list_tools(&self) -> ToolResult<Arc<[ToolDescriptor]>> {
        let transport = self.live_transport()?;
        let cache = Arc::clone(&*self.tools.read());

        let tools = cache
            .get_or_try_init(|| async {
                let tools = transport.list_tools().await?;
                self.logger.debug(&format!("[{}] Listed {} tools", self.name, tools.len()));
                Ok::<Arc<[ToolDescriptor]>, ToolError>(tools.into())
            })
            .await?;

        Ok(Arc::clone(tools))
    }

    /// Whether this provider advertises `tool`
    pub async fn has_tool(&self, tool: &str) -> ToolResult<bool> {
        Ok(self.list_tools().await?.iter().any(|t| t.name == tool))
    }

    /// Execute a tool with the connection's retry policy
    pub async fn execute_tool(&self, tool: &str, arguments: Map<String, Value>) -> ToolResult<ToolOutput> {
        self.execute_tool_with(tool, arguments, self.retry).await
    }

    /// Execute a tool with an explicit retry policy
    ///
    /// A result flagged `is_error` by the provider is still a successful call
    /// and is returned as-is.
    pub async fn execute_tool_with(
        &self,
        tool: &str,
        arguments: Map<String, Value>,
        policy: RetryPolicy,
    ) -> ToolResult<ToolOutput> {
        let transport = self.live_transport()?;
        let total = policy.total_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.logger.info(&format!(
                "[{}] Executing {} (attempt {}/{})",
                self.name, tool, attempt, total
            ));

            match transport.call_tool(tool, arguments.clone()).await {
                Ok(output) => {
                    self.report_progress(tool, &output);
                    return Ok(output);
                }
                Err(err) if attempt < total => {
                    self.logger.warn(&format!(
                        "[{}] Error executing {}: {}. Attempt {} of {}. Retrying in {:?}",
                        self.name, tool, err, attempt, total, policy.delay
                    ));
                    tokio::time::sleep(policy.delay).await;
                }
                Err(err) => {
                    self.logger.error(&format!(
                        "[{}] Giving up on {} after {} attempt(s): {}",
                        self.name, tool, attempt, err
                    ));
                    return Err(ToolError::Execution {
                        tool: tool.to_string(),
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
            }
        }
    }

    /// Close the transport; safe to call any number of times
    pub async fn cleanup(&self) {
        let _guard = self.lifecycle.lock().await;

        let transport = self.transport.write().take();
        if let Some(transport) = transport {
            match transport.close().await {
                Ok(()) => self.logger.info(&format!("[{}] Closed", self.name)),
                Err(err) => self
                    .logger
                    .warn(&format!("[{}] Error during cleanup: {}", self.name, err)),
            }
        }

        *self.tools.write() = Arc::new(OnceCell::new());
        *self.state.write() = ConnectionState::Closed;
    }

    fn live_transport(&self) -> ToolResult<Arc<dyn ToolTransport>> {
        if !self.is_connected() {
            return Err(ToolError::NotInitialized(self.name.clone()));
        }
        self.transport
            .read()
            .clone()
            .ok_or_else(|| ToolError::NotInitialized(self.name.clone()))
    }

    fn report_progress(&self, tool: &str, output: &ToolOutput) {
        let Some(progress) = output.progress else {
            return;
        };
        match progress.percentage() {
            Some(pct) => self.logger.info(&format!(
                "[{}] {} progress: {}/{} ({:.1}%)",
                self.name, tool, progress.progress, progress.total, pct
            )),
            None => self.logger.warn(&format!(
                "[{}] Could not compute progress for {}: total is {}",
                self.name, tool, progress.total
            )),
        }
    }
}

impl std::fmt::Debug for ProviderConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConnection")
            .field("name", &self.name)
            .field("transport", &self.config.kind())
            .field("state", &self.state())
            .finish()
    }
}
