//! In-process fake tool providers for testing
//!
//! `FakeTransportFactory` maps server names to `FakeServer` scripts. Each
//! server counts what was asked of it through a shared `FakeStats`, which
//! survives reconnects.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};

use crate::config::TransportConfig;
use crate::types::{ToolDescriptor, ToolOutput};

use super::error::{ToolError, ToolResult};
use super::transport::{ToolTransport, TransportFactory};

/// Handler invoked for every successful `call_tool`
pub type ToolHandler = Arc<dyn Fn(&str, &Map<String, Value>) -> ToolResult<ToolOutput> + Send + Sync>;

/// Counters shared by every transport of one fake server
#[derive(Debug, Default)]
pub struct FakeStats {
    connects: AtomicUsize,
    list_calls: AtomicUsize,
    call_calls: AtomicUsize,
    closes: AtomicUsize,
}

impl FakeStats {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn call_calls(&self) -> usize {
        self.call_calls.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Scripted behaviour of one fake tool provider
#[derive(Clone)]
pub struct FakeServer {
    tools: Vec<ToolDescriptor>,
    fail_connect: bool,
    connect_delay: Duration,
    list_delay: Duration,
    call_delay: Duration,
    list_failures: Arc<AtomicU32>,
    call_failures: Arc<AtomicU32>,
    fail_close: bool,
    handler: ToolHandler,
    stats: Arc<FakeStats>,
}

impl FakeServer {
    /// A server exposing `tools`; every call answers with the tool name
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self {
            tools,
            fail_connect: false,
            connect_delay: Duration::ZERO,
            list_delay: Duration::ZERO,
            call_delay: Duration::ZERO,
            list_failures: Arc::new(AtomicU32::new(0)),
            call_failures: Arc::new(AtomicU32::new(0)),
            fail_close: false,
            handler: Arc::new(|name: &str, _: &Map<String, Value>| {
                Ok(ToolOutput::text(format!("{} done", name)))
            }),
            stats: Arc::new(FakeStats::default()),
        }
    }

    /// A server with a single `echo` tool answering `Echo: <message>`
    pub fn echo() -> Self {
        let echo = ToolDescriptor::from_schema(
            "echo",
            "A simple echo tool",
            json!({
                "type": "object",
                "properties": {
                    "message": { "type": "string", "description": "Text to echo back" }
                },
                "required": ["message"]
            }),
        );

        Self::new(vec![echo]).with_handler(|_, arguments| {
            let message = arguments
                .get("message")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::Transport("missing 'message' argument".to_string()))?;
            Ok(ToolOutput::text(format!("Echo: {}", message)))
        })
    }

    /// A server whose tools have the given names and no parameters
    pub fn with_tool_names(names: &[&str]) -> Self {
        Self::new(
            names
                .iter()
                .map(|name| ToolDescriptor::new(*name, format!("The {} tool", name)))
                .collect(),
        )
    }

    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, &Map<String, Value>) -> ToolResult<ToolOutput> + Send + Sync + 'static,
    {
        self.handler = Arc::new(handler);
        self
    }

    /// Refuse every connection attempt
    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = delay;
        self
    }

    pub fn with_call_delay(mut self, delay: Duration) -> Self {
        self.call_delay = delay;
        self
    }

    /// Fail the next `count` catalog requests
    pub fn failing_lists(self, count: u32) -> Self {
        self.list_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Fail the next `count` tool calls (`u32::MAX` for always)
    pub fn failing_calls(self, count: u32) -> Self {
        self.call_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Report an error from `close`
    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn stats(&self) -> Arc<FakeStats> {
        Arc::clone(&self.stats)
    }
}

/// Take one failure from `budget`, if any remain
fn consume(budget: &AtomicU32) -> bool {
    budget
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
            0 => None,
            u32::MAX => Some(u32::MAX),
            n => Some(n - 1),
        })
        .is_ok()
}

struct FakeTransport {
    server: FakeServer,
}

#[async_trait]
impl ToolTransport for FakeTransport {
    async fn list_tools(&self) -> ToolResult<Vec<ToolDescriptor>> {
        self.server.stats.list_calls.fetch_add(1, Ordering::SeqCst);
        if !self.server.list_delay.is_zero() {
            tokio::time::sleep(self.server.list_delay).await;
        }
        if consume(&self.server.list_failures) {
            return Err(ToolError::Transport("tools/list failed".to_string()));
        }
        Ok(self.server.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> ToolResult<ToolOutput> {
        self.server.stats.call_calls.fetch_add(1, Ordering::SeqCst);
        if !self.server.call_delay.is_zero() {
            tokio::time::sleep(self.server.call_delay).await;
        }
        if consume(&self.server.call_failures) {
            return Err(ToolError::Transport(format!("{} failed", name)));
        }
        (self.server.handler)(name, &arguments)
    }

    async fn close(&self) -> ToolResult<()> {
        self.server.stats.closes.fetch_add(1, Ordering::SeqCst);
        if self.server.fail_close {
            return Err(ToolError::Transport("close failed".to_string()));
        }
        Ok(())
    }
}

/// Factory resolving server names to fake servers
#[derive(Default)]
pub struct FakeTransportFactory {
    servers: Mutex<HashMap<String, FakeServer>>,
    connect_log: Mutex<Vec<String>>,
}

impl FakeTransportFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server(self, name: impl Into<String>, server: FakeServer) -> Self {
        self.insert(name, server);
        self
    }

    pub fn insert(&self, name: impl Into<String>, server: FakeServer) {
        self.servers.lock().insert(name.into(), server);
    }

    /// Server names in the order connections were attempted
    pub fn connect_log(&self) -> Vec<String> {
        self.connect_log.lock().clone()
    }
}

#[async_trait]
impl TransportFactory for FakeTransportFactory {
    async fn connect(&self, server: &str, _config: &TransportConfig) -> ToolResult<Arc<dyn ToolTransport>> {
        self.connect_log.lock().push(server.to_string());

        let fake = self
            .servers
            .lock()
            .get(server)
            .cloned()
            .ok_or_else(|| ToolError::connection(server, "no such fake server"))?;

        fake.stats.connects.fetch_add(1, Ordering::SeqCst);
        if !fake.connect_delay.is_zero() {
            tokio::time::sleep(fake.connect_delay).await;
        }
        if fake.fail_connect {
            return Err(ToolError::connection(server, "connection refused"));
        }

        Ok(Arc::new(FakeTransport { server: fake }))
    }
}
