//! MCP protocol access
//!
//! `McpClient` owns one rmcp session, spawned as a child process speaking
//! stdio or opened over streamable HTTP. The conversion helpers translate
//! rmcp's tool listings and call results into the crate's own types, so
//! nothing above `tools::McpTransport` sees rmcp directly.
//!
//! ```rust,ignore
//! let client = McpClient::connect_stdio("uvx", &["mcp-server-time".into()], &BTreeMap::new(), logger).await?;
//! let catalog: Vec<ToolDescriptor> = client.list_tools().await?.iter().map(descriptor_from_mcp).collect();
//! client.close().await?;
//! ```

mod client;

pub use client::{descriptor_from_mcp, output_from_mcp, McpClient, McpError, McpResult};
