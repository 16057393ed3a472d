//! Tool provider management
//!
//! This module owns the connections to external tool providers and the
//! registry that aggregates them for the model.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  ProviderRegistry                           │
//! │                                             │
//! │  - Initializes providers in order           │
//! │  - Describes the aggregated catalog         │
//! │  - Resolves tool name -> provider           │
//! └─────────────────────────────────────────────┘
//!           │ one per configured server
//!           ▼
//! ┌─────────────────────────────────────────────┐
//! │  ProviderConnection                         │
//! │                                             │
//! │  - Cached tools/list (single-flight)        │
//! │  - tools/call with fixed-delay retry        │
//! │  - Idempotent cleanup                       │
//! └─────────────────────────────────────────────┘
//!           │ ToolTransport
//!           ▼
//!   MCP server (stdio child process or HTTP)
//! ```

mod connection;
mod error;
pub mod fake;
mod registry;
mod retry;
mod transport;

pub use connection::{ConnectionState, ProviderConnection, DEFAULT_CONNECT_TIMEOUT};
pub use error::{ToolError, ToolResult};
pub use registry::ProviderRegistry;
pub use retry::{RetryPolicy, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
pub use transport::{McpTransport, McpTransportFactory, ToolTransport, TransportFactory};
