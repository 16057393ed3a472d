//! Injected logging
//!
//! Library code never installs a global subscriber; it writes through the
//! `Logger` it was handed. The binary passes a `TracingLogger`.

mod memory;
mod noop;
mod traits;
mod tracing_logger;

pub use memory::{LogEntry, LogLevel, MemoryLogger};
pub use noop::NoOpLogger;
pub use traits::Logger;
pub use tracing_logger::TracingLogger;
