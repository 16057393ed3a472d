//! Configuration
//!
//! - `ConfigProvider`: source of tool server descriptors
//! - `MemoryConfigProvider`: In-memory for testing
//! - `FileConfigProvider`: JSON or YAML file
//! - `LlmSettings`: LLM endpoint settings read from the environment

mod traits;
mod memory;
mod file;
mod server;
mod settings;

pub use traits::{ConfigProvider, ConfigError, ConfigResult};
pub use memory::MemoryConfigProvider;
pub use file::{parse_servers, ConfigFormat, FileConfigProvider, DEFAULT_CONFIG_FILE};
pub use server::{ServerConfig, ServerEntry, ServersFile, TransportConfig};
pub use settings::{LlmSettings, DEFAULT_LLM_MODEL, DEFAULT_LLM_PROVIDER};
