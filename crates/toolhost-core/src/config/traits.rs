//! Configuration provider trait

use async_trait::async_trait;

use super::server::ServerConfig;

/// Source of tool server descriptors
///
/// Implementations:
/// - `MemoryConfigProvider`: In-memory for testing
/// - `FileConfigProvider`: JSON or YAML file (`mcpServers` layout)
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// All configured servers, in registration order
    async fn get_servers(&self) -> ConfigResult<Vec<ServerConfig>>;
}

/// Errors that can occur while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
