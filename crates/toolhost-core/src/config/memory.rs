//! In-memory configuration provider

use async_trait::async_trait;
use parking_lot::RwLock;

use super::server::ServerConfig;
use super::traits::{ConfigProvider, ConfigResult};

/// In-memory configuration provider for testing
#[derive(Debug, Default)]
pub struct MemoryConfigProvider {
    servers: RwLock<Vec<ServerConfig>>,
}

impl MemoryConfigProvider {
    /// Create a new empty memory config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory config provider with initial servers
    pub fn with_servers(servers: Vec<ServerConfig>) -> Self {
        Self {
            servers: RwLock::new(servers),
        }
    }

    /// Append a server at the end of the registration order
    pub fn push(&self, server: ServerConfig) {
        self.servers.write().push(server);
    }

    /// Clear all servers
    pub fn clear(&self) {
        self.servers.write().clear();
    }
}

#[async_trait]
impl ConfigProvider for MemoryConfigProvider {
    async fn get_servers(&self) -> ConfigResult<Vec<ServerConfig>> {
        Ok(self.servers.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportConfig;

    #[tokio::test]
    async fn test_memory_config_provider() {
        let config = MemoryConfigProvider::new();
        assert!(config.get_servers().await.unwrap().is_empty());

        config.push(ServerConfig::new("echo", TransportConfig::stdio("python", ["echo.py"])));
        config.push(ServerConfig::new("http", TransportConfig::http("http://127.0.0.1:9000/mcp")));

        let servers = config.get_servers().await.unwrap();
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0].name, "echo");

        config.clear();
        assert!(config.get_servers().await.unwrap().is_empty());
    }
}
