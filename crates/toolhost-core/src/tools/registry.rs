//! Registry of tool providers
//!
//! The ProviderRegistry is the central component for:
//! - Bringing every configured provider up (or none of them)
//! - Describing the aggregated tool catalog to the model
//! - Resolving a tool name to the provider that serves it
//! - Tearing every provider down

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::OnceCell;

use crate::config::{ConfigProvider, ServerConfig};
use crate::logging::Logger;

use super::connection::ProviderConnection;
use super::error::{ToolError, ToolResult};
use super::transport::{McpTransportFactory, TransportFactory};

/// Ordered collection of provider connections
pub struct ProviderRegistry {
    /// Providers in registration order
    providers: Vec<ProviderConnection>,
    /// Rendered catalog, built once
    description: OnceCell<String>,
    /// Logger
    logger: Arc<dyn Logger>,
}

impl ProviderRegistry {
    /// Create a registry over already-built connections
    pub fn new(providers: Vec<ProviderConnection>, logger: Arc<dyn Logger>) -> Self {
        Self {
            providers,
            description: OnceCell::new(),
            logger,
        }
    }

    /// Build one connection per config entry, all sharing `factory`
    pub fn from_configs(
        configs: Vec<ServerConfig>,
        factory: Arc<dyn TransportFactory>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let providers = configs
            .into_iter()
            .map(|config| ProviderConnection::new(config, Arc::clone(&factory), Arc::clone(&logger)))
            .collect();
        Self::new(providers, logger)
    }

    /// Build MCP-backed connections from a configuration source
    pub async fn from_config_provider(
        source: &dyn ConfigProvider,
        logger: Arc<dyn Logger>,
    ) -> ToolResult<Self> {
        let configs = source
            .get_servers()
            .await
            .map_err(|e| ToolError::connection("<config>", e.to_string()))?;

        logger.info(&format!("[ProviderRegistry] Loaded {} server config(s)", configs.len()));

        let factory = Arc::new(McpTransportFactory::new(Arc::clone(&logger)));
        Ok(Self::from_configs(configs, factory, logger))
    }

    pub fn providers(&self) -> &[ProviderConnection] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Initialize providers in order; on the first failure tear down
    /// everything started so far and return that failure
    pub async fn initialize_all(&self) -> ToolResult<()> {
        for (idx, provider) in self.providers.iter().enumerate() {
            if let Err(err) = provider.initialize().await {
                self.logger.error(&format!(
                    "[ProviderRegistry] Failed to initialize '{}': {}",
                    provider.name(),
                    err
                ));
                for started in &self.providers[..=idx] {
                    started.cleanup().await;
                }
                return Err(err);
            }
        }

        self.logger.info(&format!(
            "[ProviderRegistry] Initialized {} provider(s)",
            self.providers.len()
        ));
        Ok(())
    }

    /// Rendered description of every provider's tools
    ///
    /// Built on first use and reused afterwards. Providers whose catalog
    /// cannot be listed are left out.
    pub async fn describe_tools(&self) -> &str {
        self.description
            .get_or_init(|| async {
                let listings = join_all(self.providers.iter().map(|p| p.list_tools())).await;

                let mut rendered = Vec::new();
                for (provider, listing) in self.providers.iter().zip(listings) {
                    match listing {
                        Ok(tools) => rendered.extend(tools.iter().map(|t| t.render_for_prompt())),
                        Err(err) => self.logger.warn(&format!(
                            "[ProviderRegistry] Skipping tools of '{}': {}",
                            provider.name(),
                            err
                        )),
                    }
                }

                if rendered.is_empty() {
                    self.logger.warn("[ProviderRegistry] No tools available from any provider");
                }

                rendered.join("\n")
            })
            .await
    }

    /// First provider, in registration order, that advertises `tool`
    pub async fn find_provider_for(&self, tool: &str) -> Option<&ProviderConnection> {
        for provider in &self.providers {
            match provider.has_tool(tool).await {
                Ok(true) => return Some(provider),
                Ok(false) => {}
                Err(err) => self.logger.warn(&format!(
                    "[ProviderRegistry] Could not list tools of '{}': {}",
                    provider.name(),
                    err
                )),
            }
        }
        None
    }

    /// Number of tools across all providers that can currently be listed
    pub async fn tool_count(&self) -> usize {
        join_all(self.providers.iter().map(|p| p.list_tools()))
            .await
            .into_iter()
            .filter_map(Result::ok)
            .map(|tools| tools.len())
            .sum()
    }

    /// Clean up every provider, continuing past individual failures
    pub async fn cleanup_all(&self) {
        for provider in &self.providers {
            provider.cleanup().await;
        }
        self.logger.info("[ProviderRegistry] All providers cleaned up");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MemoryConfigProvider, TransportConfig};
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};
    use crate::tools::connection::ConnectionState;
    use crate::tools::fake::{FakeServer, FakeTransportFactory};

    fn config(name: &str) -> ServerConfig {
        ServerConfig::new(name, TransportConfig::stdio("fake", Vec::<String>::new()))
    }

    fn registry(servers: Vec<(&str, FakeServer)>, logger: Arc<dyn Logger>) -> ProviderRegistry {
        let factory = FakeTransportFactory::new();
        let configs = servers
            .into_iter()
            .map(|(name, server)| {
                factory.insert(name, server);
                config(name)
            })
            .collect();
        ProviderRegistry::from_configs(configs, Arc::new(factory), logger)
    }

    #[tokio::test]
    async fn test_describe_tools_in_registration_order() {
        let registry = registry(
            vec![
                ("slow", FakeServer::with_tool_names(&["alpha"]).with_list_delay(std::time::Duration::from_millis(20))),
                ("fast", FakeServer::with_tool_names(&["beta"])),
            ],
            Arc::new(NoOpLogger::new()),
        );
        registry.initialize_all().await.unwrap();

        let description = registry.describe_tools().await;
        let alpha = description.find("Tool: alpha").unwrap();
        let beta = description.find("Tool: beta").unwrap();
        assert!(alpha < beta);
        assert_eq!(registry.tool_count().await, 2);
    }

    #[tokio::test]
    async fn test_describe_tools_skips_failing_provider() {
        let logger = Arc::new(MemoryLogger::new());
        let registry = registry(
            vec![
                ("broken", FakeServer::with_tool_names(&["alpha"]).failing_lists(1)),
                ("ok", FakeServer::with_tool_names(&["beta"])),
            ],
            logger.clone(),
        );
        registry.initialize_all().await.unwrap();

        let description = registry.describe_tools().await;
        assert!(!description.contains("alpha"));
        assert!(description.contains("Tool: beta"));
        assert!(logger.contains(LogLevel::Warn, "broken"));
    }

    #[tokio::test]
    async fn test_empty_catalog_warns() {
        let logger = Arc::new(MemoryLogger::new());
        let registry = registry(vec![("empty", FakeServer::new(vec![]))], logger.clone());
        registry.initialize_all().await.unwrap();

        assert_eq!(registry.describe_tools().await, "");
        assert!(logger.contains(LogLevel::Warn, "No tools available"));
    }

    #[tokio::test]
    async fn test_find_provider_first_match_wins() {
        let registry = registry(
            vec![
                ("first", FakeServer::with_tool_names(&["shared", "one"])),
                ("second", FakeServer::with_tool_names(&["shared", "two"])),
            ],
            Arc::new(NoOpLogger::new()),
        );
        registry.initialize_all().await.unwrap();

        assert_eq!(registry.find_provider_for("shared").await.unwrap().name(), "first");
        assert_eq!(registry.find_provider_for("two").await.unwrap().name(), "second");
        assert!(registry.find_provider_for("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_from_config_provider() {
        let source = MemoryConfigProvider::with_servers(vec![config("a"), config("b")]);
        let registry = ProviderRegistry::from_config_provider(&source, Arc::new(NoOpLogger::new()))
            .await
            .unwrap();

        let names: Vec<&str> = registry.providers().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(registry
            .providers()
            .iter()
            .all(|p| p.state() == ConnectionState::Unconnected));
    }

    #[tokio::test]
    async fn test_cleanup_all_continues_past_close_errors() {
        let failing = FakeServer::echo().failing_close();
        let healthy = FakeServer::echo();
        let (failing_stats, healthy_stats) = (failing.stats(), healthy.stats());
        let registry = registry(vec![("a", failing), ("b", healthy)], Arc::new(NoOpLogger::new()));

        registry.initialize_all().await.unwrap();
        registry.cleanup_all().await;
        registry.cleanup_all().await;

        assert_eq!(failing_stats.closes(), 1);
        assert_eq!(healthy_stats.closes(), 1);
        assert!(registry
            .providers()
            .iter()
            .all(|p| p.state() == ConnectionState::Closed));
    }
}
