//! File-based configuration provider (JSON or YAML)
//!
//! The format is picked from the extension: `.yaml`/`.yml` are read with
//! serde_yaml, anything else as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::server::{ServerConfig, ServersFile};
use super::traits::{ConfigError, ConfigProvider, ConfigResult};

/// Default config file name
pub const DEFAULT_CONFIG_FILE: &str = "servers_config.json";

/// File format of a config file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Guess the format from a path's extension
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Json,
        }
    }
}

/// File-based configuration provider
///
/// # Example
///
/// ```no_run
/// use toolhost_core::config::FileConfigProvider;
///
/// let config = FileConfigProvider::new("servers_config.json");
/// let user_config = FileConfigProvider::user();
/// ```
#[derive(Debug, Clone)]
pub struct FileConfigProvider {
    path: PathBuf,
}

impl FileConfigProvider {
    /// Create a provider for a specific path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// User-level config (`~/.config/toolhost/servers_config.json`)
    pub fn user() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        Self::new(config_dir.join("toolhost").join(DEFAULT_CONFIG_FILE))
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the config file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read and validate the file
    pub fn load(&self) -> ConfigResult<Vec<ServerConfig>> {
        if !self.path.exists() {
            return Err(ConfigError::NotFound(self.path.display().to_string()));
        }

        let content = fs::read_to_string(&self.path)?;
        parse_servers(&content, ConfigFormat::from_path(&self.path))
    }
}

/// Parse config text in the given format
pub fn parse_servers(content: &str, format: ConfigFormat) -> ConfigResult<Vec<ServerConfig>> {
    let file: ServersFile = match format {
        ConfigFormat::Json => serde_json::from_str(content)?,
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
    };
    file.into_configs()
}

#[async_trait]
impl ConfigProvider for FileConfigProvider {
    async fn get_servers(&self) -> ConfigResult<Vec<ServerConfig>> {
        self.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportConfig;
    use std::io::Write;

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("a.YAML")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.yml")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("servers")), ConfigFormat::Json);
    }

    #[tokio::test]
    async fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"mcpServers": {{"echo": {{"command": "python", "args": ["echo.py"]}}}}}}"#
        )
        .unwrap();

        let provider = FileConfigProvider::new(file.path());
        let servers = provider.get_servers().await.unwrap();

        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].transport, TransportConfig::stdio("python", ["echo.py"]));
    }

    #[tokio::test]
    async fn test_load_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "mcpServers:").unwrap();
        writeln!(file, "  http:").unwrap();
        writeln!(file, "    url: http://127.0.0.1:9000/mcp").unwrap();
        writeln!(file, "  echo:").unwrap();
        writeln!(file, "    command: python").unwrap();

        let servers = FileConfigProvider::new(file.path()).get_servers().await.unwrap();
        let names: Vec<&str> = servers.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["http", "echo"]);
    }

    #[test]
    fn test_missing_file() {
        let provider = FileConfigProvider::new("/nonexistent/toolhost/servers.json");
        assert!(!provider.exists());
        assert!(matches!(provider.load(), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            parse_servers("{ not json", ConfigFormat::Json),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_user_path() {
        let provider = FileConfigProvider::user();
        assert!(provider.path().ends_with("toolhost/servers_config.json"));
    }
}
