//! Tool server descriptors
//!
//! The on-disk format is the common `mcpServers` layout:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "echo":    { "command": "python", "args": ["servers/echo.py"], "env": {} },
//!     "weather": { "url": "http://127.0.0.1:9000/mcp" }
//!   }
//! }
//! ```
//!
//! Registration order is file order, which decides tool-name ties.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use super::traits::{ConfigError, ConfigResult};

/// How to reach a tool server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TransportConfig {
    /// Spawn a local process and speak JSON-RPC over its stdio
    Stdio {
        command: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
        /// Overrides merged onto the inherited environment
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        env: BTreeMap<String, String>,
    },
    /// Connect to a streamable HTTP endpoint
    Http { url: String },
}

impl TransportConfig {
    /// Process transport with arguments
    pub fn stdio(command: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        TransportConfig::Stdio {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: BTreeMap::new(),
        }
    }

    /// Network transport
    pub fn http(url: impl Into<String>) -> Self {
        TransportConfig::Http { url: url.into() }
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            TransportConfig::Stdio { .. } => "stdio",
            TransportConfig::Http { .. } => "http",
        }
    }
}

/// One configured tool server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    /// Server identity, used in logs and error messages
    pub name: String,
    /// Connection parameters
    #[serde(flatten)]
    pub transport: TransportConfig,
}

impl ServerConfig {
    pub fn new(name: impl Into<String>, transport: TransportConfig) -> Self {
        Self {
            name: name.into(),
            transport,
        }
    }
}

/// Raw entry as written in the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerEntry {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl ServerEntry {
    /// Validate the entry into a `ServerConfig`
    ///
    /// Exactly one of `command` or `url` must be present.
    pub fn into_config(self, name: &str) -> ConfigResult<ServerConfig> {
        let transport = match (self.command, self.url) {
            (Some(command), None) if !command.trim().is_empty() => TransportConfig::Stdio {
                command,
                args: self.args,
                env: self.env,
            },
            (None, Some(url)) if !url.trim().is_empty() => TransportConfig::Http { url },
            (Some(_), Some(_)) => {
                return Err(ConfigError::Invalid(format!(
                    "server '{}' sets both 'command' and 'url'",
                    name
                )))
            }
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "server '{}' needs either a 'command' or a 'url'",
                    name
                )))
            }
        };
        Ok(ServerConfig::new(name, transport))
    }
}

/// Top-level config file shape
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServersFile {
    /// Entries in file order
    #[serde(rename = "mcpServers", default, deserialize_with = "ordered_entries")]
    pub servers: Vec<(String, ServerEntry)>,
}

impl ServersFile {
    /// Validate every entry, preserving order and rejecting duplicate names
    pub fn into_configs(self) -> ConfigResult<Vec<ServerConfig>> {
        let mut configs: Vec<ServerConfig> = Vec::with_capacity(self.servers.len());
        for (name, entry) in self.servers {
            if configs.iter().any(|c| c.name == name) {
                return Err(ConfigError::Invalid(format!("duplicate server name '{}'", name)));
            }
            configs.push(entry.into_config(&name)?);
        }
        Ok(configs)
    }
}

/// Deserialize a map into a list of pairs without losing key order
fn ordered_entries<'de, D>(deserializer: D) -> Result<Vec<(String, ServerEntry)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedVisitor;

    impl<'de> Visitor<'de> for OrderedVisitor {
        type Value = Vec<(String, ServerEntry)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of server name to server entry")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, entry)) = map.next_entry::<String, ServerEntry>()? {
                entries.push((name, entry));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(OrderedVisitor)
}
