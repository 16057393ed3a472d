//! LLM connection settings

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Default LLM adapter
pub const DEFAULT_LLM_PROVIDER: &str = "ollama";
/// Default model name
pub const DEFAULT_LLM_MODEL: &str = "qwen3:0.6b";

/// Which LLM to talk to and how
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Provider id understood by `GenaiProvider` (ollama, openai, ...)
    pub provider: String,
    /// Model name as the provider expects it
    pub model: String,
    /// Custom API base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// API key, when the provider needs one
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: DEFAULT_LLM_PROVIDER.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            api_base: None,
            api_key: None,
        }
    }
}

impl LlmSettings {
    /// Read `LLM_PROVIDER`, `LLM_MODEL`, `LLM_API_BASE` and `LLM_API_KEY`
    /// from the process environment, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` over an explicit variable map
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            provider: non_empty("LLM_PROVIDER").unwrap_or(defaults.provider),
            model: non_empty("LLM_MODEL").unwrap_or(defaults.model),
            api_base: non_empty("LLM_API_BASE"),
            api_key: non_empty("LLM_API_KEY"),
        }
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API base URL
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = LlmSettings::from_vars(&HashMap::new());
        assert_eq!(settings, LlmSettings::default());
        assert_eq!(settings.provider, "ollama");
        assert_eq!(settings.model, "qwen3:0.6b");
    }

    #[test]
    fn test_vars_override_defaults() {
        let vars: HashMap<String, String> = [
            ("LLM_PROVIDER", "openai"),
            ("LLM_MODEL", "gpt-4o-mini"),
            ("LLM_API_KEY", "sk-test"),
            ("LLM_API_BASE", "  "),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let settings = LlmSettings::from_vars(&vars);
        assert_eq!(settings.provider, "openai");
        assert_eq!(settings.model, "gpt-4o-mini");
        assert_eq!(settings.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.api_base, None);
    }

    #[test]
    fn test_api_key_not_serialized() {
        let settings = LlmSettings::default().with_api_key("secret");
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("secret"));
    }
}
