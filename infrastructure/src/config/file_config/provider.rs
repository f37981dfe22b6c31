//! Provider configuration from TOML (`[provider]` section)

use serde::{Deserialize, Serialize};

/// Which LLM backend serves every completion of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible `/chat/completions` endpoint
    #[default]
    Openai,
    /// Offline client with canned responses, for dry runs
    Scripted,
}

/// Raw provider configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    pub kind: ProviderKind,
    /// Base URL of the API, without the `/chat/completions` suffix.
    pub base_url: String,
    /// Environment variable name for the API key (default: "OPENAI_API_KEY").
    pub api_key_env: String,
    /// Direct API key (not recommended, prefer `api_key_env`).
    pub api_key: Option<String>,
    /// Per-request HTTP timeout
    pub timeout_seconds: u64,
    pub max_tokens: Option<u32>,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            timeout_seconds: 120,
            max_tokens: None,
        }
    }
}

impl FileProviderConfig {
    /// The explicit key if set, otherwise the value of `api_key_env`.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_key_wins() {
        let config = FileProviderConfig {
            api_key: Some("sk-inline".into()),
            api_key_env: "AGORA_TEST_KEY_THAT_IS_NOT_SET".into(),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("sk-inline"));
    }

    #[test]
    fn test_missing_key_is_none() {
        let config = FileProviderConfig {
            api_key_env: "AGORA_TEST_KEY_THAT_IS_NOT_SET".into(),
            ..Default::default()
        };
        assert!(config.resolve_api_key().is_none());
    }
}
