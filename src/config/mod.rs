//! Configuration management.
//!
//! Two process-wide settings drive every outbound call: the BugBacon API base
//! URL and an optional API key. Both are read once at startup (TOML file
//! and/or `BUGBACON_*` environment variables) and injected into the
//! components that need them; nothing reads the environment afterwards.
//!
//! # Configuration File Format
//!
//! ```toml
//! api_base_url = "https://api.bugbacon.io/v1"
//! api_key = "your-api-key"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default public BugBacon API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.bugbacon.io/v1";

/// Application configuration, immutable after startup.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the BugBacon REST API
    #[serde(default = "default_api_base")]
    pub api_base_url: String,

    /// API key for bearer authentication (optional; unauthenticated when absent)
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Config {
    /// Whether an API key is configured. This is the only key-related fact
    /// that may appear in logs or error text.
    pub fn key_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Validate the configured base URL: must parse and use http(s).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let parsed = url::Url::parse(&self.api_base_url)
            .map_err(|e| ConfigError::InvalidBaseUrl(e.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ConfigError::InvalidBaseUrl(format!(
                "unsupported scheme: {}",
                other
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: std::env::var("BUGBACON_API_BASE_URL")
                .unwrap_or_else(|_| default_api_base()),
            api_key: std::env::var("BUGBACON_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
        }
    }
}

// The key must never leak through debug logging of the config.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_base_url", &"<configured>")
            .field("api_key_configured", &self.key_configured())
            .finish()
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Load configuration from a file, with `BUGBACON_*` environment overrides.
pub fn load_config(path: &PathBuf) -> Result<Config, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path.as_path()))
        .add_source(config::Environment::with_prefix("BUGBACON"))
        .build()?;

    let cfg: Config = settings.try_deserialize()?;
    cfg.validate()?;
    Ok(cfg)
}

/// Look for a configuration file in conventional locations.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("bugbacon-mcp.toml");
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|d| d.join("bugbacon-mcp").join("config.toml"))
        .filter(|p| p.is_file())
}

/// Get the default configuration (from env vars or defaults).
pub fn get_config() -> Config {
    Config::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        let config = Config {
            api_base_url: default_api_base(),
            api_key: None,
        };
        assert_eq!(config.api_base_url, DEFAULT_API_BASE);
        assert!(!config.key_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_key_counts_as_unconfigured() {
        let config = Config {
            api_base_url: default_api_base(),
            api_key: Some(String::new()),
        };
        assert!(!config.key_configured());
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let config = Config {
            api_base_url: "file:///etc/passwd".to_string(),
            api_key: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_configuration() {
        let config = Config {
            api_base_url: "https://internal.example.com/v1".to_string(),
            api_key: Some("secret-key".to_string()),
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("internal.example.com"));
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("api_key_configured: true"));
    }
}
