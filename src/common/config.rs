//! Configuration file handling

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Environment variable overriding the keyless API host
pub const API_HOST_ENV: &str = "EMBEDLY_API_HOST";

/// Environment variable overriding the Pro API host
pub const PRO_HOST_ENV: &str = "EMBEDLY_PRO_HOST";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Embedly API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,
}

/// Embedly API settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Host used when no key is given
    #[serde(default = "default_api_host")]
    pub host: String,

    /// Host used when a key is given
    #[serde(default = "default_pro_host")]
    pub pro_host: String,

    /// Environment variable holding the API key
    #[serde(default = "default_key_env")]
    pub key_env: String,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            pro_host: default_pro_host(),
            key_env: default_key_env(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_api_host() -> String {
    crate::api::API_HOST.to_string()
}
fn default_pro_host() -> String {
    crate::api::PRO_HOST.to_string()
}
fn default_key_env() -> String {
    "EMBEDLY_KEY".to_string()
}
fn default_user_agent() -> String {
    crate::api::USER_AGENT.to_string()
}

/// Timeout settings in seconds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Timeouts {
    /// Timeout for a single HTTP request, 0 disables it
    #[serde(default = "default_request")]
    pub request_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request_secs: default_request(),
        }
    }
}

fn default_request() -> u64 {
    30
}

impl Timeouts {
    /// Request timeout, if enabled
    pub fn request(&self) -> Option<Duration> {
        (self.request_secs > 0).then(|| Duration::from_secs(self.request_secs))
    }
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist. Host
    /// environment overrides are applied on top.
    pub fn load() -> Result<Self> {
        let mut config = match config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }

    /// Apply `EMBEDLY_API_HOST` / `EMBEDLY_PRO_HOST` overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup(API_HOST_ENV).filter(|h| !h.trim().is_empty()) {
            self.api.host = host;
        }
        if let Some(host) = lookup(PRO_HOST_ENV).filter(|h| !h.trim().is_empty()) {
            self.api.pro_host = host;
        }
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| super::Error::Internal(e.to_string()))
    }
}
