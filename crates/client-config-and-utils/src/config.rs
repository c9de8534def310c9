//! Configuration management for the client.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default backend proxy that performs the provider token exchange.
pub const DEFAULT_PROXY_URL: &str = match option_env!("PINSCHED_PROXY_URL") {
    Some(url) => url,
    None => "http://localhost:8888/.netlify/functions/pinterest-auth",
};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Storage slot holding the serialized session record.
pub const DEFAULT_STORAGE_KEY: &str = "pinterest_auth";

/// Pause between a successful callback and the dashboard navigation.
pub const DEFAULT_CALLBACK_NAVIGATION_DELAY_MS: u64 = 100;

const ENV_LOG_LEVEL: &str = "PINSCHED_LOG_LEVEL";
const ENV_PROXY_URL: &str = "PINSCHED_PROXY_URL";

/// Main client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Backend proxy endpoint for authorization URL, code exchange and refresh.
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,
    /// Storage key of the persisted session record.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Delay before navigating to the dashboard after a completed callback.
    #[serde(default = "default_callback_navigation_delay_ms")]
    pub callback_navigation_delay_ms: u64,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_proxy_url() -> String {
    DEFAULT_PROXY_URL.to_string()
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_callback_navigation_delay_ms() -> u64 {
    DEFAULT_CALLBACK_NAVIGATION_DELAY_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            proxy_url: default_proxy_url(),
            storage_key: default_storage_key(),
            callback_navigation_delay_ms: DEFAULT_CALLBACK_NAVIGATION_DELAY_MS,
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults,
    /// then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Check values that would otherwise fail much later.
    pub fn validate(&self) -> CoreResult<()> {
        if self.storage_key.trim().is_empty() {
            return Err(CoreError::Config("storage_key must not be empty".to_string()));
        }
        self.proxy_url()?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(log_level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            self.log_level = log_level;
        }
        if let Some(proxy_url) = lookup(ENV_PROXY_URL).filter(|v| !v.trim().is_empty()) {
            self.proxy_url = proxy_url;
        }
    }

    /// Get the proxy URL as a parsed absolute http(s) URL.
    pub fn proxy_url(&self) -> CoreResult<Url> {
        let url = Url::parse(&self.proxy_url)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(CoreError::UnsupportedProxyScheme(other.to_string())),
        }
    }

    /// Callback navigation delay as a `Duration`.
    pub fn callback_navigation_delay(&self) -> Duration {
        Duration::from_millis(self.callback_navigation_delay_ms)
    }
}
