//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (EMISSIONS_*)
//! 2. TOML config file (if EMISSIONS_CONFIG_FILE set)
//! 3. Built-in defaults

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (EMISSIONS_*)
/// 2. TOML config file (if EMISSIONS_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the Scope3 API.
    ///
    /// Set via EMISSIONS_SCOPE3_API_URL environment variable.
    #[serde(default = "default_scope3_api_url")]
    pub scope3_api_url: String,

    /// Bearer token for the Scope3 API.
    ///
    /// Set via EMISSIONS_SCOPE3_TOKEN environment variable.
    /// Required when the server starts.
    #[serde(default)]
    pub scope3_token: Option<String>,

    /// User-Agent string for outbound requests.
    ///
    /// Set via EMISSIONS_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Scope3 request timeout in milliseconds.
    ///
    /// Set via EMISSIONS_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Lifetime of non-priority cache entries in seconds.
    ///
    /// Set via EMISSIONS_CACHE_TTL_SECS environment variable.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Interval between background sweeps of expired entries, in seconds.
    ///
    /// Set via EMISSIONS_SWEEP_INTERVAL_SECS environment variable.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_scope3_api_url() -> String {
    "https://api.scope3.com/v2".into()
}

fn default_user_agent() -> String {
    "emissions-cache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_cache_ttl_secs() -> u64 {
    3_600
}

fn default_sweep_interval_secs() -> u64 {
    600
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scope3_api_url: default_scope3_api_url(),
            scope3_token: None,
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Default lifetime of non-priority cache entries.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Interval between background cache sweeps.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `EMISSIONS_`
    /// 2. TOML file from `EMISSIONS_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("EMISSIONS_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("EMISSIONS_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Return the Scope3 token, which is only checked once the server starts.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the token is unset or empty.
    pub fn require_scope3_token(&self) -> Result<&str, ConfigError> {
        self.scope3_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "scope3_token".into(),
                hint: "Set EMISSIONS_SCOPE3_TOKEN environment variable".into(),
            })
    }
}
