//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching gateway.toml
//! structure. Every section is optional and falls back to defaults.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::adapters::backend::BackendConfig;
use crate::adapters::coingecko::CoinGeckoConfig;
use crate::application::ADDRESS_TIMEOUT;
use crate::domain::{is_canonical_address, FALLBACK_RECIPIENT_ADDRESS};

/// Environment variable overriding `[backend] api_url`
pub const API_URL_ENV: &str = "GATEWAY_API_URL";

/// Main configuration structure matching gateway.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub price: PriceSection,
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Spot price service section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PriceSection {
    /// CoinGecko simple price endpoint
    pub api_url: String,
    /// Asset id as known to the price service
    pub asset_id: String,
    /// Fiat currency of the quote
    pub vs_currency: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for PriceSection {
    fn default() -> Self {
        let defaults = CoinGeckoConfig::default();
        Self {
            api_url: defaults.api_url,
            asset_id: defaults.asset_id,
            vs_currency: defaults.vs_currency,
            timeout_secs: defaults.timeout.as_secs(),
        }
    }
}

/// Shop backend section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    /// Backend base URL, without the route
    pub api_url: String,
    /// Address resolution timeout in milliseconds, at most 5000
    pub timeout_ms: u64,
    /// Placeholder used when the address cannot be resolved
    pub fallback_address: String,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            timeout_ms: ADDRESS_TIMEOUT.as_millis() as u64,
            fallback_address: FALLBACK_RECIPIENT_ADDRESS.to_string(),
        }
    }
}

impl BackendSection {
    /// Get backend URL with environment variable override
    /// Checks GATEWAY_API_URL env var first, falls back to config value
    pub fn get_api_url(&self) -> String {
        std::env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.api_url.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Load from `path` if it exists, otherwise use defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            load_config(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.price.api_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "price.api_url cannot be empty".to_string(),
            ));
        }

        if self.price.asset_id.is_empty() || self.price.vs_currency.is_empty() {
            return Err(ConfigError::ValidationError(
                "price.asset_id and price.vs_currency cannot be empty".to_string(),
            ));
        }

        if self.price.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "price.timeout_secs must be > 0".to_string(),
            ));
        }

        if self.backend.get_api_url().trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backend.api_url cannot be empty".to_string(),
            ));
        }

        if self.backend.timeout_ms == 0 || self.backend.timeout() > ADDRESS_TIMEOUT {
            return Err(ConfigError::ValidationError(format!(
                "backend.timeout_ms must be 1-{}, got {}",
                ADDRESS_TIMEOUT.as_millis(),
                self.backend.timeout_ms
            )));
        }

        if self.backend.timeout() < ADDRESS_TIMEOUT {
            tracing::warn!(
                "backend.timeout_ms = {} is shorter than the default {} ms",
                self.backend.timeout_ms,
                ADDRESS_TIMEOUT.as_millis()
            );
        }

        if !is_canonical_address(&self.backend.fallback_address) {
            return Err(ConfigError::ValidationError(format!(
                "backend.fallback_address must be 0x followed by 40 hex digits, got {:?}",
                self.backend.fallback_address
            )));
        }

        Ok(())
    }
}

impl From<&Config> for CoinGeckoConfig {
    fn from(config: &Config) -> Self {
        CoinGeckoConfig {
            api_url: config.price.api_url.clone(),
            asset_id: config.price.asset_id.clone(),
            vs_currency: config.price.vs_currency.clone(),
            timeout: Duration::from_secs(config.price.timeout_secs),
        }
    }
}

impl From<&Config> for BackendConfig {
    fn from(config: &Config) -> Self {
        BackendConfig {
            api_url: config.backend.get_api_url(),
            timeout: config.backend.timeout(),
        }
    }
}
