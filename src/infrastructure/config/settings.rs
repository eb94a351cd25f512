//! Configuration loading and validation.
//!
//! [`Config`] aggregates every section into one TOML layout so a host
//! can mount a single table. All fields carry defaults; an empty file
//! is a valid configuration.
//!
//! # Example
//!
//! ```
//! use backoffice::infrastructure::config::settings::Config;
//!
//! let config = Config::parse_toml("").unwrap();
//! assert_eq!(config.cache.retention_secs, 604_800);
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use super::balance::BalanceConfig;
use super::cache::CacheConfig;
use super::sync::SyncConfig;
use crate::error::{ConfigError, Result};

/// Main configuration.
///
/// Load from a TOML file with [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Trade cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// History sync settings.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Balance reconstruction settings.
    #[serde(default)]
    pub balance: BalanceConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation
    /// fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is
    /// malformed, or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Validate configuration values.
    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.cache.key_prefix.is_empty() {
            return Err(ConfigError::MissingField {
                field: "key_prefix",
            }
            .into());
        }
        if self.cache.retention_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retention_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.sync.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "page_size",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.sync.max_total_trades == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_total_trades",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.sync.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "interval_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.sync.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.sync.initial_backoff_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "initial_backoff_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.sync.max_backoff_ms < self.sync.initial_backoff_ms {
            return Err(ConfigError::InvalidValue {
                field: "max_backoff_ms",
                reason: "must be >= initial_backoff_ms".to_string(),
            }
            .into());
        }
        if self.sync.backoff_multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "backoff_multiplier",
                reason: "must be >= 1.0".to_string(),
            }
            .into());
        }

        if self.balance.memo_ttl_ms == 0 || self.balance.memo_ttl_ms > 1000 {
            return Err(ConfigError::InvalidValue {
                field: "memo_ttl_ms",
                reason: "must be between 1 and 1000".to_string(),
            }
            .into());
        }
        for (asset, amount) in &self.balance.initial_deposits {
            if asset.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "initial_deposits",
                    reason: "asset name must not be empty".to_string(),
                }
                .into());
            }
            if *amount < Decimal::ZERO {
                return Err(ConfigError::InvalidValue {
                    field: "initial_deposits",
                    reason: format!("{asset} must be 0 or greater"),
                }
                .into());
            }
        }
        Ok(())
    }
}
