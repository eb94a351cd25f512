//! Ledger cache configuration.

use serde::Deserialize;

/// Trade cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Prefix for every cache key, namespacing one account's data.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Retention TTL in seconds applied to every cache key.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
}

fn default_key_prefix() -> String {
    "backoffice".to_string()
}

const fn default_retention_secs() -> u64 {
    604_800 // 7 days
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            retention_secs: default_retention_secs(),
        }
    }
}
