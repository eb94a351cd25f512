//! History sync configuration.

use std::time::Duration;

use serde::Deserialize;

/// Sync coordinator settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Trades requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Hard cap on trades fetched in one load.
    #[serde(default = "default_max_total_trades")]
    pub max_total_trades: usize,
    /// Seconds between incremental syncs.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Seconds between full reloads; 0 disables them.
    #[serde(default = "default_full_sync_interval_secs")]
    pub full_sync_interval_secs: u64,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// First backoff delay after a rate limit (milliseconds).
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Backoff ceiling (milliseconds).
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Multiplier applied to the backoff delay after each rate limit.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

const fn default_page_size() -> usize {
    50
}

const fn default_max_total_trades() -> usize {
    10_000
}

const fn default_interval_secs() -> u64 {
    30
}

const fn default_full_sync_interval_secs() -> u64 {
    21_600 // 6 hours
}

const fn default_request_timeout_ms() -> u64 {
    30_000
}

const fn default_initial_backoff_ms() -> u64 {
    1_000
}

const fn default_max_backoff_ms() -> u64 {
    60_000
}

const fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_total_trades: default_max_total_trades(),
            interval_secs: default_interval_secs(),
            full_sync_interval_secs: default_full_sync_interval_secs(),
            request_timeout_ms: default_request_timeout_ms(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl SyncConfig {
    /// Incremental sync period.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Full reload period, `None` when disabled.
    #[must_use]
    pub const fn full_sync_interval(&self) -> Option<Duration> {
        if self.full_sync_interval_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.full_sync_interval_secs))
        }
    }

    /// Timeout applied to each upstream request.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// First backoff delay.
    #[must_use]
    pub const fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Backoff ceiling.
    #[must_use]
    pub const fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}
