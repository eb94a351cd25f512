use backoffice::infrastructure::config::cache::CacheConfig;
use backoffice::infrastructure::config::sync::SyncConfig;

/// Cache config with an isolated key prefix per test.
pub fn test_cache_config(prefix: &str) -> CacheConfig {
    CacheConfig {
        key_prefix: prefix.to_string(),
        retention_secs: 7 * 24 * 3600,
    }
}

/// Sync config with small pages and a fast backoff.
pub fn test_sync_config(page_size: usize) -> SyncConfig {
    SyncConfig {
        page_size,
        max_total_trades: 10_000,
        interval_secs: 1,
        full_sync_interval_secs: 0,
        request_timeout_ms: 5_000,
        initial_backoff_ms: 50,
        max_backoff_ms: 200,
        backoff_multiplier: 2.0,
    }
}
