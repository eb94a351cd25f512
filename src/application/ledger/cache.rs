//! Hour-bucketed trade cache over the key-value store.
//!
//! Each trade is stored once in the hash for its execution hour, located
//! through a per-ID locator key, and indexed in two sorted sets (per pair
//! and account-wide) scored by execution time. All keys carry the
//! retention TTL and every touch refreshes it, so an active account keeps
//! its window warm and an idle one ages out naturally.
//!
//! Writes are idempotent: re-ingesting a trade ID rewrites the same
//! record, leaves the bucket count alone, and refreshes TTLs. That makes
//! overlapping sync windows and restarted loads harmless.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::keys::{self, Keys};
use crate::domain::{Pair, TimeRange, TradeId, TradeRecord};
use crate::error::{Result, StoreError};
use crate::infrastructure::config::cache::CacheConfig;
use crate::port::outbound::kv::KvStore;

const META_COUNT: &str = "count";
const META_PROCESSED: &str = "processed";
const META_UPDATED_AT: &str = "updated_at";

/// What [`LedgerCache::put`] did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// First time this trade ID was seen; bucket count incremented.
    Inserted,
    /// Known ID re-written; content identical by contract, TTLs refreshed.
    Refreshed,
    /// Record failed validation and was not stored.
    Skipped,
}

impl PutOutcome {
    /// Returns true if the record is now cached (inserted or refreshed).
    #[must_use]
    pub const fn is_stored(&self) -> bool {
        matches!(self, Self::Inserted | Self::Refreshed)
    }

    /// Returns true if this was the first sighting of the ID.
    #[must_use]
    pub const fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted)
    }

    /// Returns true if the record was rejected by validation.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

/// Snapshot of cache contents, from bucket metadata.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Buckets holding at least one trade inside the retention window.
    pub buckets: usize,
    /// Buckets whose processed flag is set.
    pub processed_buckets: usize,
    /// Trades ingested, summed over bucket counts.
    pub trades: u64,
    /// Start of the oldest populated bucket.
    pub oldest_bucket: Option<DateTime<Utc>>,
    /// Start of the newest populated bucket.
    pub newest_bucket: Option<DateTime<Utc>>,
    /// Records skipped for integrity reasons since construction.
    pub skipped_records: u64,
}

/// Hour-bucketed cache of the account's executed trades.
pub struct LedgerCache {
    store: Arc<dyn KvStore>,
    keys: Keys,
    retention_secs: u64,
    skipped: AtomicU64,
}

impl LedgerCache {
    /// Create a cache over an injected store.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            keys: Keys::new(config.key_prefix.clone()),
            retention_secs: config.retention_secs,
            skipped: AtomicU64::new(0),
        }
    }

    /// Retention TTL applied to every cache key.
    #[must_use]
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    /// Retention as a chrono duration, for window math.
    #[must_use]
    pub fn retention_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.retention_secs as i64)
    }

    /// Records skipped for integrity reasons since construction.
    #[must_use]
    pub fn skipped_records(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Upsert one trade.
    ///
    /// Validation failures are counted and skipped, never propagated: one
    /// malformed record must not sink the batch it arrived in. Store
    /// failures do propagate.
    pub async fn put(&self, trade: &TradeRecord) -> Result<PutOutcome> {
        if let Err(reason) = trade.validate() {
            self.skipped.fetch_add(1, Ordering::Relaxed);
            warn!(trade_id = %trade.id, error = %reason, "Skipping malformed trade record");
            return Ok(PutOutcome::Skipped);
        }

        let bucket_key = self.keys.bucket(trade.timestamp);
        let meta_key = self.keys.bucket_meta(trade.timestamp);
        let locator_key = self.keys.trade(&trade.id);
        let pair_key = self.keys.pair(&trade.pair);
        let timeline_key = self.keys.timeline();

        // The locator doubles as the idempotence check: only a genuinely
        // new ID bumps the bucket count.
        let known = self.store.get(&locator_key).await?.is_some();

        let payload = serde_json::to_string(trade).map_err(StoreError::Serialize)?;
        self.store
            .hash_set(&bucket_key, trade.id.as_str(), &payload)
            .await?;

        if !known {
            let count = self
                .store
                .hash_get(&meta_key, META_COUNT)
                .await?
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0);
            self.store
                .hash_set(&meta_key, META_COUNT, &(count + 1).to_string())
                .await?;
            if self.store.hash_get(&meta_key, META_PROCESSED).await?.is_none() {
                self.store.hash_set(&meta_key, META_PROCESSED, "0").await?;
            }
        }
        self.store
            .hash_set(&meta_key, META_UPDATED_AT, &Utc::now().to_rfc3339())
            .await?;

        let score = keys::time_score(trade.timestamp);
        self.store
            .sorted_set_add(&pair_key, trade.id.as_str(), score)
            .await?;
        self.store
            .sorted_set_add(&timeline_key, trade.id.as_str(), score)
            .await?;

        let ttl = self.retention();
        self.store.set(&locator_key, &bucket_key, Some(ttl)).await?;
        for key in [&bucket_key, &meta_key, &pair_key, &timeline_key] {
            self.store.expire(key, ttl).await?;
        }

        debug!(trade_id = %trade.id, bucket = %bucket_key, known, "Cached trade");
        Ok(if known {
            PutOutcome::Refreshed
        } else {
            PutOutcome::Inserted
        })
    }

    /// Look up one trade by ID.
    ///
    /// With a `hint` only the hinted hour buckets are read - constant
    /// time for a single-hour hint. Without one, the locator key resolves
    /// the bucket directly; if the locator itself is gone the lookup
    /// degrades to a newest-first scan of the retention window. The scan
    /// never fails outright: unreadable buckets are logged and skipped.
    pub async fn get_by_id(
        &self,
        id: &TradeId,
        hint: Option<&TimeRange>,
    ) -> Result<Option<TradeRecord>> {
        if let Some(range) = hint {
            return Ok(self.scan_buckets(id, keys::bucket_starts(range)).await);
        }

        let locator_key = self.keys.trade(id);
        if let Some(bucket_key) = self.store.get(&locator_key).await? {
            if let Some(payload) = self.store.hash_get(&bucket_key, id.as_str()).await? {
                return Ok(self.decode(&payload, id));
            }
        }

        let mut starts = keys::bucket_starts(&self.scan_range());
        starts.reverse();
        Ok(self.scan_buckets(id, starts).await)
    }

    /// The most recent trades for one pair, newest first.
    ///
    /// Index entries whose records have expired are skipped, so the
    /// result may be shorter than `limit`.
    pub async fn get_by_pair(&self, pair: &Pair, limit: usize) -> Result<Vec<TradeRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let ids = self
            .store
            .sorted_set_range(&self.keys.pair(pair), 0, limit as i64 - 1, true)
            .await?;
        Ok(self.resolve(ids).await)
    }

    /// The most recent trades across all pairs, newest first, optionally
    /// bounded below by `since`.
    pub async fn get_recent(
        &self,
        limit: usize,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<TradeRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let ids = self
            .store
            .sorted_set_range(&self.keys.timeline(), 0, limit as i64 - 1, true)
            .await?;
        let mut trades = self.resolve(ids).await;
        if let Some(since) = since {
            if let Some(cut) = trades.iter().position(|t| t.timestamp < since) {
                trades.truncate(cut);
            }
        }
        Ok(trades)
    }

    /// Walk bucket metadata over the retention window.
    pub async fn stats(&self) -> Result<CacheStats> {
        let mut stats = CacheStats {
            skipped_records: self.skipped.load(Ordering::Relaxed),
            ..CacheStats::default()
        };

        for start in keys::bucket_starts(&self.scan_range()) {
            let meta_key = self.keys.bucket_meta(start);
            let meta = match self.store.hash_get_all(&meta_key).await {
                Ok(meta) => meta,
                Err(err) => {
                    warn!(bucket = %meta_key, error = %err, "Bucket metadata read failed, skipping");
                    continue;
                }
            };
            if meta.is_empty() {
                continue;
            }

            stats.buckets += 1;
            if meta.get(META_PROCESSED).map(String::as_str) == Some("1") {
                stats.processed_buckets += 1;
            }
            stats.trades += meta
                .get(META_COUNT)
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0);
            stats.newest_bucket = Some(start);
            if stats.oldest_bucket.is_none() {
                stats.oldest_bucket = Some(start);
            }
        }
        Ok(stats)
    }

    /// Flag the bucket containing `hour` as processed.
    ///
    /// Returns false (and writes nothing) when the bucket has no
    /// metadata, i.e. no trade was ever cached for that hour.
    pub async fn mark_processed(&self, hour: DateTime<Utc>) -> Result<bool> {
        let meta_key = self.keys.bucket_meta(hour);
        if self.store.hash_len(&meta_key).await? == 0 {
            return Ok(false);
        }
        self.store.hash_set(&meta_key, META_PROCESSED, "1").await?;
        self.store.expire(&meta_key, self.retention()).await?;
        Ok(true)
    }

    /// Scan window: the retention window plus one bucket of slack so the
    /// in-progress hour (and mild clock skew) is always covered.
    fn scan_range(&self) -> TimeRange {
        let now = Utc::now();
        TimeRange::new(
            now - self.retention_window(),
            now + chrono::Duration::hours(1),
        )
    }

    async fn scan_buckets(
        &self,
        id: &TradeId,
        buckets: Vec<DateTime<Utc>>,
    ) -> Option<TradeRecord> {
        for start in buckets {
            let bucket_key = self.keys.bucket(start);
            match self.store.hash_get(&bucket_key, id.as_str()).await {
                Ok(Some(payload)) => {
                    if let Some(trade) = self.decode(&payload, id) {
                        return Some(trade);
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(bucket = %bucket_key, error = %err, "Bucket read failed during lookup, skipping");
                }
            }
        }
        None
    }

    /// Resolve index members to records, skipping expired or unreadable
    /// entries.
    async fn resolve(&self, ids: Vec<String>) -> Vec<TradeRecord> {
        let mut trades = Vec::with_capacity(ids.len());
        for raw in ids {
            let id = TradeId::new(raw);
            let locator_key = self.keys.trade(&id);
            let bucket_key = match self.store.get(&locator_key).await {
                Ok(Some(bucket_key)) => bucket_key,
                Ok(None) => {
                    debug!(trade_id = %id, "Indexed trade has expired, skipping");
                    continue;
                }
                Err(err) => {
                    warn!(trade_id = %id, error = %err, "Locator read failed, skipping");
                    continue;
                }
            };
            match self.store.hash_get(&bucket_key, id.as_str()).await {
                Ok(Some(payload)) => {
                    if let Some(trade) = self.decode(&payload, &id) {
                        trades.push(trade);
                    }
                }
                Ok(None) => debug!(trade_id = %id, "Indexed trade has expired, skipping"),
                Err(err) => {
                    warn!(trade_id = %id, error = %err, "Record read failed, skipping");
                }
            }
        }
        trades
    }

    fn decode(&self, payload: &str, id: &TradeId) -> Option<TradeRecord> {
        match serde_json::from_str(payload) {
            Ok(trade) => Some(trade),
            Err(err) => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                warn!(trade_id = %id, error = %err, "Corrupt cached record, skipping");
                None
            }
        }
    }
}
