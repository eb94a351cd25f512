//! Cache key shapes and hour-bucket math.
//!
//! Every key the ledger cache touches is built here, so the full keyspace
//! of one instance is visible in one place:
//!
//! ```text
//! <prefix>:trade:<id>          locator: value is the bucket key holding the record
//! <prefix>:trades:<hour>       hash: trade id -> serialized record
//! <prefix>:trades:<hour>:meta  hash: processed / count / updated_at
//! <prefix>:pair:<pair>         sorted set: trade ids scored by timestamp
//! <prefix>:timeline            sorted set: trade ids scored by timestamp
//! ```
//!
//! Two instances over disjoint prefixes never touch each other's keys;
//! that is the entire multi-account story.

use chrono::{DateTime, Duration, Utc};

use crate::domain::{Pair, TimeRange, TradeId};

/// Seconds per bucket. Buckets are calendar hours in UTC.
const BUCKET_SECS: i64 = 3600;

/// Truncate a timestamp to the start of its hour bucket.
///
/// The bucket is derived from the trade's own execution time, so a record
/// always lands in exactly one bucket no matter when it is ingested.
#[must_use]
pub fn bucket_start(ts: DateTime<Utc>) -> DateTime<Utc> {
    let secs = ts.timestamp();
    let floored = secs - secs.rem_euclid(BUCKET_SECS);
    DateTime::from_timestamp(floored, 0).unwrap_or(ts)
}

/// The `<hour>` component of bucket keys, e.g. `2024-06-15T10`.
#[must_use]
pub fn bucket_label(ts: DateTime<Utc>) -> String {
    bucket_start(ts).format("%Y-%m-%dT%H").to_string()
}

/// Bucket start times covering a window, oldest first.
///
/// Includes the bucket containing `range.start` through the bucket
/// containing the last instant before `range.end`. Empty for an empty
/// range.
#[must_use]
pub fn bucket_starts(range: &TimeRange) -> Vec<DateTime<Utc>> {
    if range.is_empty() {
        return Vec::new();
    }
    let mut starts = Vec::new();
    let mut cursor = bucket_start(range.start);
    let last = bucket_start(range.end - Duration::seconds(1));
    while cursor <= last {
        starts.push(cursor);
        cursor += Duration::seconds(BUCKET_SECS);
    }
    starts
}

/// Sorted-set score for a timestamp: milliseconds since the epoch.
#[must_use]
pub fn time_score(ts: DateTime<Utc>) -> f64 {
    ts.timestamp_millis() as f64
}

/// Key builder bound to one instance's prefix.
#[derive(Debug, Clone)]
pub struct Keys {
    prefix: String,
}

impl Keys {
    /// Create a key builder for a prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The configured prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Locator key for a trade ID.
    #[must_use]
    pub fn trade(&self, id: &TradeId) -> String {
        format!("{}:trade:{}", self.prefix, id)
    }

    /// Bucket hash key for the hour containing `ts`.
    #[must_use]
    pub fn bucket(&self, ts: DateTime<Utc>) -> String {
        format!("{}:trades:{}", self.prefix, bucket_label(ts))
    }

    /// Metadata hash key for the hour containing `ts`.
    #[must_use]
    pub fn bucket_meta(&self, ts: DateTime<Utc>) -> String {
        format!("{}:trades:{}:meta", self.prefix, bucket_label(ts))
    }

    /// Per-pair index key.
    #[must_use]
    pub fn pair(&self, pair: &Pair) -> String {
        format!("{}:pair:{}", self.prefix, pair)
    }

    /// Account-wide timeline index key.
    #[must_use]
    pub fn timeline(&self) -> String {
        format!("{}:timeline", self.prefix)
    }
}
