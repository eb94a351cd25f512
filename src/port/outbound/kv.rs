//! Key-value store port backing the ledger cache.
//!
//! One deliberately small capability interface: the union of operations
//! the cache actually uses, nothing more. Exactly one adapter implements
//! it per concrete backing store, chosen at construction time - the cache
//! never probes at runtime for what the store can do.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

/// Capability interface over the backing key-value store.
///
/// Semantics follow the conventional sorted-set/hash model:
///
/// - plain string keys support an optional time-to-live, after which the
///   key reads as absent;
/// - hashes are field -> value maps under a single key;
/// - sorted sets order unique members by a numeric score (ties broken by
///   member ordering), and re-adding a member replaces its score;
/// - [`expire`](KvStore::expire) (re)sets a key's time-to-live regardless
///   of the key's type.
///
/// All operations are infallible with respect to missing keys: reading an
/// absent key yields `None`, an empty map, or an empty vec.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a string key.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a string key, optionally with a time-to-live.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Read one field of a hash.
    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;

    /// Write one field of a hash, creating the hash if absent.
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError>;

    /// Read all fields of a hash. Empty map when the key is absent.
    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    /// Number of fields in a hash. Zero when the key is absent.
    async fn hash_len(&self, key: &str) -> Result<usize, StoreError>;

    /// Remove one field of a hash. Returns true if the field existed.
    async fn hash_del(&self, key: &str, field: &str) -> Result<bool, StoreError>;

    /// Add a member to a sorted set, replacing its score if present.
    async fn sorted_set_add(&self, key: &str, member: &str, score: f64)
        -> Result<(), StoreError>;

    /// Read members by rank.
    ///
    /// `start` and `stop` are inclusive zero-based ranks into the ordered
    /// set; negative ranks count back from the end (`-1` is the last
    /// member). With `newest_first` the set is walked from the highest
    /// score down, so rank 0 is the highest-scored member.
    async fn sorted_set_range(
        &self,
        key: &str,
        start: i64,
        stop: i64,
        newest_first: bool,
    ) -> Result<Vec<String>, StoreError>;

    /// Set or refresh a key's time-to-live. No-op for absent keys.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;
}
