//! In-memory key-value store adapter.
//!
//! The one concrete [`KvStore`] in this crate. Backed by [`DashMap`] with
//! per-key time-to-live; expiry is lazy (checked on access) with an
//! explicit [`MemoryKv::purge_expired`] sweep for hosts that want to
//! reclaim memory proactively.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::StoreError;
use crate::port::outbound::kv::KvStore;

/// One keyed value. Keys are typed by first use, as in the usual
/// key-value store model; using a key with the wrong family of
/// operations is a backend error.
#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    /// Members ordered by `(score, member)` ascending.
    ZSet(Vec<(f64, String)>),
}

/// In-memory [`KvStore`] adapter.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: DashMap<String, Value>,
    expiries: DashMap<String, Instant>,
}

impl MemoryKv {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a key outright, regardless of type or TTL.
    ///
    /// Returns true if the key existed. Not part of the [`KvStore`]
    /// contract; useful for diagnostics and failure-injection in tests.
    pub fn remove(&self, key: &str) -> bool {
        self.expiries.remove(key);
        self.entries.remove(key).is_some()
    }

    /// Remaining time-to-live of a key, `None` when the key is absent
    /// or has no expiry.
    #[must_use]
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        if self.is_expired(key) {
            self.drop_expired(key);
            return None;
        }
        let expiry = self.expiries.get(key)?;
        Some(expiry.saturating_duration_since(Instant::now()))
    }

    /// Number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.purge_expired();
        self.entries.len()
    }

    /// Returns true if no live keys remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every key whose TTL has passed. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let dead: Vec<String> = self
            .expiries
            .iter()
            .filter(|entry| *entry.value() <= now)
            .map(|entry| entry.key().clone())
            .collect();
        for key in &dead {
            self.expiries.remove(key);
            self.entries.remove(key);
        }
        dead.len()
    }

    fn is_expired(&self, key: &str) -> bool {
        self.expiries
            .get(key)
            .is_some_and(|expiry| *expiry <= Instant::now())
    }

    fn drop_expired(&self, key: &str) {
        self.expiries.remove(key);
        self.entries.remove(key);
    }

    /// Lazy expiry: forget the key if its TTL has passed.
    fn evict_if_expired(&self, key: &str) {
        if self.is_expired(key) {
            self.drop_expired(key);
        }
    }

    fn wrong_type(key: &str) -> StoreError {
        StoreError::Backend(format!("wrong value type for key '{key}'"))
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.evict_if_expired(key);
        match self.entries.get(key).map(|entry| entry.value().clone()) {
            None => Ok(None),
            Some(Value::Str(value)) => Ok(Some(value)),
            Some(_) => Err(Self::wrong_type(key)),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        self.entries
            .insert(key.to_string(), Value::Str(value.to_string()));
        // A plain set replaces any previous TTL, as in the usual store model.
        match ttl {
            Some(ttl) => {
                self.expiries.insert(key.to_string(), Instant::now() + ttl);
            }
            None => {
                self.expiries.remove(key);
            }
        }
        Ok(())
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        self.evict_if_expired(key);
        match self.entries.get(key) {
            None => Ok(None),
            Some(entry) => match entry.value() {
                Value::Hash(map) => Ok(map.get(field).cloned()),
                _ => Err(Self::wrong_type(key)),
            },
        }
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        self.evict_if_expired(key);
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Value::Hash(HashMap::new()));
        match entry.value_mut() {
            Value::Hash(map) => {
                map.insert(field.to_string(), value.to_string());
                Ok(())
            }
            _ => Err(Self::wrong_type(key)),
        }
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        self.evict_if_expired(key);
        match self.entries.get(key) {
            None => Ok(HashMap::new()),
            Some(entry) => match entry.value() {
                Value::Hash(map) => Ok(map.clone()),
                _ => Err(Self::wrong_type(key)),
            },
        }
    }

    async fn hash_len(&self, key: &str) -> Result<usize, StoreError> {
        self.evict_if_expired(key);
        match self.entries.get(key) {
            None => Ok(0),
            Some(entry) => match entry.value() {
                Value::Hash(map) => Ok(map.len()),
                _ => Err(Self::wrong_type(key)),
            },
        }
    }

    async fn hash_del(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        self.evict_if_expired(key);
        match self.entries.get_mut(key) {
            None => Ok(false),
            Some(mut entry) => match entry.value_mut() {
                Value::Hash(map) => Ok(map.remove(field).is_some()),
                _ => Err(Self::wrong_type(key)),
            },
        }
    }

    async fn sorted_set_add(
        &self,
        key: &str,
        member: &str,
        score: f64,
    ) -> Result<(), StoreError> {
        self.evict_if_expired(key);
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Value::ZSet(Vec::new()));
        match entry.value_mut() {
            Value::ZSet(members) => {
                members.retain(|(_, m)| m != member);
                let position = members
                    .binary_search_by(|(s, m)| {
                        s.total_cmp(&score).then_with(|| m.as_str().cmp(member))
                    })
                    .unwrap_or_else(|insert_at| insert_at);
                members.insert(position, (score, member.to_string()));
                Ok(())
            }
            _ => Err(Self::wrong_type(key)),
        }
    }

    async fn sorted_set_range(
        &self,
        key: &str,
        start: i64,
        stop: i64,
        newest_first: bool,
    ) -> Result<Vec<String>, StoreError> {
        self.evict_if_expired(key);
        let members = match self.entries.get(key) {
            None => return Ok(Vec::new()),
            Some(entry) => match entry.value() {
                Value::ZSet(members) => members.clone(),
                _ => return Err(Self::wrong_type(key)),
            },
        };

        let len = members.len() as i64;
        let resolve = |rank: i64| if rank < 0 { len + rank } else { rank };
        let start = resolve(start).max(0);
        let stop = resolve(stop).min(len - 1);
        if start > stop || len == 0 {
            return Ok(Vec::new());
        }

        let take = (stop - start + 1) as usize;
        let skip = start as usize;
        let selected: Vec<String> = if newest_first {
            members
                .iter()
                .rev()
                .skip(skip)
                .take(take)
                .map(|(_, m)| m.clone())
                .collect()
        } else {
            members
                .iter()
                .skip(skip)
                .take(take)
                .map(|(_, m)| m.clone())
                .collect()
        };
        Ok(selected)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        self.evict_if_expired(key);
        if self.entries.contains_key(key) {
            self.expiries.insert(key.to_string(), Instant::now() + ttl);
        }
        Ok(())
    }
}
