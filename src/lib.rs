//! Backoffice - trade ledger caching and account state reconstruction.
//!
//! This crate keeps one trading account's execution history fast to
//! query and its derived state trustworthy: trades are cached in hour
//! buckets over a key-value store, history is synced from the exchange
//! in paginated loads, and open positions and balances are reconstructed
//! from order/fill replay instead of being tracked incrementally.
//!
//! # Architecture
//!
//! Hexagonal: the application core talks to the outside world only
//! through ports.
//!
//! - **`application::ledger`** - Hour-bucketed trade cache and the sync
//!   coordinator that fills it (full loads, incremental syncs, backoff).
//! - **`application::position`** - Stateless open-position derivation by
//!   replaying orders and fills.
//! - **`application::balance`** - Balance sheets, either replayed from
//!   history (paper) or fetched from the exchange (live).
//!
//! # Modules
//!
//! - [`domain`] - Core types: trades, orders, fills, positions, balances
//! - [`port`] - Outbound trait seams: KV store, history source, order
//!   store, exchange account
//! - [`adapter`] - Bundled adapters: in-memory KV store, synthetic
//!   history source
//! - [`application`] - The services listed above
//! - [`infrastructure`] - Configuration loading and validation
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `testkit` - Export mock ports and domain builders for host test
//!   suites
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use backoffice::adapter::outbound::memory::MemoryKv;
//! use backoffice::application::ledger::LedgerCache;
//! use backoffice::infrastructure::config::settings::Config;
//!
//! let config = Config::parse_toml("").unwrap();
//! let cache = LedgerCache::new(Arc::new(MemoryKv::new()), &config.cache);
//! assert_eq!(cache.retention().as_secs(), 604_800);
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
