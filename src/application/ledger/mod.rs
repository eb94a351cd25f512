//! Trade ledger: hour-bucketed caching and history synchronisation.

pub mod cache;
pub mod keys;
pub mod sync;

pub use cache::{CacheStats, LedgerCache, PutOutcome};
pub use keys::Keys;
pub use sync::{LoadOptions, LoadOutcome, LoadReport, SyncCoordinator, SyncKind, SyncStatus};
