//! Infrastructure configuration modules.

pub mod balance;
pub mod cache;
pub mod settings;
pub mod sync;

pub use balance::{BalanceConfig, BalanceMode};
pub use cache::CacheConfig;
pub use settings::Config;
pub use sync::SyncConfig;
