//! Application services (use cases).
//!
//! These services orchestrate domain logic over the outbound ports:
//! ledger caching and sync, position derivation and balance
//! reconstruction.

pub mod balance;
pub mod ledger;
pub mod position;

pub use balance::BalanceService;
pub use ledger::{LedgerCache, SyncCoordinator};
pub use position::{derive_open_positions, has_open_positions, DeriveOptions, PositionService};
