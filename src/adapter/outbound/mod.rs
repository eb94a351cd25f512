//! Outbound adapters (driven side).

pub mod memory;
pub mod synthetic;

pub use memory::MemoryKv;
pub use synthetic::{SyntheticConfig, SyntheticHistorySource};
