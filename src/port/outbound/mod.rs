//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the four infrastructure dependencies of the
//! ledger: the key-value store backing the cache, the exchange's trade
//! history endpoint, the durable order/fill store, and the authoritative
//! account balance query.

pub mod account;
pub mod history;
pub mod kv;
pub mod orders;

pub use account::ExchangeAccount;
pub use history::{HistoryQuery, TradeHistorySource};
pub use kv::KvStore;
pub use orders::OrderFillStore;
