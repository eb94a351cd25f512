//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`history`]: Mock [`TradeHistorySource`](crate::port::outbound::history::TradeHistorySource)
//!   implementations: `ScriptedHistorySource`, `FixedPageSource`, `GatedSource`.
//! - [`account`]: Mock [`ExchangeAccount`](crate::port::outbound::account::ExchangeAccount)
//!   implementation: `ScriptedAccount`.
//! - [`orders`]: In-memory [`OrderFillStore`](crate::port::outbound::orders::OrderFillStore):
//!   `StaticOrderFillStore`.
//! - [`domain`]: Builders for domain records: trades, orders, fills, balance sheets.

pub mod account;
pub mod domain;
pub mod history;
pub mod orders;
