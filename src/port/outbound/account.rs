//! Authoritative exchange account port.

use async_trait::async_trait;

use crate::domain::BalanceSheet;
use crate::error::SourceError;

/// Live balance query against the exchange.
///
/// In live mode the exchange is the only trustworthy source of balance
/// state. Implementations must report failures honestly: the balance
/// service propagates every error to the caller and never falls back to
/// stale or locally derived numbers.
#[async_trait]
pub trait ExchangeAccount: Send + Sync {
    /// Fetch the current account balances.
    async fn fetch_balances(&self) -> Result<BalanceSheet, SourceError>;

    /// Account name for logging/debugging.
    fn account_name(&self) -> &'static str;
}
