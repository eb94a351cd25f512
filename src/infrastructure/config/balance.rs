//! Balance reconstruction configuration.

use std::collections::HashMap;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Where balance truth comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceMode {
    /// Derive balances from configured deposits and fill history.
    #[default]
    Paper,
    /// Fetch balances from the exchange account.
    Live,
}

/// Balance service settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceConfig {
    /// Balance source mode.
    #[serde(default)]
    pub mode: BalanceMode,
    /// Memo TTL in milliseconds; checks within it reuse one sheet.
    #[serde(default = "default_memo_ttl_ms")]
    pub memo_ttl_ms: u64,
    /// Paper-mode opening deposits, keyed by asset.
    #[serde(default)]
    pub initial_deposits: HashMap<String, Decimal>,
}

const fn default_memo_ttl_ms() -> u64 {
    500
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            mode: BalanceMode::default(),
            memo_ttl_ms: default_memo_ttl_ms(),
            initial_deposits: HashMap::new(),
        }
    }
}

impl BalanceConfig {
    /// How long a computed sheet stays fresh.
    #[must_use]
    pub const fn memo_ttl(&self) -> Duration {
        Duration::from_millis(self.memo_ttl_ms)
    }
}
