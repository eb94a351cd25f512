//! Per-asset balances.
//!
//! The invariant `available + reserved = total` is held by construction:
//! an [`AssetBalance`] stores `total` and `reserved`, and `available` is
//! always computed as the difference.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::money::Amount;

/// Balance of a single asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssetBalance {
    total: Amount,
    reserved: Amount,
}

impl AssetBalance {
    /// A balance with nothing reserved.
    #[must_use]
    pub const fn new(total: Amount) -> Self {
        Self {
            total,
            reserved: Amount::ZERO,
        }
    }

    /// A balance with an explicit reservation.
    #[must_use]
    pub const fn from_parts(total: Amount, reserved: Amount) -> Self {
        Self { total, reserved }
    }

    /// Everything the account holds, including reserved amounts.
    #[must_use]
    pub const fn total(&self) -> Amount {
        self.total
    }

    /// Amount locked by open and partially-filled orders.
    #[must_use]
    pub const fn reserved(&self) -> Amount {
        self.reserved
    }

    /// Spendable amount (`total - reserved`).
    #[must_use]
    pub fn available(&self) -> Amount {
        self.total - self.reserved
    }
}

/// Snapshot of all asset balances at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSheet {
    balances: HashMap<String, AssetBalance>,
    computed_at: DateTime<Utc>,
}

impl BalanceSheet {
    /// An empty sheet stamped `computed_at`.
    #[must_use]
    pub fn new(computed_at: DateTime<Utc>) -> Self {
        Self {
            balances: HashMap::new(),
            computed_at,
        }
    }

    /// Set the balance for an asset, replacing any previous entry.
    pub fn insert(&mut self, asset: impl Into<String>, balance: AssetBalance) {
        self.balances.insert(asset.into(), balance);
    }

    /// Balance of one asset, if the sheet has it.
    #[must_use]
    pub fn get(&self, asset: &str) -> Option<&AssetBalance> {
        self.balances.get(asset)
    }

    /// Balance of one asset, zero when absent.
    ///
    /// An asset the account never touched is indistinguishable from a
    /// zero balance, which is what sufficiency checks want.
    #[must_use]
    pub fn asset(&self, asset: &str) -> AssetBalance {
        self.balances.get(asset).copied().unwrap_or_default()
    }

    /// Iterate over `(asset, balance)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AssetBalance)> {
        self.balances.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of assets on the sheet.
    #[must_use]
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    /// Returns true if no asset has an entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// When this snapshot was computed or fetched.
    #[must_use]
    pub fn computed_at(&self) -> DateTime<Utc> {
        self.computed_at
    }
}

impl Default for BalanceSheet {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}
