//! Monetary type aliases.
//!
//! All money math uses [`rust_decimal::Decimal`] - never floats. The
//! aliases document intent at call sites without the ceremony of full
//! newtypes.

use rust_decimal::Decimal;

/// A price quoted in the pair's quote asset.
pub type Price = Decimal;

/// A trade or order size in the pair's base asset.
pub type Volume = Decimal;

/// A generic monetary amount (costs, fees, balances).
pub type Amount = Decimal;
