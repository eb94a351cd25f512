//! Cached trade records.
//!
//! A [`TradeRecord`] is one executed trade as reported by the exchange's
//! trade history endpoint. Records are immutable once cached: re-ingesting
//! the same trade ID refreshes its retention TTL but never changes the
//! stored content.
//!
//! # Examples
//!
//! ```
//! use backoffice::domain::{Pair, Side, TradeId, TradeRecord};
//! use chrono::Utc;
//! use rust_decimal_macros::dec;
//!
//! let trade = TradeRecord {
//!     id: TradeId::new("TX-1"),
//!     pair: Pair::new("BTC/USD"),
//!     side: Side::Buy,
//!     price: dec!(50000),
//!     volume: dec!(0.5),
//!     cost: dec!(25000),
//!     fee: dec!(12.5),
//!     timestamp: Utc::now(),
//!     order_id: None,
//! };
//! assert!(trade.validate().is_ok());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{OrderId, TradeId};
use super::money::{Amount, Price, Volume};
use super::pair::Pair;
use super::side::Side;
use crate::error::IntegrityError;

/// One executed trade from the account's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Exchange-assigned trade identifier.
    pub id: TradeId,
    /// The traded pair.
    pub pair: Pair,
    /// Buy or sell.
    pub side: Side,
    /// Execution price in the quote asset.
    pub price: Price,
    /// Executed size in the base asset.
    pub volume: Volume,
    /// Total cost in the quote asset (price x volume as reported upstream).
    pub cost: Amount,
    /// Fee charged by the exchange, in the quote asset.
    pub fee: Amount,
    /// Execution time.
    pub timestamp: DateTime<Utc>,
    /// Originating order, when the exchange reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
}

impl TradeRecord {
    /// Check the record is fit for caching.
    ///
    /// Rejects an empty ID, a pair that does not split into `BASE/QUOTE`,
    /// non-positive price or volume, and a negative fee. Validation
    /// failures are data-integrity problems: callers skip the record with
    /// a warning rather than failing the batch.
    pub fn validate(&self) -> Result<(), IntegrityError> {
        if self.id.as_str().is_empty() {
            return Err(IntegrityError::EmptyField { field: "trade id" });
        }
        if self.pair.split().is_none() {
            return Err(IntegrityError::MalformedPair {
                pair: self.pair.as_str().to_string(),
            });
        }
        if self.price <= Amount::ZERO {
            return Err(IntegrityError::NonPositive {
                field: "price",
                value: self.price,
            });
        }
        if self.volume <= Amount::ZERO {
            return Err(IntegrityError::NonPositive {
                field: "volume",
                value: self.volume,
            });
        }
        if self.fee < Amount::ZERO {
            return Err(IntegrityError::Negative {
                field: "fee",
                value: self.fee,
            });
        }
        Ok(())
    }
}
