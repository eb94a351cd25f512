//! Fills as read from the durable order store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{FillId, OrderId};
use super::money::{Price, Volume};
use super::side::Side;
use crate::error::IntegrityError;

/// One execution against an order.
///
/// Fills are owned by the external order store and read fresh for every
/// reconstruction pass. A zero-size fill is tolerated but contributes
/// nothing to derived sizes or balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Fill identifier.
    pub id: FillId,
    /// The order this fill executed against.
    pub order_id: OrderId,
    /// Buy or sell.
    pub side: Side,
    /// Execution price in the quote asset.
    pub price: Price,
    /// Executed size in the base asset.
    pub size: Volume,
    /// Execution time.
    pub timestamp: DateTime<Utc>,
}

impl Fill {
    /// Check the fill is fit for reconstruction.
    ///
    /// Rejects an empty ID or order reference, a non-positive price, and
    /// a negative size. Zero size passes: such fills are ignored rather
    /// than treated as corrupt.
    pub fn validate(&self) -> Result<(), IntegrityError> {
        if self.id.as_str().is_empty() {
            return Err(IntegrityError::EmptyField { field: "fill id" });
        }
        if self.order_id.as_str().is_empty() {
            return Err(IntegrityError::EmptyField {
                field: "fill order id",
            });
        }
        if self.price <= Price::ZERO {
            return Err(IntegrityError::NonPositive {
                field: "price",
                value: self.price,
            });
        }
        if self.size < Volume::ZERO {
            return Err(IntegrityError::Negative {
                field: "size",
                value: self.size,
            });
        }
        Ok(())
    }

    /// Quote-asset notional of this fill (`price * size`).
    #[must_use]
    pub fn notional(&self) -> Price {
        self.price * self.size
    }
}
