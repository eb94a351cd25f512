//! Orders as read from the durable order store.
//!
//! Orders are owned by an external store; this crate only reads them to
//! reconstruct positions and balance reservations. A sell order that was
//! placed to close a buy carries the buy's ID in [`Order::parent_id`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::OrderId;
use super::money::{Price, Volume};
use super::pair::Pair;
use super::side::Side;
use crate::error::IntegrityError;

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Accepted but not yet resting on the book.
    Pending,
    /// Resting on the book, nothing filled yet.
    Open,
    /// Resting on the book with some fills.
    PartiallyFilled,
    /// Completely filled.
    Filled,
    /// Cancelled before completion.
    Cancelled,
    /// Rejected by the exchange.
    Rejected,
    /// Expired without filling.
    Expired,
}

impl OrderStatus {
    /// Returns true while the unfilled remainder reserves balance.
    ///
    /// Only resting orders hold a reservation; pending orders have not
    /// reached the book and terminal orders release theirs.
    #[must_use]
    pub const fn reserves_balance(&self) -> bool {
        matches!(self, Self::Open | Self::PartiallyFilled)
    }

    /// Returns true once the order can no longer change.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Filled | Self::Cancelled | Self::Rejected | Self::Expired
        )
    }
}

/// An order as reported by the durable order store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier.
    pub id: OrderId,
    /// For a closing sell, the buy order it closes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<OrderId>,
    /// The traded pair.
    pub pair: Pair,
    /// Buy or sell.
    pub side: Side,
    /// Lifecycle state.
    pub status: OrderStatus,
    /// Limit price in the quote asset.
    pub price: Price,
    /// Requested size in the base asset.
    pub size: Volume,
    /// Size filled so far.
    pub filled: Volume,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Unfilled remainder (`size - filled`, floored at zero).
    #[must_use]
    pub fn remaining(&self) -> Volume {
        (self.size - self.filled).max(Volume::ZERO)
    }

    /// Check the order is fit for reconstruction.
    ///
    /// Rejects an empty ID, a pair that does not split, non-positive
    /// price or size, and a negative or over-size filled amount.
    pub fn validate(&self) -> Result<(), IntegrityError> {
        if self.id.as_str().is_empty() {
            return Err(IntegrityError::EmptyField { field: "order id" });
        }
        if self.pair.split().is_none() {
            return Err(IntegrityError::MalformedPair {
                pair: self.pair.as_str().to_string(),
            });
        }
        if self.price <= Price::ZERO {
            return Err(IntegrityError::NonPositive {
                field: "price",
                value: self.price,
            });
        }
        if self.size <= Volume::ZERO {
            return Err(IntegrityError::NonPositive {
                field: "size",
                value: self.size,
            });
        }
        if self.filled < Volume::ZERO {
            return Err(IntegrityError::Negative {
                field: "filled",
                value: self.filled,
            });
        }
        Ok(())
    }
}
