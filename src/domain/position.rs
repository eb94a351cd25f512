//! Derived open positions.
//!
//! A [`Position`] is never persisted: it is recomputed on demand by
//! replaying the order and fill history. Two calls may disagree if the
//! history changed in between, and that is the intended behavior.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::id::OrderId;
use super::money::{Price, Volume};
use super::pair::Pair;
use super::side::Side;

/// A currently open position derived from order/fill replay.
#[derive(Debug, Clone, Serialize)]
pub struct Position {
    pair: Pair,
    side: Side,
    entry_price: Price,
    size: Volume,
    opened_at: DateTime<Utc>,
    order_ids: Vec<OrderId>,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub fn new(
        pair: Pair,
        side: Side,
        entry_price: Price,
        size: Volume,
        opened_at: DateTime<Utc>,
        order_ids: Vec<OrderId>,
    ) -> Self {
        Self {
            pair,
            side,
            entry_price,
            size,
            opened_at,
            order_ids,
        }
    }

    /// The traded pair.
    #[must_use]
    pub fn pair(&self) -> &Pair {
        &self.pair
    }

    /// Position direction.
    #[must_use]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Fill-size-weighted average entry price.
    #[must_use]
    pub fn entry_price(&self) -> Price {
        self.entry_price
    }

    /// Total filled size in the base asset.
    #[must_use]
    pub fn size(&self) -> Volume {
        self.size
    }

    /// Time of the earliest contributing fill.
    #[must_use]
    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// The buy orders backing this position.
    ///
    /// A single order for per-order derivation; several when aggregated
    /// by pair.
    #[must_use]
    pub fn order_ids(&self) -> &[OrderId] {
        &self.order_ids
    }

    /// Quote-asset notional at entry (`entry_price * size`).
    #[must_use]
    pub fn notional(&self) -> Decimal {
        self.entry_price * self.size
    }
}
