//! Open position reconstruction from order and fill history.
//!
//! Nothing here is stateful: every call replays the order and fill
//! slices it is given and derives what is open right now. A buy with
//! fills stays open until any sell linked to it through `parent_id`
//! records a fill. A partial sell fill closes the whole buy; the
//! account's exit flow places one closing order per entry, so a sell
//! that has started filling means the entry is being unwound.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::domain::{Fill, Order, OrderId, Position};
use crate::error::Result;
use crate::port::outbound::orders::OrderFillStore;

/// Options for position derivation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeriveOptions {
    /// Merge open positions of the same pair into one weighted summary.
    pub aggregate_by_pair: bool,
}

/// Fills grouped by owning order, sells grouped by parent buy.
///
/// Malformed fills, fills against unknown orders and zero-size fills are
/// dropped while building the index, so downstream logic only ever sees
/// fills that contribute size.
struct ReplayIndex<'a> {
    fills_by_order: HashMap<&'a OrderId, Vec<&'a Fill>>,
    sells_by_parent: HashMap<&'a OrderId, Vec<&'a Order>>,
}

impl<'a> ReplayIndex<'a> {
    fn build(orders: &'a [Order], fills: &'a [Fill]) -> Self {
        let known: HashSet<&OrderId> = orders.iter().map(|order| &order.id).collect();

        let mut fills_by_order: HashMap<&OrderId, Vec<&Fill>> = HashMap::new();
        for fill in fills {
            if let Err(reason) = fill.validate() {
                warn!(fill_id = %fill.id, error = %reason, "Skipping malformed fill");
                continue;
            }
            if !known.contains(&fill.order_id) {
                warn!(
                    fill_id = %fill.id,
                    order_id = %fill.order_id,
                    "Fill references unknown order, skipping"
                );
                continue;
            }
            if fill.size.is_zero() {
                debug!(fill_id = %fill.id, "Ignoring zero-size fill");
                continue;
            }
            fills_by_order.entry(&fill.order_id).or_default().push(fill);
        }

        let mut sells_by_parent: HashMap<&OrderId, Vec<&Order>> = HashMap::new();
        for order in orders {
            if order.side.is_sell() {
                if let Some(parent) = &order.parent_id {
                    sells_by_parent.entry(parent).or_default().push(order);
                }
            }
        }

        Self {
            fills_by_order,
            sells_by_parent,
        }
    }

    /// True when any sell linked to this buy has at least one fill.
    fn has_filled_sell(&self, buy: &OrderId) -> bool {
        self.sells_by_parent.get(buy).map_or(false, |sells| {
            sells
                .iter()
                .any(|sell| self.fills_by_order.contains_key(&sell.id))
        })
    }
}

/// Derive the currently open positions from order and fill history.
///
/// Runs in O(orders + fills). Always returns a best-effort result;
/// malformed records are skipped with a warning, never fatal.
#[must_use]
pub fn derive_open_positions(
    orders: &[Order],
    fills: &[Fill],
    options: &DeriveOptions,
) -> Vec<Position> {
    let index = ReplayIndex::build(orders, fills);

    let mut positions = Vec::new();
    for order in orders {
        if !order.side.is_buy() {
            continue;
        }
        let Some(order_fills) = index.fills_by_order.get(&order.id) else {
            continue;
        };
        if index.has_filled_sell(&order.id) {
            continue;
        }
        if let Some(position) = position_from_fills(order, order_fills) {
            positions.push(position);
        }
    }

    if options.aggregate_by_pair {
        positions = merge_by_pair(positions);
    }
    positions
}

/// True when at least one position is open. Short-circuits on the first.
#[must_use]
pub fn has_open_positions(orders: &[Order], fills: &[Fill]) -> bool {
    let index = ReplayIndex::build(orders, fills);
    orders.iter().any(|order| {
        order.side.is_buy()
            && index.fills_by_order.contains_key(&order.id)
            && !index.has_filled_sell(&order.id)
    })
}

fn position_from_fills(order: &Order, fills: &[&Fill]) -> Option<Position> {
    let mut size = Decimal::ZERO;
    let mut notional = Decimal::ZERO;
    let mut opened_at: Option<DateTime<Utc>> = None;

    for fill in fills {
        size += fill.size;
        notional += fill.price * fill.size;
        opened_at = Some(opened_at.map_or(fill.timestamp, |cur| cur.min(fill.timestamp)));
    }
    if size <= Decimal::ZERO {
        return None;
    }

    Some(Position::new(
        order.pair.clone(),
        order.side,
        notional / size,
        size,
        opened_at?,
        vec![order.id.clone()],
    ))
}

fn merge_by_pair(positions: Vec<Position>) -> Vec<Position> {
    let mut merged: Vec<Position> = Vec::new();
    for position in positions {
        match merged.iter_mut().find(|p| p.pair() == position.pair()) {
            Some(existing) => *existing = merge(existing, &position),
            None => merged.push(position),
        }
    }
    merged
}

fn merge(a: &Position, b: &Position) -> Position {
    let size = a.size() + b.size();
    let entry = (a.entry_price() * a.size() + b.entry_price() * b.size()) / size;
    let mut order_ids = a.order_ids().to_vec();
    order_ids.extend(b.order_ids().iter().cloned());

    Position::new(
        a.pair().clone(),
        a.side(),
        entry,
        size,
        a.opened_at().min(b.opened_at()),
        order_ids,
    )
}

/// Position queries over a live order/fill store.
pub struct PositionService {
    store: Arc<dyn OrderFillStore>,
}

impl PositionService {
    #[must_use]
    pub fn new(store: Arc<dyn OrderFillStore>) -> Self {
        Self { store }
    }

    /// Read current history and derive open positions.
    pub async fn open_positions(&self, options: &DeriveOptions) -> Result<Vec<Position>> {
        let orders = self.store.list_orders().await?;
        let fills = self.store.list_fills().await?;
        Ok(derive_open_positions(&orders, &fills, options))
    }

    /// Read current history and report whether anything is open.
    pub async fn has_open(&self) -> Result<bool> {
        let orders = self.store.list_orders().await?;
        let fills = self.store.list_fills().await?;
        Ok(has_open_positions(&orders, &fills))
    }
}
