//! In-memory [`OrderFillStore`] for testing.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{Fill, Order};
use crate::error::StoreError;
use crate::port::outbound::orders::OrderFillStore;

/// Order/fill store backed by plain vectors.
///
/// `push_order`/`push_fill` take `&self` so tests can mutate history
/// after the store has moved into an `Arc`.
pub struct StaticOrderFillStore {
    orders: Mutex<Vec<Order>>,
    fills: Mutex<Vec<Fill>>,
}

impl StaticOrderFillStore {
    pub fn new() -> Self {
        Self {
            orders: Mutex::new(Vec::new()),
            fills: Mutex::new(Vec::new()),
        }
    }

    pub fn with_orders(self, orders: Vec<Order>) -> Self {
        *self.orders.lock().unwrap() = orders;
        self
    }

    pub fn with_fills(self, fills: Vec<Fill>) -> Self {
        *self.fills.lock().unwrap() = fills;
        self
    }

    pub fn push_order(&self, order: Order) {
        self.orders.lock().unwrap().push(order);
    }

    pub fn push_fill(&self, fill: Fill) {
        self.fills.lock().unwrap().push(fill);
    }
}

impl Default for StaticOrderFillStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderFillStore for StaticOrderFillStore {
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self.orders.lock().unwrap().clone())
    }

    async fn list_fills(&self) -> Result<Vec<Fill>, StoreError> {
        Ok(self.fills.lock().unwrap().clone())
    }
}
