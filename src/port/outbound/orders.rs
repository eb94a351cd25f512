//! Durable order/fill store port.

use async_trait::async_trait;

use crate::domain::{Fill, Order};
use crate::error::StoreError;

/// Read access to the account's orders and fills.
///
/// The store is owned elsewhere; this layer never writes to it.
/// Reconstruction reads the full history fresh on every call - the store
/// is the single source of truth and nothing is cached between calls.
#[async_trait]
pub trait OrderFillStore: Send + Sync {
    /// All orders for the account scope, in no particular order.
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError>;

    /// All fills for the account scope, in no particular order.
    async fn list_fills(&self) -> Result<Vec<Fill>, StoreError>;
}
