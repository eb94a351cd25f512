//! Builders for domain records used across tests.
//!
//! Concise factory functions for [`TradeRecord`], [`Order`], [`Fill`]
//! and [`BalanceSheet`] so tests focus on assertions rather than
//! construction boilerplate.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::{
    AssetBalance, BalanceSheet, Fill, FillId, Order, OrderId, OrderStatus, Pair, Side, TradeId,
    TradeRecord,
};

/// A fixed, mid-hour timestamp: 2024-06-15 10:30:00 UTC.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap()
}

/// A valid buy trade on `pair` at 100, volume 1.
pub fn trade(id: &str, pair: &str, timestamp: DateTime<Utc>) -> TradeRecord {
    TradeRecord {
        id: TradeId::new(id),
        pair: Pair::new(pair),
        side: Side::Buy,
        price: dec!(100),
        volume: dec!(1),
        cost: dec!(100),
        fee: dec!(0.26),
        timestamp,
        order_id: None,
    }
}

/// A buy order with no parent, created at [`base_time`].
pub fn buy_order(id: &str, status: OrderStatus, price: Decimal, size: Decimal) -> Order {
    Order {
        id: OrderId::new(id),
        parent_id: None,
        pair: Pair::new("BTC/USD"),
        side: Side::Buy,
        status,
        price,
        size,
        filled: Decimal::ZERO,
        created_at: base_time(),
    }
}

/// A sell order closing `parent`, created at [`base_time`].
pub fn sell_order(
    id: &str,
    parent: &str,
    status: OrderStatus,
    price: Decimal,
    size: Decimal,
) -> Order {
    Order {
        id: OrderId::new(id),
        parent_id: Some(OrderId::new(parent)),
        pair: Pair::new("BTC/USD"),
        side: Side::Sell,
        status,
        price,
        size,
        filled: Decimal::ZERO,
        created_at: base_time(),
    }
}

/// A fill against `order` at [`base_time`].
pub fn fill(id: &str, order: &str, side: Side, price: Decimal, size: Decimal) -> Fill {
    Fill {
        id: FillId::new(id),
        order_id: OrderId::new(order),
        side,
        price,
        size,
        timestamp: base_time(),
    }
}

/// A balance sheet with the given unreserved totals.
pub fn balance_sheet(totals: &[(&str, Decimal)]) -> BalanceSheet {
    let mut sheet = BalanceSheet::default();
    for (asset, total) in totals {
        sheet.insert(*asset, AssetBalance::new(*total));
    }
    sheet
}
