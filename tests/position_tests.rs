//! Tests for open-position derivation from order/fill replay.

use std::sync::Arc;

use backoffice::application::position::{
    derive_open_positions, has_open_positions, DeriveOptions, PositionService,
};
use backoffice::domain::{OrderStatus, Pair, Side};
use backoffice::testkit::domain::{buy_order, fill, sell_order};
use backoffice::testkit::orders::StaticOrderFillStore;
use rust_decimal_macros::dec;

fn no_options() -> DeriveOptions {
    DeriveOptions::default()
}

#[test]
fn fully_exited_entry_yields_no_position() {
    let orders = vec![
        buy_order("B1", OrderStatus::Filled, dec!(100), dec!(1)),
        sell_order("S1", "B1", OrderStatus::Filled, dec!(110), dec!(1)),
    ];
    let fills = vec![
        fill("F1", "B1", Side::Buy, dec!(100), dec!(1)),
        fill("F2", "S1", Side::Sell, dec!(110), dec!(1)),
    ];

    assert!(derive_open_positions(&orders, &fills, &no_options()).is_empty());
    assert!(!has_open_positions(&orders, &fills));
}

#[test]
fn entry_with_an_unfilled_closing_sell_stays_open() {
    let orders = vec![
        buy_order("B1", OrderStatus::Filled, dec!(100), dec!(1)),
        sell_order("S1", "B1", OrderStatus::Open, dec!(110), dec!(1)),
    ];
    let fills = vec![fill("F1", "B1", Side::Buy, dec!(100), dec!(1))];

    let positions = derive_open_positions(&orders, &fills, &no_options());
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].entry_price(), dec!(100));
    assert_eq!(positions[0].size(), dec!(1));
    assert_eq!(positions[0].side(), Side::Buy);
    assert_eq!(positions[0].order_ids()[0].as_str(), "B1");
    assert!(has_open_positions(&orders, &fills));
}

#[test]
fn unfilled_buy_is_not_a_position() {
    let orders = vec![buy_order("B1", OrderStatus::Open, dec!(100), dec!(1))];

    assert!(derive_open_positions(&orders, &[], &no_options()).is_empty());
    assert!(!has_open_positions(&orders, &[]));
}

#[test]
fn partial_sell_fill_still_closes_the_buy() {
    let orders = vec![
        buy_order("B1", OrderStatus::Filled, dec!(100), dec!(1)),
        sell_order("S1", "B1", OrderStatus::PartiallyFilled, dec!(110), dec!(1)),
    ];
    let fills = vec![
        fill("F1", "B1", Side::Buy, dec!(100), dec!(1)),
        // Only a tenth of the exit has filled; the entry still counts
        // as closed.
        fill("F2", "S1", Side::Sell, dec!(110), dec!(0.1)),
    ];

    assert!(derive_open_positions(&orders, &fills, &no_options()).is_empty());
    assert!(!has_open_positions(&orders, &fills));
}

#[test]
fn entry_price_is_the_fill_weighted_average() {
    let orders = vec![buy_order("B1", OrderStatus::Filled, dec!(110), dec!(3))];
    let fills = vec![
        fill("F1", "B1", Side::Buy, dec!(100), dec!(2)),
        fill("F2", "B1", Side::Buy, dec!(130), dec!(1)),
    ];

    let positions = derive_open_positions(&orders, &fills, &no_options());
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].entry_price(), dec!(110));
    assert_eq!(positions[0].size(), dec!(3));
    assert_eq!(positions[0].notional(), dec!(330));
}

#[test]
fn zero_size_fills_contribute_nothing() {
    let orders = vec![buy_order("B1", OrderStatus::PartiallyFilled, dec!(100), dec!(2))];
    let fills = vec![
        fill("F1", "B1", Side::Buy, dec!(100), dec!(1)),
        fill("F2", "B1", Side::Buy, dec!(100), dec!(0)),
    ];

    let positions = derive_open_positions(&orders, &fills, &no_options());
    assert_eq!(positions[0].size(), dec!(1));

    // A buy whose only fill is zero-size has no position at all.
    let orders = vec![buy_order("B2", OrderStatus::PartiallyFilled, dec!(100), dec!(2))];
    let fills = vec![fill("F3", "B2", Side::Buy, dec!(100), dec!(0))];
    assert!(derive_open_positions(&orders, &fills, &no_options()).is_empty());
}

#[test]
fn fills_against_unknown_orders_are_skipped() {
    let orders = vec![buy_order("B1", OrderStatus::Filled, dec!(100), dec!(1))];
    let fills = vec![
        fill("F1", "B1", Side::Buy, dec!(100), dec!(1)),
        fill("F2", "GHOST", Side::Buy, dec!(100), dec!(5)),
    ];

    let positions = derive_open_positions(&orders, &fills, &no_options());
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].size(), dec!(1), "ghost fill must not count");
}

#[test]
fn aggregation_merges_positions_of_one_pair() {
    let mut other = buy_order("B3", OrderStatus::Filled, dec!(2000), dec!(1));
    other.pair = Pair::new("ETH/USD");

    let orders = vec![
        buy_order("B1", OrderStatus::Filled, dec!(100), dec!(1)),
        buy_order("B2", OrderStatus::Filled, dec!(120), dec!(1)),
        other,
    ];
    let fills = vec![
        fill("F1", "B1", Side::Buy, dec!(100), dec!(1)),
        fill("F2", "B2", Side::Buy, dec!(120), dec!(1)),
        fill("F3", "B3", Side::Buy, dec!(2000), dec!(1)),
    ];

    let separate = derive_open_positions(&orders, &fills, &no_options());
    assert_eq!(separate.len(), 3);

    let aggregated = derive_open_positions(
        &orders,
        &fills,
        &DeriveOptions {
            aggregate_by_pair: true,
        },
    );
    assert_eq!(aggregated.len(), 2);

    let btc = aggregated
        .iter()
        .find(|p| p.pair().as_str() == "BTC/USD")
        .unwrap();
    assert_eq!(btc.size(), dec!(2));
    assert_eq!(btc.entry_price(), dec!(110));
    assert_eq!(btc.order_ids().len(), 2);

    let eth = aggregated
        .iter()
        .find(|p| p.pair().as_str() == "ETH/USD")
        .unwrap();
    assert_eq!(eth.size(), dec!(1));
    assert_eq!(eth.entry_price(), dec!(2000));
}

#[test]
fn only_the_linked_sell_closes_its_buy() {
    let orders = vec![
        buy_order("B1", OrderStatus::Filled, dec!(100), dec!(1)),
        buy_order("B2", OrderStatus::Filled, dec!(100), dec!(1)),
        sell_order("S1", "B1", OrderStatus::Filled, dec!(110), dec!(1)),
    ];
    let fills = vec![
        fill("F1", "B1", Side::Buy, dec!(100), dec!(1)),
        fill("F2", "B2", Side::Buy, dec!(100), dec!(1)),
        fill("F3", "S1", Side::Sell, dec!(110), dec!(1)),
    ];

    let positions = derive_open_positions(&orders, &fills, &no_options());
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].order_ids()[0].as_str(), "B2");
}

#[tokio::test]
async fn service_replays_the_store_on_every_call() {
    let store = Arc::new(
        StaticOrderFillStore::new()
            .with_orders(vec![buy_order("B1", OrderStatus::PartiallyFilled, dec!(100), dec!(2))])
            .with_fills(vec![fill("F1", "B1", Side::Buy, dec!(100), dec!(1))]),
    );
    let service = PositionService::new(store.clone());

    let positions = service.open_positions(&no_options()).await.unwrap();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].size(), dec!(1));
    assert!(service.has_open().await.unwrap());

    // Closing fills arriving later change the next answer; nothing is
    // cached in between.
    store.push_order(sell_order("S1", "B1", OrderStatus::PartiallyFilled, dec!(110), dec!(1)));
    store.push_fill(fill("F2", "S1", Side::Sell, dec!(110), dec!(0.5)));

    assert!(service.open_positions(&no_options()).await.unwrap().is_empty());
    assert!(!service.has_open().await.unwrap());
}
