//! Tests for balance reconstruction, memoisation and sufficiency checks.

use std::sync::Arc;
use std::time::Duration;

use backoffice::application::balance::BalanceService;
use backoffice::domain::{OrderStatus, Side};
use backoffice::error::{Error, SourceError};
use backoffice::infrastructure::config::balance::{BalanceConfig, BalanceMode};
use backoffice::testkit::account::ScriptedAccount;
use backoffice::testkit::domain::{balance_sheet, buy_order, fill, sell_order};
use backoffice::testkit::orders::StaticOrderFillStore;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn paper_config(deposits: &[(&str, Decimal)]) -> BalanceConfig {
    BalanceConfig {
        mode: BalanceMode::Paper,
        memo_ttl_ms: 500,
        initial_deposits: deposits
            .iter()
            .map(|(asset, amount)| (asset.to_string(), *amount))
            .collect(),
    }
}

fn live_config(memo_ttl_ms: u64) -> BalanceConfig {
    BalanceConfig {
        mode: BalanceMode::Live,
        memo_ttl_ms,
        initial_deposits: Default::default(),
    }
}

fn paper_service(store: StaticOrderFillStore, deposits: &[(&str, Decimal)]) -> BalanceService {
    BalanceService::new(Arc::new(store), None, &paper_config(deposits)).unwrap()
}

#[tokio::test]
async fn deposits_form_the_opening_sheet() {
    let service = paper_service(StaticOrderFillStore::new(), &[("USD", dec!(1000))]);

    let sheet = service.balances(false).await.unwrap();
    assert_eq!(sheet.asset("USD").total(), dec!(1000));
    assert_eq!(sheet.asset("USD").available(), dec!(1000));
    assert_eq!(sheet.asset("USD").reserved(), dec!(0));
    assert_eq!(sheet.asset("BTC").total(), dec!(0));
}

#[tokio::test]
async fn buy_fill_moves_quote_into_base() {
    let mut order = buy_order("B1", OrderStatus::Filled, dec!(100), dec!(1));
    order.filled = dec!(1);
    let store = StaticOrderFillStore::new()
        .with_orders(vec![order])
        .with_fills(vec![fill("F1", "B1", Side::Buy, dec!(100), dec!(1))]);
    let service = paper_service(store, &[("USD", dec!(1000))]);

    let sheet = service.balances(false).await.unwrap();
    assert_eq!(sheet.asset("BTC").total(), dec!(1));
    assert_eq!(sheet.asset("USD").total(), dec!(900));
}

#[tokio::test]
async fn sell_fill_moves_base_into_quote() {
    let mut entry = buy_order("B1", OrderStatus::Filled, dec!(100), dec!(2));
    entry.filled = dec!(2);
    let mut exit = sell_order("S1", "B1", OrderStatus::Filled, dec!(120), dec!(1));
    exit.filled = dec!(1);
    let store = StaticOrderFillStore::new()
        .with_orders(vec![entry, exit])
        .with_fills(vec![
            fill("F1", "B1", Side::Buy, dec!(100), dec!(2)),
            fill("F2", "S1", Side::Sell, dec!(120), dec!(1)),
        ]);
    let service = paper_service(store, &[("USD", dec!(1000))]);

    let sheet = service.balances(false).await.unwrap();
    assert_eq!(sheet.asset("BTC").total(), dec!(1));
    assert_eq!(sheet.asset("USD").total(), dec!(920));
}

#[tokio::test]
async fn resting_buy_reserves_quote() {
    let mut filled = buy_order("B1", OrderStatus::Filled, dec!(100), dec!(1));
    filled.filled = dec!(1);
    let store = StaticOrderFillStore::new()
        .with_orders(vec![
            filled,
            buy_order("B2", OrderStatus::Open, dec!(50), dec!(1)),
        ])
        .with_fills(vec![fill("F1", "B1", Side::Buy, dec!(100), dec!(1))]);
    let service = paper_service(store, &[("USD", dec!(1000))]);

    let sheet = service.balances(false).await.unwrap();
    let usd = sheet.asset("USD");
    assert_eq!(usd.total(), dec!(900));
    assert_eq!(usd.reserved(), dec!(50));
    assert_eq!(usd.available(), dec!(850));
}

#[tokio::test]
async fn resting_sell_reserves_base() {
    let mut entry = buy_order("B1", OrderStatus::Filled, dec!(100), dec!(2));
    entry.filled = dec!(2);
    let store = StaticOrderFillStore::new()
        .with_orders(vec![
            entry,
            sell_order("S1", "B1", OrderStatus::Open, dec!(120), dec!(0.6)),
        ])
        .with_fills(vec![fill("F1", "B1", Side::Buy, dec!(100), dec!(2))]);
    let service = paper_service(store, &[("USD", dec!(1000))]);

    let sheet = service.balances(false).await.unwrap();
    let btc = sheet.asset("BTC");
    assert_eq!(btc.total(), dec!(2));
    assert_eq!(btc.reserved(), dec!(0.6));
    assert_eq!(btc.available(), dec!(1.4));
}

#[tokio::test]
async fn reservations_cover_only_the_unfilled_remainder() {
    let mut partial = buy_order("B1", OrderStatus::PartiallyFilled, dec!(100), dec!(2));
    partial.filled = dec!(0.5);
    let cancelled = buy_order("B2", OrderStatus::Cancelled, dec!(100), dec!(3));
    let store = StaticOrderFillStore::new()
        .with_orders(vec![partial, cancelled])
        .with_fills(vec![fill("F1", "B1", Side::Buy, dec!(100), dec!(0.5))]);
    let service = paper_service(store, &[("USD", dec!(1000))]);

    let sheet = service.balances(false).await.unwrap();
    let usd = sheet.asset("USD");
    // 1.5 remaining at 100; the cancelled order reserves nothing.
    assert_eq!(usd.reserved(), dec!(150));
    assert_eq!(usd.total(), dec!(950));
    assert_eq!(usd.available(), dec!(800));
}

#[tokio::test]
async fn fills_against_unknown_orders_are_skipped_and_counted() {
    let store = StaticOrderFillStore::new()
        .with_fills(vec![fill("F1", "GHOST", Side::Buy, dec!(100), dec!(1))]);
    let service = paper_service(store, &[("USD", dec!(1000))]);

    let sheet = service.balances(false).await.unwrap();
    assert_eq!(sheet.asset("USD").total(), dec!(1000), "ghost fill must not move funds");
    assert_eq!(service.skipped_records(), 1);
}

#[tokio::test]
async fn exactly_enough_balance_is_sufficient() {
    let service = paper_service(StaticOrderFillStore::new(), &[("USD", dec!(100))]);

    let exact = buy_order("C1", OrderStatus::Pending, dec!(100), dec!(1));
    assert!(service.check_sufficient_balance(&exact).await.unwrap());

    let too_big = buy_order("C2", OrderStatus::Pending, dec!(100.01), dec!(1));
    assert!(
        !service.check_sufficient_balance(&too_big).await.unwrap(),
        "a shortfall answers false, it does not error"
    );
}

#[tokio::test]
async fn sell_sufficiency_checks_the_base_asset() {
    let service = paper_service(StaticOrderFillStore::new(), &[("BTC", dec!(0.5))]);

    let fits = sell_order("C1", "B1", OrderStatus::Pending, dec!(100), dec!(0.5));
    assert!(service.check_sufficient_balance(&fits).await.unwrap());

    let too_big = sell_order("C2", "B1", OrderStatus::Pending, dec!(100), dec!(0.6));
    assert!(!service.check_sufficient_balance(&too_big).await.unwrap());
}

#[tokio::test]
async fn reserved_funds_do_not_count_toward_sufficiency() {
    let store = StaticOrderFillStore::new()
        .with_orders(vec![buy_order("B1", OrderStatus::Open, dec!(100), dec!(5))]);
    let service = paper_service(store, &[("USD", dec!(600))]);

    // 500 of the 600 is reserved by the resting order.
    let candidate = buy_order("C1", OrderStatus::Pending, dec!(100), dec!(2));
    assert!(!service.check_sufficient_balance(&candidate).await.unwrap());
}

#[tokio::test]
async fn malformed_candidate_is_an_integrity_error() {
    let service = paper_service(StaticOrderFillStore::new(), &[("USD", dec!(1000))]);

    let candidate = buy_order("C1", OrderStatus::Pending, dec!(0), dec!(1));
    let err = service.check_sufficient_balance(&candidate).await.unwrap_err();
    assert!(matches!(err, Error::Integrity(_)));
}

#[tokio::test]
async fn memo_coalesces_live_fetches() {
    let account = Arc::new(
        ScriptedAccount::new().with_results(vec![Ok(balance_sheet(&[("USD", dec!(5))]))]),
    );
    let service = BalanceService::new(
        Arc::new(StaticOrderFillStore::new()),
        Some(account.clone()),
        &live_config(500),
    )
    .unwrap();

    let first = service.balances(false).await.unwrap();
    let second = service.balances(false).await.unwrap();

    assert_eq!(account.call_count(), 1, "burst must reuse the memo");
    assert_eq!(first.asset("USD").total(), dec!(5));
    assert_eq!(second.asset("USD").total(), dec!(5));
}

#[tokio::test]
async fn live_failure_propagates_once_the_memo_expires() {
    let account = Arc::new(ScriptedAccount::new().with_results(vec![
        Ok(balance_sheet(&[("USD", dec!(5))])),
        Err(SourceError::Network("connection reset".to_string())),
    ]));
    let service = BalanceService::new(
        Arc::new(StaticOrderFillStore::new()),
        Some(account.clone()),
        &live_config(50),
    )
    .unwrap();

    assert!(service.balances(false).await.is_ok());

    tokio::time::sleep(Duration::from_millis(80)).await;
    let err = service.balances(false).await.unwrap_err();
    assert!(
        matches!(err, Error::AuthoritativeFetch(SourceError::Network(_))),
        "stale numbers must never stand in for a failed fetch"
    );
    assert_eq!(account.call_count(), 2);
}

#[tokio::test]
async fn invalidate_drops_the_memo() {
    let store = Arc::new(StaticOrderFillStore::new());
    let mut config = paper_config(&[("USD", dec!(1000))]);
    config.memo_ttl_ms = 1000;
    let service = BalanceService::new(store.clone(), None, &config).unwrap();

    assert_eq!(
        service.balances(false).await.unwrap().asset("USD").total(),
        dec!(1000)
    );

    let mut order = buy_order("B1", OrderStatus::Filled, dec!(100), dec!(1));
    order.filled = dec!(1);
    store.push_order(order);
    store.push_fill(fill("F1", "B1", Side::Buy, dec!(100), dec!(1)));

    // Within the TTL the memo still answers; the fill event must
    // invalidate to be seen.
    assert_eq!(
        service.balances(false).await.unwrap().asset("USD").total(),
        dec!(1000)
    );

    service.invalidate();
    assert_eq!(
        service.balances(false).await.unwrap().asset("USD").total(),
        dec!(900)
    );
}

#[tokio::test]
async fn force_bypasses_the_memo() {
    let store = Arc::new(StaticOrderFillStore::new());
    let mut config = paper_config(&[("USD", dec!(1000))]);
    config.memo_ttl_ms = 1000;
    let service = BalanceService::new(store.clone(), None, &config).unwrap();

    assert_eq!(
        service.balances(false).await.unwrap().asset("USD").total(),
        dec!(1000)
    );

    let mut order = buy_order("B1", OrderStatus::Filled, dec!(100), dec!(1));
    order.filled = dec!(1);
    store.push_order(order);
    store.push_fill(fill("F1", "B1", Side::Buy, dec!(100), dec!(1)));

    assert_eq!(
        service.balances(true).await.unwrap().asset("USD").total(),
        dec!(900)
    );
}
