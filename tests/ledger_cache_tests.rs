//! Tests for the hour-bucketed ledger cache.

mod support;

use std::sync::Arc;

use backoffice::adapter::outbound::memory::MemoryKv;
use backoffice::application::ledger::keys::{self, Keys};
use backoffice::application::ledger::{LedgerCache, PutOutcome};
use backoffice::domain::{Pair, TimeRange, TradeId};
use backoffice::port::outbound::kv::KvStore;
use backoffice::testkit::domain::trade;
use chrono::{DateTime, Duration, Utc};
use rust_decimal_macros::dec;

use support::config::test_cache_config;

fn cache_with_store(prefix: &str) -> (Arc<MemoryKv>, LedgerCache) {
    let store = Arc::new(MemoryKv::new());
    let cache = LedgerCache::new(store.clone(), &test_cache_config(prefix));
    (store, cache)
}

/// A recent, mid-hour timestamp safely inside the retention window.
fn recent_hour() -> DateTime<Utc> {
    keys::bucket_start(Utc::now() - Duration::hours(3))
}

#[tokio::test]
async fn cached_trade_round_trips() {
    let (_, cache) = cache_with_store("roundtrip");
    let trade = trade("T1", "BTC/USD", recent_hour() + Duration::minutes(5));

    assert_eq!(cache.put(&trade).await.unwrap(), PutOutcome::Inserted);

    let found = cache.get_by_id(&trade.id, None).await.unwrap().unwrap();
    assert_eq!(found.id, trade.id);
    assert_eq!(found.pair, trade.pair);
    assert_eq!(found.price, trade.price);
    assert_eq!(found.volume, trade.volume);
    assert_eq!(found.timestamp, trade.timestamp);
}

#[tokio::test]
async fn re_put_refreshes_without_duplicating() {
    let (store, cache) = cache_with_store("idem");
    let keys = Keys::new("idem");
    let trade = trade("T1", "BTC/USD", recent_hour() + Duration::minutes(5));

    assert_eq!(cache.put(&trade).await.unwrap(), PutOutcome::Inserted);
    assert_eq!(cache.put(&trade).await.unwrap(), PutOutcome::Refreshed);
    assert_eq!(cache.put(&trade).await.unwrap(), PutOutcome::Refreshed);

    let bucket = keys.bucket(trade.timestamp);
    assert_eq!(store.hash_len(&bucket).await.unwrap(), 1);

    let stats = cache.stats().await.unwrap();
    assert_eq!(stats.trades, 1, "bucket count must not grow on re-put");
}

#[tokio::test]
async fn same_hour_shares_a_bucket_and_the_next_hour_does_not() {
    let (store, cache) = cache_with_store("buckets");
    let keys = Keys::new("buckets");
    let hour = recent_hour();

    cache
        .put(&trade("T1", "BTC/USD", hour + Duration::minutes(5)))
        .await
        .unwrap();
    cache
        .put(&trade("T2", "BTC/USD", hour + Duration::minutes(59)))
        .await
        .unwrap();
    cache
        .put(&trade("T3", "BTC/USD", hour + Duration::minutes(61)))
        .await
        .unwrap();

    assert_eq!(store.hash_len(&keys.bucket(hour)).await.unwrap(), 2);
    assert_eq!(
        store
            .hash_len(&keys.bucket(hour + Duration::hours(1)))
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn hint_spanning_several_buckets_finds_the_trade() {
    let (_, cache) = cache_with_store("hint");
    let hour = recent_hour();
    let trade = trade("T1", "BTC/USD", hour + Duration::minutes(30));
    cache.put(&trade).await.unwrap();

    let wide = TimeRange::new(hour - Duration::hours(1), hour + Duration::hours(2));
    let found = cache.get_by_id(&trade.id, Some(&wide)).await.unwrap();
    assert_eq!(found.unwrap().id, trade.id);

    let elsewhere = TimeRange::new(hour - Duration::hours(3), hour - Duration::hours(2));
    assert!(cache
        .get_by_id(&trade.id, Some(&elsewhere))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn lookup_survives_a_lost_locator() {
    let (store, cache) = cache_with_store("scan");
    let keys = Keys::new("scan");
    let trade = trade("T1", "BTC/USD", recent_hour() + Duration::minutes(5));
    cache.put(&trade).await.unwrap();

    assert!(store.remove(&keys.trade(&trade.id)));

    let found = cache.get_by_id(&trade.id, None).await.unwrap();
    assert_eq!(found.unwrap().id, trade.id);
}

#[tokio::test]
async fn unknown_id_returns_none_after_the_scan() {
    let (_, cache) = cache_with_store("missing");
    cache
        .put(&trade("T1", "BTC/USD", recent_hour()))
        .await
        .unwrap();

    let missing = cache
        .get_by_id(&TradeId::new("nope"), None)
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn pair_queries_return_newest_first_up_to_limit() {
    let (_, cache) = cache_with_store("pairs");
    let hour = recent_hour();

    cache.put(&trade("T1", "BTC/USD", hour)).await.unwrap();
    cache
        .put(&trade("T2", "BTC/USD", hour + Duration::minutes(1)))
        .await
        .unwrap();
    cache
        .put(&trade("T3", "BTC/USD", hour + Duration::minutes(2)))
        .await
        .unwrap();
    cache
        .put(&trade("E1", "ETH/USD", hour + Duration::minutes(3)))
        .await
        .unwrap();

    let btc = cache
        .get_by_pair(&Pair::new("BTC/USD"), 2)
        .await
        .unwrap();
    assert_eq!(btc.len(), 2);
    assert_eq!(btc[0].id.as_str(), "T3");
    assert_eq!(btc[1].id.as_str(), "T2");

    let eth = cache.get_by_pair(&Pair::new("ETH/USD"), 10).await.unwrap();
    assert_eq!(eth.len(), 1);
    assert_eq!(eth[0].id.as_str(), "E1");

    assert!(cache
        .get_by_pair(&Pair::new("BTC/USD"), 0)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn expired_entries_are_skipped_when_resolving_indices() {
    let (store, cache) = cache_with_store("expiry");
    let keys = Keys::new("expiry");
    let hour = recent_hour();

    let alive = trade("T1", "BTC/USD", hour);
    let lost_locator = trade("T2", "BTC/USD", hour + Duration::minutes(1));
    let lost_record = trade("T3", "BTC/USD", hour + Duration::minutes(2));
    for t in [&alive, &lost_locator, &lost_record] {
        cache.put(t).await.unwrap();
    }

    // Simulate value expiry two ways: locator gone, and record gone from
    // its bucket while the locator lingers.
    assert!(store.remove(&keys.trade(&lost_locator.id)));
    assert!(store
        .hash_del(&keys.bucket(lost_record.timestamp), lost_record.id.as_str())
        .await
        .unwrap());

    let trades = cache.get_by_pair(&Pair::new("BTC/USD"), 10).await.unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].id.as_str(), "T1");
}

#[tokio::test]
async fn recent_queries_cut_at_since() {
    let (_, cache) = cache_with_store("recent");
    let hour = recent_hour();

    cache.put(&trade("T1", "BTC/USD", hour)).await.unwrap();
    cache
        .put(&trade("T2", "ETH/USD", hour + Duration::minutes(10)))
        .await
        .unwrap();
    cache
        .put(&trade("T3", "BTC/USD", hour + Duration::minutes(20)))
        .await
        .unwrap();

    let all = cache.get_recent(10, None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].id.as_str(), "T3");
    assert_eq!(all[2].id.as_str(), "T1");

    let since = cache
        .get_recent(10, Some(hour + Duration::minutes(10)))
        .await
        .unwrap();
    assert_eq!(since.len(), 2, "records older than since are cut");
    assert_eq!(since[1].id.as_str(), "T2");

    let capped = cache.get_recent(1, None).await.unwrap();
    assert_eq!(capped.len(), 1);
    assert_eq!(capped[0].id.as_str(), "T3");
}

#[tokio::test]
async fn stats_walk_buckets_and_mark_processed_flags_them() {
    let (_, cache) = cache_with_store("stats");
    let hour = recent_hour();

    cache
        .put(&trade("T1", "BTC/USD", hour + Duration::minutes(5)))
        .await
        .unwrap();
    cache
        .put(&trade("T2", "BTC/USD", hour + Duration::minutes(10)))
        .await
        .unwrap();
    cache
        .put(&trade("T3", "BTC/USD", hour + Duration::minutes(65)))
        .await
        .unwrap();

    let stats = cache.stats().await.unwrap();
    assert_eq!(stats.buckets, 2);
    assert_eq!(stats.trades, 3);
    assert_eq!(stats.processed_buckets, 0);
    assert_eq!(stats.oldest_bucket, Some(hour));
    assert_eq!(stats.newest_bucket, Some(hour + Duration::hours(1)));

    assert!(cache.mark_processed(hour + Duration::minutes(30)).await.unwrap());
    assert!(
        !cache
            .mark_processed(hour + Duration::hours(5))
            .await
            .unwrap(),
        "an hour with no trades has no bucket to mark"
    );

    let stats = cache.stats().await.unwrap();
    assert_eq!(stats.processed_buckets, 1);
}

#[tokio::test]
async fn integrity_failures_are_counted_not_propagated() {
    let (_, cache) = cache_with_store("integrity");

    let mut bad_price = trade("T1", "BTC/USD", recent_hour());
    bad_price.price = dec!(0);
    let bad_pair = trade("T2", "BTCUSD", recent_hour());

    assert_eq!(cache.put(&bad_price).await.unwrap(), PutOutcome::Skipped);
    assert_eq!(cache.put(&bad_pair).await.unwrap(), PutOutcome::Skipped);

    let stats = cache.stats().await.unwrap();
    assert_eq!(stats.buckets, 0, "skipped records must not create buckets");
    assert_eq!(stats.skipped_records, 2);
}
