//! Mock [`TradeHistorySource`] implementations for testing.
//!
//! Three mock source types for different testing needs:
//!
//! - [`ScriptedHistorySource`]: Pre-loaded page results with recorded queries.
//!   Best for: error handling, backoff behavior, pagination bookkeeping.
//!
//! - [`FixedPageSource`]: A fixed run of deterministic trades served by
//!   offset/limit. Best for: full-load pagination and watermark tests.
//!
//! - [`GatedSource`]: Fetches block until a permit is released.
//!   Best for: single-flight and timeout behavior.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal_macros::dec;
use tokio::sync::Semaphore;

use crate::domain::{Pair, Side, TradeId, TradeRecord};
use crate::error::SourceError;
use crate::port::outbound::history::{HistoryQuery, TradeHistorySource};

// ---------------------------------------------------------------------------
// ScriptedHistorySource
// ---------------------------------------------------------------------------

/// A source with scripted page results and a record of every query.
///
/// Each call to `fetch_trades()` pops the next result from the queue
/// (defaults to `Ok(vec![])` when exhausted) and stores the query it was
/// given for later assertions.
pub struct ScriptedHistorySource {
    results: Mutex<VecDeque<Result<Vec<TradeRecord>, SourceError>>>,
    queries: Mutex<Vec<HistoryQuery>>,
    call_count: Arc<AtomicU32>,
}

impl ScriptedHistorySource {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            queries: Mutex::new(Vec::new()),
            call_count: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_results(self, results: Vec<Result<Vec<TradeRecord>, SourceError>>) -> Self {
        *self.results.lock().unwrap() = results.into();
        self
    }

    /// Queries received so far, in call order.
    pub fn queries(&self) -> Vec<HistoryQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Shared counter, for asserting after the source moved into an `Arc`.
    pub fn counter(&self) -> Arc<AtomicU32> {
        self.call_count.clone()
    }
}

impl Default for ScriptedHistorySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TradeHistorySource for ScriptedHistorySource {
    async fn fetch_trades(&self, query: &HistoryQuery) -> Result<Vec<TradeRecord>, SourceError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(*query);
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

// ---------------------------------------------------------------------------
// FixedPageSource
// ---------------------------------------------------------------------------

/// Serves `total` deterministic trades, honoring offset and limit.
///
/// Trade `i` is `trade-{i}` executed at `start + i * spacing`, so page
/// contents are stable across calls and runs. The query range is ignored;
/// pagination is purely offset-driven.
pub struct FixedPageSource {
    total: usize,
    pair: Pair,
    start: DateTime<Utc>,
    spacing: Duration,
    call_count: Arc<AtomicU32>,
}

impl FixedPageSource {
    pub fn new(total: usize, start: DateTime<Utc>) -> Self {
        Self {
            total,
            pair: Pair::new("BTC/USD"),
            start,
            spacing: Duration::seconds(60),
            call_count: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_spacing(mut self, spacing: Duration) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn counter(&self) -> Arc<AtomicU32> {
        self.call_count.clone()
    }

    /// The trade this source serves at `index`, for building expectations.
    pub fn trade_at(&self, index: usize) -> TradeRecord {
        TradeRecord {
            id: TradeId::new(format!("trade-{index}")),
            pair: self.pair.clone(),
            side: Side::Buy,
            price: dec!(100),
            volume: dec!(1),
            cost: dec!(100),
            fee: dec!(0.1),
            timestamp: self.start + self.spacing * (index as i32),
            order_id: None,
        }
    }
}

#[async_trait]
impl TradeHistorySource for FixedPageSource {
    async fn fetch_trades(&self, query: &HistoryQuery) -> Result<Vec<TradeRecord>, SourceError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let from = query.offset.min(self.total);
        let to = (query.offset + query.limit).min(self.total);
        Ok((from..to).map(|i| self.trade_at(i)).collect())
    }

    fn source_name(&self) -> &'static str {
        "fixed"
    }
}

// ---------------------------------------------------------------------------
// GatedSource
// ---------------------------------------------------------------------------

/// Wraps another source; every fetch waits for a semaphore permit first.
///
/// Start with zero permits to make fetches hang (timeouts, in-flight
/// overlap), then `add_permits` to release them one page at a time.
pub struct GatedSource<S> {
    permits: Arc<Semaphore>,
    inner: S,
}

impl<S> GatedSource<S> {
    pub fn new(permits: Arc<Semaphore>, inner: S) -> Self {
        Self { permits, inner }
    }
}

#[async_trait]
impl<S: TradeHistorySource> TradeHistorySource for GatedSource<S> {
    async fn fetch_trades(&self, query: &HistoryQuery) -> Result<Vec<TradeRecord>, SourceError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| SourceError::Network("gate closed".to_string()))?;
        self.inner.fetch_trades(query).await
    }

    fn source_name(&self) -> &'static str {
        "gated"
    }
}
