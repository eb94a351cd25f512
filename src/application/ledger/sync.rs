//! Pulls trade history from the upstream source into the cache.
//!
//! Two kinds of sync share one engine: a paginated full load over a time
//! window and a short incremental pass from the last watermark. Each kind
//! runs single-flight; a second attempt while one is active is skipped,
//! never queued. Rate-limit responses arm an exponential backoff that
//! defers both kinds until it lapses.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::cache::{LedgerCache, PutOutcome};
use crate::domain::TimeRange;
use crate::error::{Error, Result, SourceError};
use crate::infrastructure::config::sync::SyncConfig;
use crate::port::outbound::history::{HistoryQuery, TradeHistorySource};

/// Which sync path is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    Full,
    Incremental,
}

impl SyncKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Incremental => "incremental",
        }
    }
}

/// Options for a full history load.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Window to load; defaults to the cache retention window ending now.
    pub range: Option<TimeRange>,
}

/// How a sync attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The source was drained: a short page marked the end of the window.
    Completed,
    /// Stopped early at the configured trade cap.
    CapReached,
    /// Stopped between pages because shutdown was signalled.
    Cancelled,
    /// Another sync of the same kind was already in flight.
    SkippedInFlight,
    /// A rate-limit backoff was still active.
    Deferred,
}

impl LoadOutcome {
    /// Returns true if the attempt actually talked to the source.
    #[must_use]
    pub const fn ran(&self) -> bool {
        matches!(self, Self::Completed | Self::CapReached | Self::Cancelled)
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Tally of one sync attempt.
#[derive(Debug, Clone, Copy)]
pub struct LoadReport {
    pub outcome: LoadOutcome,
    pub pages: u32,
    pub fetched: usize,
    pub inserted: usize,
    pub refreshed: usize,
    pub skipped: usize,
}

impl LoadReport {
    const fn empty(outcome: LoadOutcome) -> Self {
        Self {
            outcome,
            pages: 0,
            fetched: 0,
            inserted: 0,
            refreshed: 0,
            skipped: 0,
        }
    }

    #[must_use]
    pub const fn outcome_str(&self) -> &'static str {
        match self.outcome {
            LoadOutcome::Completed => "completed",
            LoadOutcome::CapReached => "cap_reached",
            LoadOutcome::Cancelled => "cancelled",
            LoadOutcome::SkippedInFlight => "skipped_in_flight",
            LoadOutcome::Deferred => "deferred",
        }
    }
}

/// Point-in-time view of the coordinator, for diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncStatus {
    pub watermark: Option<DateTime<Utc>>,
    pub full_in_flight: bool,
    pub incremental_in_flight: bool,
    pub synced_trades: u64,
    pub sync_errors: u64,
    pub skipped_syncs: u64,
    pub deferrals: u64,
    pub backoff_remaining: Option<Duration>,
}

/// Exponential backoff armed by rate-limit responses.
struct Backoff {
    delay: Duration,
    until: Option<Instant>,
}

impl Backoff {
    fn new(config: &SyncConfig) -> Self {
        Self {
            delay: config.initial_backoff(),
            until: None,
        }
    }

    /// Arm the backoff with the current delay, then grow it toward the cap.
    fn record_rate_limit(&mut self, config: &SyncConfig) -> Duration {
        let wait = self.delay;
        self.until = Some(Instant::now() + wait);
        self.delay = self.delay.mul_f64(config.backoff_multiplier).min(config.max_backoff());
        wait
    }

    fn reset(&mut self, config: &SyncConfig) {
        self.delay = config.initial_backoff();
        self.until = None;
    }

    /// Time left before syncs may run again, if any.
    fn deferred_for(&self) -> Option<Duration> {
        let until = self.until?;
        let now = Instant::now();
        (until > now).then(|| until - now)
    }
}

/// Clears the in-flight flag on every exit path.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Drives history synchronisation between the source and the cache.
pub struct SyncCoordinator {
    source: Arc<dyn TradeHistorySource>,
    cache: Arc<LedgerCache>,
    config: SyncConfig,
    full_in_flight: AtomicBool,
    incremental_in_flight: AtomicBool,
    watermark: RwLock<Option<DateTime<Utc>>>,
    backoff: Mutex<Backoff>,
    synced_trades: AtomicU64,
    sync_errors: AtomicU64,
    skipped_syncs: AtomicU64,
    deferrals: AtomicU64,
}

impl SyncCoordinator {
    #[must_use]
    pub fn new(
        source: Arc<dyn TradeHistorySource>,
        cache: Arc<LedgerCache>,
        config: SyncConfig,
    ) -> Self {
        let backoff = Backoff::new(&config);
        Self {
            source,
            cache,
            config,
            full_in_flight: AtomicBool::new(false),
            incremental_in_flight: AtomicBool::new(false),
            watermark: RwLock::new(None),
            backoff: Mutex::new(backoff),
            synced_trades: AtomicU64::new(0),
            sync_errors: AtomicU64::new(0),
            skipped_syncs: AtomicU64::new(0),
            deferrals: AtomicU64::new(0),
        }
    }

    /// Timestamp up to which history is known to be cached.
    #[must_use]
    pub fn watermark(&self) -> Option<DateTime<Utc>> {
        *self.watermark.read()
    }

    /// Seed the watermark, e.g. restored by the host across restarts.
    pub fn set_watermark(&self, watermark: DateTime<Utc>) {
        *self.watermark.write() = Some(watermark);
    }

    #[must_use]
    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            watermark: *self.watermark.read(),
            full_in_flight: self.full_in_flight.load(Ordering::SeqCst),
            incremental_in_flight: self.incremental_in_flight.load(Ordering::SeqCst),
            synced_trades: self.synced_trades.load(Ordering::Relaxed),
            sync_errors: self.sync_errors.load(Ordering::Relaxed),
            skipped_syncs: self.skipped_syncs.load(Ordering::Relaxed),
            deferrals: self.deferrals.load(Ordering::Relaxed),
            backoff_remaining: self.backoff.lock().deferred_for(),
        }
    }

    /// Paginated load of a history window.
    pub async fn load_history(&self, options: LoadOptions) -> Result<LoadReport> {
        self.run_sync(SyncKind::Full, options.range, None).await
    }

    /// Full load that checks a shutdown channel between pages.
    pub async fn load_history_with_shutdown(
        &self,
        options: LoadOptions,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<LoadReport> {
        self.run_sync(SyncKind::Full, options.range, Some(shutdown))
            .await
    }

    /// Sync the window from the watermark to now.
    pub async fn sync_incremental(&self) -> Result<LoadReport> {
        self.run_sync(SyncKind::Incremental, None, None).await
    }

    /// Periodic sync loop: incremental on a fixed interval, full reloads
    /// on a slower one (the first full tick fires at startup). Runs until
    /// the shutdown channel flips or closes.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        const DISABLED_PERIOD: Duration = Duration::from_secs(60 * 60 * 24 * 365);

        let mut full_timer = match self.config.full_sync_interval() {
            Some(period) => tokio::time::interval(period),
            None => tokio::time::interval_at(
                tokio::time::Instant::now() + DISABLED_PERIOD,
                DISABLED_PERIOD,
            ),
        };
        full_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let interval = self.config.interval();
        let mut incremental_timer =
            tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        incremental_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = self.config.interval_secs,
            full_interval_secs = self.config.full_sync_interval_secs,
            source = self.source.source_name(),
            "Sync loop started"
        );

        loop {
            tokio::select! {
                _ = full_timer.tick() => {
                    match self.load_history_with_shutdown(LoadOptions::default(), &shutdown).await {
                        Ok(report) => info!(
                            outcome = report.outcome_str(),
                            pages = report.pages,
                            fetched = report.fetched,
                            inserted = report.inserted,
                            "Full history load finished"
                        ),
                        Err(err) => warn!(error = %err, "Full history load failed"),
                    }
                }
                _ = incremental_timer.tick() => {
                    match self.sync_incremental().await {
                        Ok(report) => debug!(
                            outcome = report.outcome_str(),
                            fetched = report.fetched,
                            inserted = report.inserted,
                            "Incremental sync finished"
                        ),
                        Err(err) => warn!(error = %err, "Incremental sync failed"),
                    }
                }
                changed = shutdown.changed() => {
                    match changed {
                        Ok(()) if !*shutdown.borrow() => continue,
                        _ => {
                            info!("Sync loop stopping");
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn run_sync(
        &self,
        kind: SyncKind,
        range: Option<TimeRange>,
        shutdown: Option<&watch::Receiver<bool>>,
    ) -> Result<LoadReport> {
        let flag = match kind {
            SyncKind::Full => &self.full_in_flight,
            SyncKind::Incremental => &self.incremental_in_flight,
        };
        if flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            self.skipped_syncs.fetch_add(1, Ordering::Relaxed);
            warn!(kind = kind.as_str(), "Sync already in flight, skipping");
            return Ok(LoadReport::empty(LoadOutcome::SkippedInFlight));
        }
        let _guard = InFlightGuard { flag };

        if let Some(remaining) = self.backoff.lock().deferred_for() {
            self.deferrals.fetch_add(1, Ordering::Relaxed);
            info!(
                kind = kind.as_str(),
                remaining_ms = remaining.as_millis() as u64,
                "Rate limit backoff active, deferring sync"
            );
            return Ok(LoadReport::empty(LoadOutcome::Deferred));
        }

        let range = self.effective_range(kind, range);
        if range.is_empty() {
            return Ok(LoadReport::empty(LoadOutcome::Completed));
        }

        debug!(
            kind = kind.as_str(),
            start = %range.start,
            end = %range.end,
            "Sync started"
        );

        let mut report = LoadReport::empty(LoadOutcome::Completed);
        let mut query = HistoryQuery::first_page(range, self.config.page_size);
        let mut max_seen: Option<DateTime<Utc>> = None;

        loop {
            if let Some(shutdown) = shutdown {
                if *shutdown.borrow() {
                    info!(
                        kind = kind.as_str(),
                        pages = report.pages,
                        "Sync cancelled by shutdown"
                    );
                    report.outcome = LoadOutcome::Cancelled;
                    break;
                }
            }

            let fetch = self.source.fetch_trades(&query);
            let page = match tokio::time::timeout(self.config.request_timeout(), fetch).await {
                Ok(Ok(page)) => page,
                Ok(Err(err)) => return Err(self.fail(kind, err)),
                Err(_) => {
                    return Err(self.fail(
                        kind,
                        SourceError::Timeout {
                            timeout_ms: self.config.request_timeout_ms,
                        },
                    ))
                }
            };
            self.backoff.lock().reset(&self.config);

            report.pages += 1;
            report.fetched += page.len();
            let short = page.len() < self.config.page_size;

            for trade in &page {
                max_seen = Some(max_seen.map_or(trade.timestamp, |cur| cur.max(trade.timestamp)));
                match self.cache.put(trade).await? {
                    PutOutcome::Inserted => report.inserted += 1,
                    PutOutcome::Refreshed => report.refreshed += 1,
                    PutOutcome::Skipped => report.skipped += 1,
                }
            }
            self.synced_trades
                .fetch_add((report.inserted + report.refreshed) as u64, Ordering::Relaxed);

            if short {
                report.outcome = LoadOutcome::Completed;
                break;
            }
            if report.fetched >= self.config.max_total_trades {
                warn!(
                    kind = kind.as_str(),
                    fetched = report.fetched,
                    cap = self.config.max_total_trades,
                    "Trade cap reached before history was exhausted"
                );
                report.outcome = LoadOutcome::CapReached;
                break;
            }
            query = query.advanced(page.len());
        }

        // Completed covers the whole window; a capped or cancelled run
        // only vouches for what it actually saw.
        match report.outcome {
            LoadOutcome::Completed => {
                self.advance_watermark(max_seen.map_or(range.end, |ts| ts.max(range.end)));
            }
            LoadOutcome::CapReached | LoadOutcome::Cancelled => {
                if let Some(ts) = max_seen {
                    self.advance_watermark(ts);
                }
            }
            LoadOutcome::SkippedInFlight | LoadOutcome::Deferred => {}
        }

        debug!(
            kind = kind.as_str(),
            outcome = report.outcome_str(),
            pages = report.pages,
            fetched = report.fetched,
            inserted = report.inserted,
            refreshed = report.refreshed,
            skipped = report.skipped,
            "Sync finished"
        );
        Ok(report)
    }

    /// Window to fetch. Full loads default to the retention window and
    /// skip ahead to the watermark when one exists inside it; incremental
    /// windows start at the watermark.
    fn effective_range(&self, kind: SyncKind, range: Option<TimeRange>) -> TimeRange {
        let now = Utc::now();
        let retention_start = now - self.cache.retention_window();
        let watermark = *self.watermark.read();
        match kind {
            SyncKind::Full => {
                let range =
                    range.unwrap_or_else(|| TimeRange::new(retention_start, now));
                match watermark {
                    Some(mark) if mark > range.start && mark < range.end => {
                        TimeRange::new(mark, range.end)
                    }
                    _ => range,
                }
            }
            SyncKind::Incremental => {
                let start = watermark.unwrap_or(retention_start);
                TimeRange::new(start, now)
            }
        }
    }

    fn advance_watermark(&self, candidate: DateTime<Utc>) {
        let mut watermark = self.watermark.write();
        if watermark.map_or(true, |current| candidate > current) {
            *watermark = Some(candidate);
        }
    }

    fn fail(&self, kind: SyncKind, err: SourceError) -> Error {
        self.sync_errors.fetch_add(1, Ordering::Relaxed);
        if err.is_rate_limit() {
            let wait = self.backoff.lock().record_rate_limit(&self.config);
            warn!(
                kind = kind.as_str(),
                error = %err,
                wait_ms = wait.as_millis() as u64,
                "Rate limited, backing off"
            );
        } else {
            warn!(kind = kind.as_str(), error = %err, "Sync request failed");
        }
        Error::Source(err)
    }
}
