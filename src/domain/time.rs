//! Time window types used by queries and sync.

use chrono::{DateTime, Duration, Utc};

/// A half-open UTC time window `[start, end)`.
///
/// Used for history queries, sync windows, and as the lookup hint for
/// trade reads. An inverted range (`end <= start`) is permitted and simply
/// contains nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    /// Inclusive lower bound.
    pub start: DateTime<Utc>,
    /// Exclusive upper bound.
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a new range.
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The window ending now and reaching `window` back in time.
    #[must_use]
    pub fn last(window: Duration) -> Self {
        let end = Utc::now();
        Self {
            start: end - window,
            end,
        }
    }

    /// Returns true if `ts` falls inside the window.
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }

    /// Window length. Zero for inverted ranges.
    #[must_use]
    pub fn duration(&self) -> Duration {
        (self.end - self.start).max(Duration::zero())
    }

    /// Returns true if the window contains no instants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}
