//! Trade history source port.

use async_trait::async_trait;

use crate::domain::{TimeRange, TradeRecord};
use crate::error::SourceError;

/// One page request against the upstream trade history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Time window to query.
    pub range: TimeRange,
    /// Offset of the first trade to return within the window.
    pub offset: usize,
    /// Maximum number of trades to return.
    pub limit: usize,
}

impl HistoryQuery {
    /// First page of a window.
    #[must_use]
    pub const fn first_page(range: TimeRange, limit: usize) -> Self {
        Self {
            range,
            offset: 0,
            limit,
        }
    }

    /// The same window advanced by `count` trades.
    #[must_use]
    pub const fn advanced(&self, count: usize) -> Self {
        Self {
            range: self.range,
            offset: self.offset + count,
            limit: self.limit,
        }
    }
}

/// Paginated access to the account's executed trades.
///
/// Implementations wrap an exchange REST client or, for paper sessions,
/// the synthetic generator. A page shorter than `query.limit` signals the
/// end of the window; the sync coordinator never requests past it.
#[async_trait]
pub trait TradeHistorySource: Send + Sync {
    /// Fetch one page of trades inside the query window.
    ///
    /// Trades may arrive in any order within the page; the cache buckets
    /// them by their own timestamps.
    async fn fetch_trades(&self, query: &HistoryQuery) -> Result<Vec<TradeRecord>, SourceError>;

    /// Source name for logging/debugging.
    fn source_name(&self) -> &'static str;
}
