//! Error types for the crate.
//!
//! Errors are layered: each collaborator seam has its own enum
//! ([`SourceError`] for upstream history/account queries, [`StoreError`] for
//! the key-value backend, [`ConfigError`] for startup validation), and the
//! top-level [`Error`] aggregates them with `#[from]` conversions.
//!
//! Data-quality problems are deliberately *not* part of [`Error`]: a
//! malformed record is skipped with a warning ([`IntegrityError`] describes
//! why) and processing continues. Only infrastructure failures abort an
//! operation.

use rust_decimal::Decimal;
use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Transient upstream failures from the trade history source or the
/// exchange account endpoint.
///
/// These are expected in normal operation and drive the sync coordinator's
/// retry/backoff behavior rather than aborting the process.
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    #[error("upstream request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("upstream rate limit hit: {0}")]
    RateLimited(String),

    #[error("upstream network error: {0}")]
    Network(String),

    #[error("upstream protocol error: {0}")]
    Protocol(String),
}

impl SourceError {
    /// Returns true if the error should advance the rate-limit backoff.
    #[must_use]
    pub const fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }

    /// Returns true if retrying later is reasonable.
    ///
    /// Protocol errors are excluded: a malformed response will not fix
    /// itself on retry.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::RateLimited(_) | Self::Network(_)
        )
    }
}

/// Key-value store failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("key-value backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Why a record was rejected during validation.
///
/// Integrity problems never fail a batch: the offending record is skipped,
/// a warning is logged with the specific reason, and a counter is
/// incremented so the skip is visible in stats.
#[derive(Error, Debug)]
pub enum IntegrityError {
    #[error("empty {field}")]
    EmptyField { field: &'static str },

    #[error("non-positive {field}: {value}")]
    NonPositive { field: &'static str, value: Decimal },

    #[error("negative {field}: {value}")]
    Negative { field: &'static str, value: Decimal },

    #[error("malformed pair '{pair}': expected BASE/QUOTE")]
    MalformedPair { pair: String },

    #[error("fill '{fill_id}' references unknown order '{order_id}'")]
    UnknownOrder { fill_id: String, order_id: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    /// Live-mode balance fetch failed. Always surfaced to the caller;
    /// the balance service never substitutes stale or derived numbers
    /// for the authoritative account state.
    #[error("authoritative balance fetch failed: {0}")]
    AuthoritativeFetch(#[source] SourceError),
}

pub type Result<T> = std::result::Result<T, Error>;
