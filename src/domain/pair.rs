//! Trading pair identifier.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A trading pair in `BASE/QUOTE` notation, e.g. `BTC/USD`.
///
/// The inner String is private to ensure all construction goes through
/// the defined constructors. The pair is stored verbatim; use
/// [`Pair::split`] (or [`Pair::base`] / [`Pair::quote`]) to access the
/// two legs. Splitting fails for strings without exactly one `/`
/// separating two non-empty symbols - callers that need the legs treat
/// that as a data-integrity problem and skip the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair(String);

impl Pair {
    /// Create a new `Pair` from a string.
    pub fn new(pair: impl Into<String>) -> Self {
        Self(pair.into())
    }

    /// Get the pair as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into `(base, quote)` symbols.
    ///
    /// Returns `None` unless the pair is exactly `BASE/QUOTE` with both
    /// sides non-empty.
    #[must_use]
    pub fn split(&self) -> Option<(&str, &str)> {
        let (base, quote) = self.0.split_once('/')?;
        if base.is_empty() || quote.is_empty() || quote.contains('/') {
            return None;
        }
        Some((base, quote))
    }

    /// The base (traded) asset symbol, if the pair is well-formed.
    #[must_use]
    pub fn base(&self) -> Option<&str> {
        self.split().map(|(base, _)| base)
    }

    /// The quote (pricing) asset symbol, if the pair is well-formed.
    #[must_use]
    pub fn quote(&self) -> Option<&str> {
        self.split().map(|(_, quote)| quote)
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Pair {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Pair {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
