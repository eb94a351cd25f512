//! Mock [`ExchangeAccount`] implementation for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::BalanceSheet;
use crate::error::SourceError;
use crate::port::outbound::account::ExchangeAccount;

/// An account with scripted balance fetch results.
///
/// Each call to `fetch_balances()` pops the next result from the queue
/// (defaults to an empty sheet when exhausted).
pub struct ScriptedAccount {
    results: Mutex<VecDeque<Result<BalanceSheet, SourceError>>>,
    call_count: Arc<AtomicU32>,
}

impl ScriptedAccount {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            call_count: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_results(self, results: Vec<Result<BalanceSheet, SourceError>>) -> Self {
        *self.results.lock().unwrap() = results.into();
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Shared counter, for asserting after the account moved into an `Arc`.
    pub fn counter(&self) -> Arc<AtomicU32> {
        self.call_count.clone()
    }
}

impl Default for ScriptedAccount {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeAccount for ScriptedAccount {
    async fn fetch_balances(&self) -> Result<BalanceSheet, SourceError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(BalanceSheet::default()))
    }

    fn account_name(&self) -> &'static str {
        "scripted"
    }
}
