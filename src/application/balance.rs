//! Balance reconstruction and sufficiency checks.
//!
//! Paper mode replays the account's own history: totals start from the
//! configured deposits and move with every fill, reservations are
//! recomputed from scratch over the currently resting orders. Live mode
//! asks the exchange and treats its answer as authoritative; a failed
//! fetch is an error, never silently replaced by a derived or stale
//! sheet.
//!
//! Either way the sheet is memoised for a sub-second TTL so a burst of
//! sufficiency checks costs one computation, and [`BalanceService::invalidate`]
//! drops the memo the moment an order or fill event changes the truth.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::domain::{Amount, AssetBalance, BalanceSheet, Order, OrderId, Side};
use crate::error::{ConfigError, Error, IntegrityError, Result};
use crate::infrastructure::config::balance::{BalanceConfig, BalanceMode};
use crate::port::outbound::account::ExchangeAccount;
use crate::port::outbound::orders::OrderFillStore;

struct Memo {
    sheet: BalanceSheet,
    at: Instant,
}

/// Computes and serves the account's balance sheet.
pub struct BalanceService {
    orders: Arc<dyn OrderFillStore>,
    account: Option<Arc<dyn ExchangeAccount>>,
    mode: BalanceMode,
    initial_deposits: HashMap<String, Amount>,
    memo_ttl: Duration,
    memo: Mutex<Option<Memo>>,
    skipped: AtomicU64,
}

impl BalanceService {
    /// Build the service. Live mode requires an exchange account port.
    pub fn new(
        orders: Arc<dyn OrderFillStore>,
        account: Option<Arc<dyn ExchangeAccount>>,
        config: &BalanceConfig,
    ) -> Result<Self> {
        if config.mode == BalanceMode::Live && account.is_none() {
            return Err(ConfigError::MissingField {
                field: "exchange_account",
            }
            .into());
        }
        Ok(Self {
            orders,
            account,
            mode: config.mode,
            initial_deposits: config.initial_deposits.clone(),
            memo_ttl: config.memo_ttl(),
            memo: Mutex::new(None),
            skipped: AtomicU64::new(0),
        })
    }

    #[must_use]
    pub fn mode(&self) -> BalanceMode {
        self.mode
    }

    /// Records skipped during balance replay since construction.
    #[must_use]
    pub fn skipped_records(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Drop the memoised sheet. Call on order create, cancel and fill.
    pub fn invalidate(&self) {
        *self.memo.lock() = None;
        debug!("Balance memo invalidated");
    }

    /// Current balance sheet, memoised for the configured TTL.
    ///
    /// `force` bypasses the memo. In live mode an expired memo plus a
    /// failed fetch is [`Error::AuthoritativeFetch`]; the stale sheet is
    /// never returned.
    pub async fn balances(&self, force: bool) -> Result<BalanceSheet> {
        if !force {
            if let Some(memo) = self.memo.lock().as_ref() {
                if memo.at.elapsed() < self.memo_ttl {
                    return Ok(memo.sheet.clone());
                }
            }
        }

        let sheet = match self.mode {
            BalanceMode::Live => self.fetch_live().await?,
            BalanceMode::Paper => self.derive_paper().await?,
        };

        *self.memo.lock() = Some(Memo {
            sheet: sheet.clone(),
            at: Instant::now(),
        });
        Ok(sheet)
    }

    /// Whether the account can afford `candidate` right now.
    ///
    /// A buy needs `price * remaining` of the quote asset available, a
    /// sell needs `remaining` of the base asset. Exactly enough counts
    /// as sufficient; a shortfall is `Ok(false)`, not an error.
    pub async fn check_sufficient_balance(&self, candidate: &Order) -> Result<bool> {
        candidate.validate().map_err(Error::Integrity)?;
        let Some((base, quote)) = candidate.pair.split() else {
            return Err(IntegrityError::MalformedPair {
                pair: candidate.pair.as_str().to_string(),
            }
            .into());
        };

        let sheet = self.balances(false).await?;
        let (asset, required) = match candidate.side {
            Side::Buy => (quote, candidate.price * candidate.remaining()),
            Side::Sell => (base, candidate.remaining()),
        };
        let available = sheet.asset(asset).available();

        debug!(
            order_id = %candidate.id,
            asset,
            %required,
            %available,
            "Sufficiency check"
        );
        Ok(available >= required)
    }

    async fn fetch_live(&self) -> Result<BalanceSheet> {
        let account = self.account.as_ref().ok_or(ConfigError::MissingField {
            field: "exchange_account",
        })?;
        account
            .fetch_balances()
            .await
            .map_err(Error::AuthoritativeFetch)
    }

    async fn derive_paper(&self) -> Result<BalanceSheet> {
        let orders = self.orders.list_orders().await?;
        let fills = self.orders.list_fills().await?;

        let orders_by_id: HashMap<&OrderId, &Order> =
            orders.iter().map(|order| (&order.id, order)).collect();

        let mut totals: HashMap<String, Decimal> = self
            .initial_deposits
            .iter()
            .map(|(asset, amount)| (asset.clone(), *amount))
            .collect();

        for fill in &fills {
            if let Err(reason) = fill.validate() {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                warn!(fill_id = %fill.id, error = %reason, "Skipping malformed fill in balance replay");
                continue;
            }
            let Some(order) = orders_by_id.get(&fill.order_id) else {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    fill_id = %fill.id,
                    order_id = %fill.order_id,
                    "Fill references unknown order, skipping"
                );
                continue;
            };
            let Some((base, quote)) = order.pair.split() else {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                warn!(order_id = %order.id, pair = %order.pair, "Malformed pair, skipping fill");
                continue;
            };

            let notional = fill.price * fill.size;
            match fill.side {
                Side::Buy => {
                    *totals.entry(base.to_string()).or_default() += fill.size;
                    *totals.entry(quote.to_string()).or_default() -= notional;
                }
                Side::Sell => {
                    *totals.entry(base.to_string()).or_default() -= fill.size;
                    *totals.entry(quote.to_string()).or_default() += notional;
                }
            }
        }

        // Reservations are not carried forward; they are rebuilt from
        // whatever is resting on the book right now.
        let mut reserved: HashMap<String, Decimal> = HashMap::new();
        for order in &orders {
            if !order.status.reserves_balance() {
                continue;
            }
            if let Err(reason) = order.validate() {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                warn!(order_id = %order.id, error = %reason, "Skipping malformed order in reservation replay");
                continue;
            }
            let Some((base, quote)) = order.pair.split() else {
                continue;
            };
            let remaining = order.remaining();
            if remaining <= Decimal::ZERO {
                continue;
            }
            match order.side {
                Side::Buy => {
                    *reserved.entry(quote.to_string()).or_default() += order.price * remaining;
                }
                Side::Sell => {
                    *reserved.entry(base.to_string()).or_default() += remaining;
                }
            }
        }

        let mut sheet = BalanceSheet::default();
        for (asset, total) in totals {
            let held = reserved.remove(&asset).unwrap_or(Decimal::ZERO);
            sheet.insert(asset, AssetBalance::from_parts(total, held));
        }
        for (asset, held) in reserved {
            sheet.insert(asset, AssetBalance::from_parts(Decimal::ZERO, held));
        }
        Ok(sheet)
    }
}
