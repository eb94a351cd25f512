//! Synthetic trade history source for paper trading sessions.
//!
//! Generates plausible executed trades on demand. The generator sits
//! behind the same [`TradeHistorySource`] port as a real exchange client,
//! so synthetic data flows through the identical sync and caching path;
//! nothing downstream knows or cares that the trades are invented.
//!
//! Generation is deterministic per `(seed, window, index)`: re-fetching
//! the same window yields byte-identical trades, which keeps repeated
//! paper-mode loads idempotent in the cache.

use async_trait::async_trait;
use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{Pair, Side, TradeId, TradeRecord};
use crate::error::SourceError;
use crate::port::outbound::history::{HistoryQuery, TradeHistorySource};

/// Tuning knobs for the synthetic generator.
#[derive(Debug, Clone, Deserialize)]
pub struct SyntheticConfig {
    /// Pairs to draw from, `BASE/QUOTE` notation.
    #[serde(default = "default_pairs")]
    pub pairs: Vec<String>,

    /// Average number of trades generated per hour of window.
    #[serde(default = "default_trades_per_hour")]
    pub trades_per_hour: u32,

    /// Lower bound of the price band.
    #[serde(default = "default_min_price")]
    pub min_price: Decimal,

    /// Upper bound of the price band.
    #[serde(default = "default_max_price")]
    pub max_price: Decimal,

    /// Lower bound of the volume band.
    #[serde(default = "default_min_volume")]
    pub min_volume: Decimal,

    /// Upper bound of the volume band.
    #[serde(default = "default_max_volume")]
    pub max_volume: Decimal,

    /// Fee as a fraction of cost (0.0026 = 26 bps).
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Decimal,

    /// Seed for reproducible sessions. `None` draws one at construction.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_pairs() -> Vec<String> {
    vec!["BTC/USD".to_string(), "ETH/USD".to_string()]
}

fn default_trades_per_hour() -> u32 {
    60
}

fn default_min_price() -> Decimal {
    Decimal::from(95)
}

fn default_max_price() -> Decimal {
    Decimal::from(105)
}

fn default_min_volume() -> Decimal {
    Decimal::new(1, 1) // 0.1
}

fn default_max_volume() -> Decimal {
    Decimal::from(2)
}

fn default_fee_rate() -> Decimal {
    Decimal::new(26, 4) // 0.0026
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            pairs: default_pairs(),
            trades_per_hour: default_trades_per_hour(),
            min_price: default_min_price(),
            max_price: default_max_price(),
            min_volume: default_min_volume(),
            max_volume: default_max_volume(),
            fee_rate: default_fee_rate(),
            seed: None,
        }
    }
}

/// A [`TradeHistorySource`] that invents its trades.
pub struct SyntheticHistorySource {
    config: SyntheticConfig,
    seed: u64,
}

impl SyntheticHistorySource {
    /// Create a generator from config, drawing a random seed if none is
    /// configured.
    #[must_use]
    pub fn new(config: SyntheticConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self { config, seed }
    }

    /// The seed in use, for logging reproducible sessions.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Total trades the generator will emit for a window.
    fn window_total(&self, query: &HistoryQuery) -> usize {
        let secs = query.range.duration().num_seconds().max(0) as u64;
        (secs * u64::from(self.config.trades_per_hour) / 3600) as usize
    }

    fn sample(&self, rng: &mut StdRng, lo: Decimal, hi: Decimal, dp: u32) -> Decimal {
        let fraction = Decimal::from_f64(rng.gen::<f64>()).unwrap_or(Decimal::ZERO);
        (lo + (hi - lo) * fraction).round_dp(dp)
    }

    /// Deterministically generate the `index`-th trade of a window.
    fn generate(&self, query: &HistoryQuery, total: usize, index: usize) -> TradeRecord {
        // Seed mixes the window start so distinct windows yield distinct
        // trade ids; identical windows replay identically.
        let window_salt = query.range.start.timestamp() as u64;
        let mut rng = StdRng::seed_from_u64(
            self.seed ^ window_salt.rotate_left(17) ^ (index as u64).wrapping_mul(0x9E37_79B9),
        );

        let spacing = query.range.duration().num_seconds().max(1) / total.max(1) as i64;
        let timestamp = query.range.start + Duration::seconds(spacing * index as i64 + spacing / 2);

        let pair_index = rng.gen_range(0..self.config.pairs.len().max(1));
        let pair = self
            .config
            .pairs
            .get(pair_index)
            .map_or_else(|| Pair::new("BTC/USD"), |p| Pair::new(p.clone()));

        let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
        let price = self.sample(&mut rng, self.config.min_price, self.config.max_price, 2);
        let volume = self.sample(&mut rng, self.config.min_volume, self.config.max_volume, 4);
        let cost = (price * volume).round_dp(4);
        let fee = (cost * self.config.fee_rate).round_dp(4);

        let id = uuid::Builder::from_random_bytes(rng.gen()).into_uuid();

        TradeRecord {
            id: TradeId::new(id.to_string()),
            pair,
            side,
            price,
            volume,
            cost,
            fee,
            timestamp,
            order_id: None,
        }
    }
}

#[async_trait]
impl TradeHistorySource for SyntheticHistorySource {
    async fn fetch_trades(&self, query: &HistoryQuery) -> Result<Vec<TradeRecord>, SourceError> {
        let total = self.window_total(query);
        if query.offset >= total || query.limit == 0 {
            return Ok(Vec::new());
        }

        let end = total.min(query.offset + query.limit);
        let trades = (query.offset..end)
            .map(|index| self.generate(query, total, index))
            .collect();
        Ok(trades)
    }

    fn source_name(&self) -> &'static str {
        "synthetic"
    }
}
