//! Daily market bars and per-date snapshots.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

pub const UNKNOWN_SECTOR: &str = "Unknown";

/// Trailing closes per ticker, oldest first.
pub type PriceHistory = HashMap<String, Vec<f64>>;

#[derive(Debug, Clone, PartialEq)]
pub struct MarketBar {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub sector: String,
}

impl MarketBar {
    /// (close - open) / open, or `None` when open is not a usable price.
    pub fn gain_pct(&self) -> Option<f64> {
        self.has_valid_open()
            .then(|| (self.close - self.open) / self.open)
    }

    /// (high - low) / open, or `None` when open is not a usable price.
    pub fn volatility(&self) -> Option<f64> {
        self.has_valid_open()
            .then(|| (self.high - self.low) / self.open)
    }

    fn has_valid_open(&self) -> bool {
        self.open.is_finite() && self.open != 0.0
    }

    /// Checks the OHLC ordering invariant and a finite, non-negative price set.
    pub fn is_consistent(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.is_finite() && *p >= 0.0)
            && self.high >= self.open.max(self.close).max(self.low)
            && self.low <= self.open.min(self.close).min(self.high)
    }
}

/// All bars for one date, keyed by ticker.
///
/// Backed by a `BTreeMap` so every scan over a snapshot visits tickers in the
/// same order, which keeps selection deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSnapshot {
    pub date: Option<NaiveDate>,
    bars: BTreeMap<String, MarketBar>,
}

impl MarketSnapshot {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            bars: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, bar: MarketBar) {
        self.bars.insert(bar.ticker.clone(), bar);
    }

    pub fn get(&self, ticker: &str) -> Option<&MarketBar> {
        self.bars.get(ticker)
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.bars.contains_key(ticker)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> impl Iterator<Item = &MarketBar> {
        self.bars.values()
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.bars.keys().map(String::as_str)
    }
}

impl FromIterator<MarketBar> for MarketSnapshot {
    fn from_iter<I: IntoIterator<Item = MarketBar>>(iter: I) -> Self {
        let mut snapshot = MarketSnapshot::default();
        for bar in iter {
            if snapshot.date.is_none() {
                snapshot.date = Some(bar.date);
            }
            snapshot.insert(bar);
        }
        snapshot
    }
}
