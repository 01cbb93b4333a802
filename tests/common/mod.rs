#![allow(dead_code)]

use chrono::NaiveDate;
use daytrader::domain::config::EngineConfig;
use daytrader::domain::error::DaytraderError;
pub use daytrader::domain::market::{MarketBar, MarketSnapshot};
use daytrader::ports::data_port::SnapshotProvider;
use std::collections::{BTreeMap, BTreeSet};

pub struct MockSnapshotProvider {
    pub snapshots: BTreeMap<NaiveDate, MarketSnapshot>,
    pub errors: BTreeSet<NaiveDate>,
}

impl MockSnapshotProvider {
    pub fn new() -> Self {
        Self {
            snapshots: BTreeMap::new(),
            errors: BTreeSet::new(),
        }
    }

    pub fn with_bar(mut self, bar: MarketBar) -> Self {
        self.snapshots
            .entry(bar.date)
            .or_insert_with(|| MarketSnapshot::new(bar.date))
            .insert(bar);
        self
    }

    pub fn with_error(mut self, date: NaiveDate) -> Self {
        self.errors.insert(date);
        self
    }
}

impl SnapshotProvider for MockSnapshotProvider {
    fn get_snapshot(&self, date: NaiveDate) -> Result<MarketSnapshot, DaytraderError> {
        if self.errors.contains(&date) {
            return Err(DaytraderError::Data {
                reason: format!("feed unavailable on {date}"),
            });
        }
        Ok(self
            .snapshots
            .get(&date)
            .cloned()
            .unwrap_or_else(|| MarketSnapshot::new(date)))
    }

    fn tickers(&self) -> Vec<String> {
        let tickers: BTreeSet<String> = self
            .snapshots
            .values()
            .flat_map(|s| s.tickers().map(String::from).collect::<Vec<_>>())
            .collect();
        tickers.into_iter().collect()
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(ticker: &str, date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> MarketBar {
    MarketBar {
        ticker: ticker.to_string(),
        date,
        open,
        high,
        low,
        close,
        volume: 2_000_000,
        sector: "Tech".to_string(),
    }
}

/// The 407.41 → 411.60 bar: normal regime, neutral signal, close exit.
pub fn close_exit_bar(ticker: &str, date: NaiveDate) -> MarketBar {
    make_bar(ticker, date, 407.41, 415.0, 405.0, 411.60)
}

pub fn engine_with(tickers: &[&str]) -> EngineConfig {
    EngineConfig {
        ticker_universe: tickers.iter().map(|t| t.to_string()).collect(),
        ..EngineConfig::default()
    }
}
