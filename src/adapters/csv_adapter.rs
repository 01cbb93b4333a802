//! CSV file market data adapter.
//!
//! Reads one `<TICKER>.csv` per ticker (`date,open,high,low,close,volume`)
//! into an in-memory date index at construction time.

use crate::domain::config::EngineConfig;
use crate::domain::error::DaytraderError;
use crate::domain::market::{MarketBar, MarketSnapshot};
use crate::ports::data_port::SnapshotProvider;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

pub struct CsvSnapshotProvider {
    tickers: Vec<String>,
    by_date: BTreeMap<NaiveDate, Vec<MarketBar>>,
}

fn field<T: FromStr>(record: &csv::StringRecord, index: usize, name: &str) -> Result<T, DaytraderError>
where
    T::Err: std::fmt::Display,
{
    record
        .get(index)
        .ok_or_else(|| DaytraderError::Data {
            reason: format!("missing {name} column"),
        })?
        .trim()
        .parse()
        .map_err(|e| DaytraderError::Data {
            reason: format!("invalid {name} value: {e}"),
        })
}

fn parse_volume(record: &csv::StringRecord) -> Result<u64, DaytraderError> {
    let raw: f64 = field(record, 5, "volume")?;
    if raw.is_finite() && raw >= 0.0 {
        Ok(raw as u64)
    } else {
        Err(DaytraderError::Data {
            reason: format!("invalid volume value: {raw}"),
        })
    }
}

impl CsvSnapshotProvider {
    /// Load the file of every ticker in the engine's universe from
    /// `base_path`, tagging bars with the configured sector. Tickers without a
    /// file are skipped with a warning; malformed files and bars whose prices
    /// contradict each other are an error.
    pub fn load(base_path: &Path, engine: &EngineConfig) -> Result<Self, DaytraderError> {
        let mut by_date: BTreeMap<NaiveDate, Vec<MarketBar>> = BTreeMap::new();
        let mut loaded = Vec::new();

        for ticker in &engine.ticker_universe {
            let path = Self::csv_path(base_path, ticker);
            if !path.exists() {
                warn!(%ticker, path = %path.display(), "no data file, skipping");
                continue;
            }

            let bars = Self::read_bars(&path, ticker, engine.sector_of(ticker))?;
            debug!(%ticker, bars = bars.len(), "loaded");

            for bar in bars {
                by_date.entry(bar.date).or_default().push(bar);
            }
            loaded.push(ticker.clone());
        }

        Ok(Self {
            tickers: loaded,
            by_date,
        })
    }

    fn csv_path(base_path: &Path, ticker: &str) -> PathBuf {
        base_path.join(format!("{ticker}.csv"))
    }

    fn read_bars(path: &Path, ticker: &str, sector: &str) -> Result<Vec<MarketBar>, DaytraderError> {
        let content = fs::read_to_string(path).map_err(|e| DaytraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| DaytraderError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let date_str: String = field(&record, 0, "date")?;
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                DaytraderError::Data {
                    reason: format!("invalid date format: {}", e),
                }
            })?;

            let bar = MarketBar {
                ticker: ticker.to_string(),
                date,
                open: field(&record, 1, "open")?,
                high: field(&record, 2, "high")?,
                low: field(&record, 3, "low")?,
                close: field(&record, 4, "close")?,
                volume: parse_volume(&record)?,
                sector: sector.to_string(),
            };
            if !bar.is_consistent() {
                return Err(DaytraderError::Data {
                    reason: format!(
                        "inconsistent bar in {} on {}: open={} high={} low={} close={}",
                        path.display(),
                        date,
                        bar.open,
                        bar.high,
                        bar.low,
                        bar.close
                    ),
                });
            }
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    /// First and last date with any data.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.by_date.keys().next()?;
        let last = self.by_date.keys().next_back()?;
        Some((*first, *last))
    }
}

impl SnapshotProvider for CsvSnapshotProvider {
    fn get_snapshot(&self, date: NaiveDate) -> Result<MarketSnapshot, DaytraderError> {
        let mut snapshot = MarketSnapshot::new(date);
        if let Some(bars) = self.by_date.get(&date) {
            for bar in bars {
                snapshot.insert(bar.clone());
            }
        }
        Ok(snapshot)
    }

    fn tickers(&self) -> Vec<String> {
        self.tickers.clone()
    }
}
