//! Market data port trait.

use crate::domain::error::DaytraderError;
use crate::domain::market::MarketSnapshot;
use chrono::NaiveDate;

pub trait SnapshotProvider {
    /// All bars available for `date`. A date without data yields an empty
    /// snapshot, not an error; errors mean the source itself failed.
    fn get_snapshot(&self, date: NaiveDate) -> Result<MarketSnapshot, DaytraderError>;

    /// Tickers this provider can serve.
    fn tickers(&self) -> Vec<String>;
}
