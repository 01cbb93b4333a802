//! CSV trade log adapter.

use crate::domain::error::DaytraderError;
use crate::domain::indicator::OverallSignal;
use crate::domain::regime::Regime;
use crate::domain::trade_plan::{ExitType, TradePlan};
use crate::ports::report_port::TradeLogPort;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct TradeRow<'a> {
    date: Option<NaiveDate>,
    ticker: &'a str,
    regime: Regime,
    entry: Option<f64>,
    exit: Option<f64>,
    exit_type: Option<ExitType>,
    stop_loss: Option<f64>,
    shares: u64,
    invested: f64,
    expected_profit: f64,
    confidence: f64,
    overall_signal: Option<OverallSignal>,
}

impl<'a> From<&'a TradePlan> for TradeRow<'a> {
    fn from(plan: &'a TradePlan) -> Self {
        TradeRow {
            date: plan.date,
            ticker: &plan.ticker,
            regime: plan.regime,
            entry: plan.entry,
            exit: plan.exit,
            exit_type: plan.exit_type,
            stop_loss: plan.stop_loss,
            shares: plan.shares,
            invested: plan.invested,
            expected_profit: plan.expected_profit,
            confidence: plan.confidence,
            overall_signal: plan.signal.map(|s| s.overall_signal),
        }
    }
}

/// Writes one CSV row per trade plan.
#[derive(Debug, Default)]
pub struct CsvTradeLog;

impl CsvTradeLog {
    pub fn new() -> Self {
        CsvTradeLog
    }

    /// Render the trade log to an in-memory CSV string.
    pub fn render(trades: &[TradePlan]) -> Result<String, DaytraderError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        Self::write_rows(&mut wtr, trades)?;
        let bytes = wtr.into_inner().map_err(|e| DaytraderError::Report {
            reason: format!("failed to flush CSV: {e}"),
        })?;
        String::from_utf8(bytes).map_err(|e| DaytraderError::Report {
            reason: format!("CSV is not UTF-8: {e}"),
        })
    }

    fn write_rows<W: std::io::Write>(
        wtr: &mut csv::Writer<W>,
        trades: &[TradePlan],
    ) -> Result<(), DaytraderError> {
        for plan in trades {
            wtr.serialize(TradeRow::from(plan))
                .map_err(|e| DaytraderError::Report {
                    reason: format!("failed to write trade row: {e}"),
                })?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl TradeLogPort for CsvTradeLog {
    fn write(&self, trades: &[TradePlan], output_path: &str) -> Result<(), DaytraderError> {
        let mut wtr = csv::Writer::from_path(output_path).map_err(|e| DaytraderError::Report {
            reason: format!("failed to create {output_path}: {e}"),
        })?;
        Self::write_rows(&mut wtr, trades)
    }
}
