//! The per-ticker, per-day trade decision record.

use crate::domain::indicator::fibonacci::FibonacciLevels;
use crate::domain::indicator::TechnicalSignal;
use crate::domain::regime::Regime;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitType {
    Close,
    TrailingStop,
    StopLoss,
    FibonacciProfit,
    TechnicalExit,
    SkipLowReward,
}

impl ExitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitType::Close => "close",
            ExitType::TrailingStop => "trailing_stop",
            ExitType::StopLoss => "stop_loss",
            ExitType::FibonacciProfit => "fibonacci_profit",
            ExitType::TechnicalExit => "technical_exit",
            ExitType::SkipLowReward => "skip_low_reward",
        }
    }
}

impl fmt::Display for ExitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Round to cents.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Outcome of deciding one ticker on one day.
///
/// A no-op plan (no bar available) has no entry, exit or exit type. A skipped
/// plan has an entry and `ExitType::SkipLowReward` but no exit. Only plans
/// with `shares > 0` contribute invested capital and profit.
#[derive(Debug, Clone, PartialEq)]
pub struct TradePlan {
    pub ticker: String,
    pub date: Option<NaiveDate>,
    pub entry: Option<f64>,
    pub exit: Option<f64>,
    pub exit_type: Option<ExitType>,
    pub stop_loss: Option<f64>,
    pub shares: u64,
    pub invested: f64,
    pub expected_profit: f64,
    pub regime: Regime,
    pub confidence: f64,
    pub signal: Option<TechnicalSignal>,
    pub fibonacci_levels: Option<FibonacciLevels>,
}

impl TradePlan {
    pub fn no_op(regime: Regime) -> Self {
        TradePlan {
            ticker: String::new(),
            date: None,
            entry: None,
            exit: None,
            exit_type: None,
            stop_loss: None,
            shares: 0,
            invested: 0.0,
            expected_profit: 0.0,
            regime,
            confidence: 0.0,
            signal: None,
            fibonacci_levels: None,
        }
    }

    pub fn is_no_op(&self) -> bool {
        self.entry.is_none()
    }

    pub fn is_skipped(&self) -> bool {
        self.exit_type == Some(ExitType::SkipLowReward)
    }

    /// A position is actually taken.
    pub fn has_position(&self) -> bool {
        self.shares > 0
    }

    /// Worst-case loss if the stop is hit: (entry - stop_loss) × shares.
    pub fn max_loss(&self) -> f64 {
        match (self.entry, self.stop_loss) {
            (Some(entry), Some(stop)) if self.has_position() => (entry - stop) * self.shares as f64,
            _ => 0.0,
        }
    }
}
