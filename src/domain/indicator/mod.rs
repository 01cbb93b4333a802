//! Technical indicators and the composite per-ticker signal.
//!
//! This module provides:
//! - one submodule per indicator, each computing its value from trailing
//!   closes (or the current bar) and classifying it into a signal
//! - `TechnicalSignal`: the six indicator signals plus an overall verdict
//! - `analyze`: builds a `TechnicalSignal` for one bar and optional history
//!
//! Every indicator has a neutral fallback when history is too short, so
//! `analyze` never fails.

pub mod bollinger;
pub mod fibonacci;
pub mod macd;
pub mod price_action;
pub mod rsi;
pub mod stochastic;

use crate::domain::market::MarketBar;
use bollinger::{bollinger_signal, calculate_bollinger_default, BollingerSignal};
use fibonacci::{calculate_fibonacci_levels, fibonacci_signal, FibonacciSignal};
use macd::{calculate_macd_default, macd_signal, MacdSignal};
use price_action::{price_action, PriceAction};
use rsi::{calculate_rsi, rsi_signal, RsiSignal};
use serde::Serialize;
use stochastic::{calculate_stochastic_from_closes, stochastic_signal, StochasticSignal};
use std::fmt;

pub const STRONG_CONFIDENCE: f64 = 0.9;
pub const CONFIDENCE: f64 = 0.7;
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;
/// Closes needed before the history-based indicators vote.
pub const MIN_HISTORY: usize = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallSignal {
    StrongBuy,
    Buy,
    #[default]
    Neutral,
    Sell,
    StrongSell,
}

impl OverallSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallSignal::StrongBuy => "strong_buy",
            OverallSignal::Buy => "buy",
            OverallSignal::Neutral => "neutral",
            OverallSignal::Sell => "sell",
            OverallSignal::StrongSell => "strong_sell",
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, OverallSignal::StrongBuy | OverallSignal::Buy)
    }

    pub fn is_sell(&self) -> bool {
        matches!(self, OverallSignal::StrongSell | OverallSignal::Sell)
    }
}

impl fmt::Display for OverallSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which way a single indicator label points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lean {
    Buy,
    Sell,
    Neither,
}

/// A label leans buy if it mentions buy/bullish/support and sell if it
/// mentions sell/bearish/resistance. `below_mean`/`above_mean` lean nowhere.
pub fn lean(label: &str) -> Lean {
    if label.contains("buy") || label.contains("bullish") || label.contains("support") {
        Lean::Buy
    } else if label.contains("sell") || label.contains("bearish") || label.contains("resistance")
    {
        Lean::Sell
    } else {
        Lean::Neither
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TechnicalSignal {
    pub price_action: PriceAction,
    pub bollinger_signal: BollingerSignal,
    pub fibonacci_signal: FibonacciSignal,
    pub rsi_signal: RsiSignal,
    pub macd_signal: MacdSignal,
    pub stochastic_signal: StochasticSignal,
    pub overall_signal: OverallSignal,
    pub confidence: f64,
}

impl Default for TechnicalSignal {
    fn default() -> Self {
        TechnicalSignal {
            price_action: PriceAction::Neutral,
            bollinger_signal: BollingerSignal::Neutral,
            fibonacci_signal: FibonacciSignal::Neutral,
            rsi_signal: RsiSignal::Neutral,
            macd_signal: MacdSignal::Neutral,
            stochastic_signal: StochasticSignal::Neutral,
            overall_signal: OverallSignal::Neutral,
            confidence: NEUTRAL_CONFIDENCE,
        }
    }
}

impl TechnicalSignal {
    fn labels(&self) -> [&'static str; 6] {
        [
            self.bollinger_signal.as_str(),
            self.rsi_signal.as_str(),
            self.macd_signal.as_str(),
            self.stochastic_signal.as_str(),
            self.fibonacci_signal.as_str(),
            self.price_action.as_str(),
        ]
    }

    /// Recomputes `overall_signal` and `confidence` from the six indicator signals.
    fn resolve(mut self) -> Self {
        let labels = self.labels();
        let buys = labels.iter().filter(|l| lean(l) == Lean::Buy).count();
        let sells = labels.iter().filter(|l| lean(l) == Lean::Sell).count();

        let (overall, confidence) = if buys >= 4 {
            (OverallSignal::StrongBuy, STRONG_CONFIDENCE)
        } else if buys >= 3 {
            (OverallSignal::Buy, CONFIDENCE)
        } else if sells >= 4 {
            (OverallSignal::StrongSell, STRONG_CONFIDENCE)
        } else if sells >= 3 {
            (OverallSignal::Sell, CONFIDENCE)
        } else {
            (OverallSignal::Neutral, NEUTRAL_CONFIDENCE)
        };

        self.overall_signal = overall;
        self.confidence = confidence;
        self
    }
}

/// Analyze one bar. Bollinger, RSI, MACD and stochastic need at least
/// `MIN_HISTORY` trailing closes in `history` (oldest first, not including
/// this bar); with fewer they stay neutral. Fibonacci and price action only
/// need the bar itself.
pub fn analyze(bar: &MarketBar, history: Option<&[f64]>) -> TechnicalSignal {
    let price = bar.close;
    let mut signal = TechnicalSignal {
        price_action: price_action(bar.open, bar.close),
        fibonacci_signal: fibonacci_signal(price, &calculate_fibonacci_levels(bar.high, bar.low)),
        ..TechnicalSignal::default()
    };

    if let Some(closes) = history.filter(|h| h.len() >= MIN_HISTORY) {
        signal.bollinger_signal = bollinger_signal(price, calculate_bollinger_default(closes));
        signal.rsi_signal = rsi_signal(calculate_rsi(closes, rsi::DEFAULT_PERIOD));
        signal.macd_signal = macd_signal(&calculate_macd_default(closes));
        signal.stochastic_signal = stochastic_signal(&calculate_stochastic_from_closes(closes));
    }

    signal.resolve()
}
