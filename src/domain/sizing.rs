//! Position sizing.
//!
//! Two sizers live here:
//! - `shares_for_trade`: the share count the decision engine uses, driven by
//!   a per-trade profit target and capped by the ticker's allocation
//! - `size_by_config`: a dollar-value sizer driven by the configured sizing
//!   method, used when printing a single-day plan

use crate::domain::config::{EngineConfig, SizingMethod};
use crate::domain::indicator::OverallSignal;
use crate::domain::regime::Regime;

/// Daily profit goal split across the day's tickers, per regime.
pub fn base_target_profit(regime: Regime) -> f64 {
    match regime {
        Regime::HighVolatility => 250.0,
        Regime::LowVolatility => 120.0,
        Regime::Normal => 180.0,
    }
}

/// Dollar profit one position should aim for.
pub fn target_profit(regime: Regime, min_tickers: usize, confidence: f64, signal: OverallSignal) -> f64 {
    let base = base_target_profit(regime) / min_tickers.max(1) as f64;
    let scaled = base * (0.8 + 0.4 * confidence);
    match signal {
        OverallSignal::StrongBuy => scaled * 1.5,
        OverallSignal::Buy => scaled * 1.2,
        _ => scaled,
    }
}

/// Minimum share count before the allocation-based floor kicks in.
pub fn min_shares(signal: OverallSignal) -> u64 {
    if signal.is_buy() { 15 } else { 10 }
}

fn floor_allocation_pct(signal: OverallSignal) -> f64 {
    if signal == OverallSignal::StrongBuy { 0.6 } else { 0.5 }
}

fn whole_shares(value: f64, price: f64) -> u64 {
    if price > 0.0 && value.is_finite() && value > 0.0 {
        (value / price).floor() as u64
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingRequest {
    pub entry: f64,
    pub exit: f64,
    /// Dollars available to this ticker: funds / max(1, min_tickers).
    pub allocation: f64,
    /// Fraction of `allocation` a position may use.
    pub max_allocation: f64,
    pub regime: Regime,
    pub min_tickers: usize,
    pub signal: OverallSignal,
    pub confidence: f64,
}

impl SizingRequest {
    pub fn max_shares_by_allocation(&self) -> u64 {
        whole_shares(self.allocation * self.max_allocation, self.entry)
    }
}

/// Share count for a trade exiting at `exit`. Zero unless the exit is above
/// entry. Never exceeds `max_shares_by_allocation`.
pub fn shares_for_trade(req: &SizingRequest) -> u64 {
    let profit_per_share = req.exit - req.entry;
    if !(profit_per_share > 0.0) || !(req.entry > 0.0) {
        return 0;
    }

    let target = target_profit(req.regime, req.min_tickers, req.confidence, req.signal);
    let target_shares = whole_shares(target, profit_per_share);
    let max_shares = req.max_shares_by_allocation();

    let mut shares = target_shares.min(max_shares);

    let floor = min_shares(req.signal);
    if shares < floor {
        let by_allocation = whole_shares(req.allocation * floor_allocation_pct(req.signal), req.entry);
        shares = floor.max(by_allocation).min(max_shares);
    }
    shares
}

/// Dollar target for one position under the configured sizing method.
pub fn target_position_value(ticker: &str, available_funds: f64, regime: Regime, config: &EngineConfig) -> f64 {
    let sizing = &config.position_sizing;
    let per_position = available_funds / sizing.max_positions.max(1) as f64;

    let custom = match sizing.method {
        SizingMethod::Custom => config.custom_position_sizes.get(ticker).copied(),
        _ => None,
    };

    let target = match (sizing.method, custom) {
        (_, Some(value)) => value,
        (SizingMethod::Equal, _) => per_position,
        _ => match regime {
            Regime::HighVolatility => per_position * 0.8,
            Regime::LowVolatility => per_position * 1.2,
            Regime::Normal => per_position,
        },
    };

    target
        .max(sizing.min_position_value)
        .min(sizing.max_position_value)
        .min(available_funds)
}

/// Shares and dollars invested for `ticker` at `price` under the configured
/// sizing method.
pub fn size_by_config(
    ticker: &str,
    price: f64,
    available_funds: f64,
    regime: Regime,
    config: &EngineConfig,
) -> (u64, f64) {
    let value = target_position_value(ticker, available_funds, regime, config);
    let shares = whole_shares(value, price);
    (shares, shares as f64 * price)
}
