//! Entry/exit decisions for one ticker on one day.
//!
//! Entry is always the day's open. Exit rules are checked in priority order:
//! trailing stop, stop loss, Fibonacci profit-taking, technical exit, then the
//! close. Parameters come from an immutable per-regime table and are adjusted
//! by the technical signal and, with enough history, the Bollinger position.

use crate::domain::indicator::bollinger::{calculate_bollinger_default, DEFAULT_PERIOD};
use crate::domain::indicator::fibonacci::{calculate_fibonacci_levels, FibonacciLevels};
use crate::domain::indicator::{analyze, OverallSignal, TechnicalSignal};
use crate::domain::market::MarketBar;
use crate::domain::regime::Regime;
use crate::domain::sizing::{shares_for_trade, SizingRequest};
use crate::domain::trade_plan::{round2, ExitType, TradePlan};
use tracing::debug;

/// Close must clear entry by this factor before a Fibonacci profit exit.
pub const FIBONACCI_PROFIT_FACTOR: f64 = 1.05;

const TRIGGER_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeParams {
    pub stop_loss_pct: f64,
    pub trailing_trigger: f64,
    pub trailing_stop_pct: f64,
    pub min_profit_pct: f64,
    pub max_allocation: f64,
}

impl TradeParams {
    pub fn for_regime(regime: Regime) -> Self {
        match regime {
            Regime::HighVolatility => TradeParams {
                stop_loss_pct: 0.03,
                trailing_trigger: 1.12,
                trailing_stop_pct: 0.04,
                min_profit_pct: 0.008,
                max_allocation: 0.85,
            },
            Regime::LowVolatility => TradeParams {
                stop_loss_pct: 0.02,
                trailing_trigger: 1.04,
                trailing_stop_pct: 0.02,
                min_profit_pct: 0.002,
                max_allocation: 0.90,
            },
            Regime::Normal => TradeParams {
                stop_loss_pct: 0.025,
                trailing_trigger: 1.08,
                trailing_stop_pct: 0.03,
                min_profit_pct: 0.004,
                max_allocation: 0.80,
            },
        }
    }

    /// Buy signals tighten the stop and size up; sell signals do the reverse.
    pub fn adjusted_for_signal(self, signal: OverallSignal) -> Self {
        if signal.is_buy() {
            TradeParams {
                stop_loss_pct: self.stop_loss_pct * 0.8,
                trailing_trigger: self.trailing_trigger * 0.9,
                min_profit_pct: self.min_profit_pct * 0.7,
                max_allocation: self.max_allocation * 1.1,
                ..self
            }
        } else if signal.is_sell() {
            TradeParams {
                stop_loss_pct: self.stop_loss_pct * 1.2,
                trailing_trigger: self.trailing_trigger * 1.1,
                min_profit_pct: self.min_profit_pct * 1.3,
                max_allocation: self.max_allocation * 0.8,
                ..self
            }
        } else {
            self
        }
    }

    /// `position` is 0 at the lower band and 1 at the upper band.
    pub fn adjusted_for_band_position(self, position: f64) -> Self {
        if position < 0.2 {
            TradeParams {
                min_profit_pct: self.min_profit_pct * 0.6,
                max_allocation: self.max_allocation * 1.2,
                ..self
            }
        } else if position > 0.8 {
            TradeParams {
                min_profit_pct: self.min_profit_pct * 1.4,
                max_allocation: self.max_allocation * 0.7,
                ..self
            }
        } else {
            self
        }
    }

    /// Minimum profit fraction for a trade to be worth taking.
    pub fn required_profit(&self, signal: OverallSignal) -> f64 {
        match signal {
            OverallSignal::StrongBuy => self.min_profit_pct * 0.5,
            OverallSignal::Buy => self.min_profit_pct * 0.7,
            _ => self.min_profit_pct,
        }
    }
}

/// Regime table plus every applicable adjustment for this entry and history.
pub fn derive_params(
    regime: Regime,
    signal: OverallSignal,
    entry: f64,
    history: Option<&[f64]>,
) -> TradeParams {
    let params = TradeParams::for_regime(regime).adjusted_for_signal(signal);

    let band_position = history
        .filter(|closes| closes.len() >= DEFAULT_PERIOD)
        .and_then(calculate_bollinger_default)
        .and_then(|bands| bands.position(entry))
        .filter(|p| p.is_finite());

    match band_position {
        Some(position) => params.adjusted_for_band_position(position),
        None => params,
    }
}

/// Pick the exit for a bar given derived parameters.
pub fn choose_exit(
    bar: &MarketBar,
    params: &TradeParams,
    stop_loss: f64,
    levels: &FibonacciLevels,
    signal: OverallSignal,
) -> (f64, ExitType) {
    let entry = bar.open;
    let trail_exit = round2(bar.high * (1.0 - params.trailing_stop_pct));

    if bar.high >= entry * params.trailing_trigger - TRIGGER_TOLERANCE && trail_exit > bar.close {
        (trail_exit, ExitType::TrailingStop)
    } else if bar.low <= stop_loss {
        (stop_loss, ExitType::StopLoss)
    } else if bar.close >= levels.fib_618 && bar.close >= entry * FIBONACCI_PROFIT_FACTOR {
        (bar.close, ExitType::FibonacciProfit)
    } else if signal == OverallSignal::StrongSell && bar.close > entry {
        (bar.close, ExitType::TechnicalExit)
    } else {
        (bar.close, ExitType::Close)
    }
}

/// Decide entry, exit and size for one ticker.
///
/// `history` is the ticker's trailing closes before this bar. A missing bar
/// yields a no-op plan.
pub fn decide(
    bar: Option<&MarketBar>,
    available_funds: f64,
    min_tickers: usize,
    regime: Regime,
    history: Option<&[f64]>,
) -> TradePlan {
    let Some(bar) = bar else {
        return TradePlan::no_op(regime);
    };

    let entry = bar.open;
    let signal: TechnicalSignal = analyze(bar, history);
    let overall = signal.overall_signal;
    let params = derive_params(regime, overall, entry, history);
    let levels = calculate_fibonacci_levels(bar.high, bar.low);
    let stop_loss = round2(entry * (1.0 - params.stop_loss_pct));

    let (exit, exit_type) = choose_exit(bar, &params, stop_loss, &levels, overall);

    let mut plan = TradePlan {
        ticker: bar.ticker.clone(),
        date: Some(bar.date),
        entry: Some(entry),
        exit: Some(exit),
        exit_type: Some(exit_type),
        stop_loss: Some(stop_loss),
        shares: 0,
        invested: 0.0,
        expected_profit: 0.0,
        regime,
        confidence: signal.confidence,
        signal: Some(signal),
        fibonacci_levels: Some(levels),
    };

    if exit > entry && entry > 0.0 {
        let profit_pct = (exit - entry) / entry;
        let required = params.required_profit(overall);
        if profit_pct < required {
            debug!(
                ticker = %bar.ticker,
                profit_pct,
                required,
                "skipping low reward trade"
            );
            plan.exit = None;
            plan.exit_type = Some(ExitType::SkipLowReward);
            return plan;
        }
    }

    let shares = shares_for_trade(&SizingRequest {
        entry,
        exit,
        allocation: available_funds / min_tickers.max(1) as f64,
        max_allocation: params.max_allocation,
        regime,
        min_tickers,
        signal: overall,
        confidence: signal.confidence,
    });

    if shares > 0 {
        plan.shares = shares;
        plan.invested = round2(shares as f64 * entry);
        plan.expected_profit = round2((exit - entry) * shares as f64);
    }

    debug!(
        ticker = %bar.ticker,
        %exit_type,
        exit,
        shares,
        expected_profit = plan.expected_profit,
        "decided"
    );
    plan
}

/// `decide` under the normal regime.
pub fn decide_entry_exit(
    bar: Option<&MarketBar>,
    available_funds: f64,
    min_tickers: usize,
    history: Option<&[f64]>,
) -> TradePlan {
    decide(bar, available_funds, min_tickers, Regime::Normal, history)
}
