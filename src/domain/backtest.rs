//! Day-by-day backtest simulator.
//!
//! Walks the business days of a date range. Each trading day uses the
//! previous business day's snapshot to detect the regime and pick tickers,
//! then decides every picked ticker against today's bar with funds equal to
//! the initial funds plus all profit banked so far.

use crate::domain::config::EngineConfig;
use crate::domain::decision::decide;
use crate::domain::error::DaytraderError;
use crate::domain::market::{MarketSnapshot, PriceHistory};
use crate::domain::portfolio::PortfolioState;
use crate::domain::regime::detect_regime;
use crate::domain::selection::select;
use crate::domain::trade_plan::TradePlan;
use crate::domain::universe::select_universe;
use crate::ports::data_port::SnapshotProvider;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Fewest tickers a day's funds are split across.
pub const MIN_TICKERS_FLOOR: usize = 5;
pub const DEFAULT_HISTORY_LOOKBACK: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Configured tickers present in the prior-day snapshot.
    #[default]
    Universe,
    /// Regime-aware scoring over the prior-day snapshot.
    Adaptive,
}

impl FromStr for SelectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "universe" => Ok(SelectionMode::Universe),
            "adaptive" => Ok(SelectionMode::Adaptive),
            other => Err(format!(
                "unknown selection mode '{other}' (expected universe or adaptive)"
            )),
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SelectionMode::Universe => "universe",
            SelectionMode::Adaptive => "adaptive",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub selection: SelectionMode,
    /// Feed trailing closes to selection and decisions.
    pub technical_history: bool,
    pub history_lookback: usize,
}

impl BacktestConfig {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        BacktestConfig {
            start_date,
            end_date,
            selection: SelectionMode::default(),
            technical_history: false,
            history_lookback: DEFAULT_HISTORY_LOOKBACK,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub portfolio: PortfolioState,
    /// Days that produced at least one decision.
    pub trading_days: usize,
    /// Business days with no data for any ticker.
    pub empty_days: usize,
}

impl BacktestResult {
    pub fn trades(&self) -> &[TradePlan] {
        &self.portfolio.trade_log
    }

    pub fn total_profit(&self) -> f64 {
        self.portfolio.accumulated_profit
    }
}

/// Monday to Friday between `start` and `end`, both inclusive.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut day = start;
    while day <= end {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(day);
        }
        match day.checked_add_days(Days::new(1)) {
            Some(next) => day = next,
            None => break,
        }
    }
    days
}

fn update_history(history: &mut PriceHistory, snapshot: &MarketSnapshot, lookback: usize) {
    for bar in snapshot.bars() {
        let closes = history.entry(bar.ticker.clone()).or_default();
        closes.push(bar.close);
        if closes.len() > lookback {
            let excess = closes.len() - lookback;
            closes.drain(..excess);
        }
    }
}

/// History as it stood before `snapshot`'s date: drops the last close of
/// every ticker the snapshot covers.
pub fn history_before(history: &PriceHistory, snapshot: &MarketSnapshot) -> PriceHistory {
    history
        .iter()
        .map(|(ticker, closes)| {
            let end = if snapshot.contains(ticker) {
                closes.len().saturating_sub(1)
            } else {
                closes.len()
            };
            (ticker.clone(), closes[..end].to_vec())
        })
        .collect()
}

/// Plans for one trading day, given the previous business day's snapshot.
/// `history` holds closes up to and including the prior day.
pub fn simulate_day(
    prior: &MarketSnapshot,
    today: &MarketSnapshot,
    funds: f64,
    engine: &EngineConfig,
    config: &BacktestConfig,
    history: Option<&PriceHistory>,
) -> Vec<TradePlan> {
    let regime = detect_regime(prior);
    let max_positions = engine.position_sizing.max_positions;

    let selected = match config.selection {
        SelectionMode::Universe => select_universe(engine, prior),
        SelectionMode::Adaptive => {
            // history already holds the prior day's closes
            let before_prior = history.map(|h| history_before(h, prior));
            select(prior, regime, &engine.allowed_sectors, before_prior.as_ref(), max_positions)
        }
    };
    let min_tickers = MIN_TICKERS_FLOOR.max(selected.len());

    debug!(
        %regime,
        selected = selected.len(),
        funds,
        "trading day"
    );

    selected
        .iter()
        .filter_map(|ticker| today.get(ticker))
        .map(|bar| {
            let closes = history.and_then(|h| h.get(&bar.ticker)).map(Vec::as_slice);
            decide(Some(bar), funds, min_tickers, regime, closes)
        })
        .collect()
}

/// Run the simulator over `config`'s date range.
pub fn run_backtest(
    provider: &dyn SnapshotProvider,
    engine: &EngineConfig,
    config: &BacktestConfig,
) -> Result<BacktestResult, DaytraderError> {
    let days = business_days(config.start_date, config.end_date);
    let mut portfolio = PortfolioState::new(engine.initial_funds);
    let mut history = PriceHistory::new();
    let mut trading_days = 0;
    let mut empty_days = 0;
    let mut prior: Option<MarketSnapshot> = None;

    info!(
        start = %config.start_date,
        end = %config.end_date,
        days = days.len(),
        selection = %config.selection,
        "starting backtest"
    );

    for (i, &date) in days.iter().enumerate() {
        let today = provider.get_snapshot(date)?;

        if today.is_empty() {
            debug!(%date, "no data, skipping");
            empty_days += 1;
            prior = Some(today);
            continue;
        }

        if i > 0 {
            let prior_snapshot = match prior.take() {
                Some(snapshot) => snapshot,
                None => provider.get_snapshot(days[i - 1])?,
            };
            let history_ref = config.technical_history.then_some(&history);
            let funds = portfolio.available_funds();
            let plans = simulate_day(&prior_snapshot, &today, funds, engine, config, history_ref);

            if !plans.is_empty() {
                trading_days += 1;
            }
            let count = plans.len();
            let day_profit = portfolio.record_day(date, plans);
            info!(%date, decisions = count, day_profit, total = portfolio.accumulated_profit, "day complete");
        }

        if config.technical_history {
            update_history(&mut history, &today, config.history_lookback);
        }
        prior = Some(today);
    }

    info!(
        trades = portfolio.trade_count(),
        total_profit = portfolio.accumulated_profit,
        "backtest complete"
    );

    Ok(BacktestResult {
        portfolio,
        trading_days,
        empty_days,
    })
}
