//! Simulator-owned capital and trade log.

use chrono::NaiveDate;

use super::trade_plan::TradePlan;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub initial_funds: f64,
    pub accumulated_profit: f64,
    pub trade_log: Vec<TradePlan>,
    /// Funds after each trading day.
    pub equity_curve: Vec<EquityPoint>,
}

impl PortfolioState {
    pub fn new(initial_funds: f64) -> Self {
        PortfolioState {
            initial_funds,
            accumulated_profit: 0.0,
            trade_log: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    /// Capital available to a trading day: profits compound across the run.
    pub fn available_funds(&self) -> f64 {
        self.initial_funds + self.accumulated_profit
    }

    /// Append one day's plans and bank their expected profit. Returns the
    /// day's profit.
    pub fn record_day(&mut self, date: NaiveDate, plans: Vec<TradePlan>) -> f64 {
        let day_profit: f64 = plans.iter().map(|p| p.expected_profit).sum();
        self.accumulated_profit += day_profit;
        self.trade_log.extend(plans);
        self.equity_curve.push(EquityPoint {
            date,
            equity: self.available_funds(),
        });
        day_profit
    }

    pub fn trade_count(&self) -> usize {
        self.trade_log.len()
    }

    /// The day with the highest funds; the earliest one on ties.
    pub fn peak_equity(&self) -> Option<&EquityPoint> {
        self.equity_curve
            .iter()
            .reduce(|best, point| if point.equity > best.equity { point } else { best })
    }
}
