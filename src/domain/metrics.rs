//! Run analysis over a trade log: profit summaries and the risk report.

use super::trade_plan::{ExitType, TradePlan};
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const HIGH_CONFIDENCE: f64 = 0.7;
pub const MEDIUM_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitTypeCount {
    pub exit_type: ExitType,
    pub count: usize,
    /// Share of all trades, 0..=1.
    pub share: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DailyStats {
    pub trading_days: usize,
    pub average: f64,
    pub best: f64,
    pub worst: f64,
    pub positive_days: usize,
    pub days_at_target: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConfidenceBucket {
    pub count: usize,
    pub average_profit: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub total_trades: usize,
    pub total_profit: f64,
    /// Most frequent first.
    pub exit_types: Vec<ExitTypeCount>,
    pub profitable: usize,
    pub non_profitable: usize,
    pub average_profitable: f64,
    pub daily: DailyStats,
    pub high_confidence: ConfidenceBucket,
    pub medium_confidence: ConfidenceBucket,
    pub low_confidence: ConfidenceBucket,
    /// (year, month) -> profit.
    pub monthly: BTreeMap<(i32, u32), f64>,
    /// daily_target × trading days.
    pub target_total: f64,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn bucket(trades: &[&TradePlan]) -> ConfidenceBucket {
    let profits: Vec<f64> = trades.iter().map(|t| t.expected_profit).collect();
    ConfidenceBucket {
        count: profits.len(),
        average_profit: mean(&profits),
    }
}

impl RunSummary {
    /// Summarise every decided trade. No-op plans carry no date and only count
    /// toward totals.
    pub fn compute(trades: &[TradePlan], daily_target: f64) -> Self {
        use chrono::Datelike;

        let total_trades = trades.len();
        let total_profit: f64 = trades.iter().map(|t| t.expected_profit).sum();

        let mut exit_counts: BTreeMap<ExitType, usize> = BTreeMap::new();
        for exit_type in trades.iter().filter_map(|t| t.exit_type) {
            *exit_counts.entry(exit_type).or_default() += 1;
        }
        let mut exit_types: Vec<ExitTypeCount> = exit_counts
            .into_iter()
            .map(|(exit_type, count)| ExitTypeCount {
                exit_type,
                count,
                share: count as f64 / total_trades as f64,
            })
            .collect();
        exit_types.sort_by(|a, b| b.count.cmp(&a.count));

        let winners: Vec<f64> = trades
            .iter()
            .map(|t| t.expected_profit)
            .filter(|p| *p > 0.0)
            .collect();

        let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        let mut monthly: BTreeMap<(i32, u32), f64> = BTreeMap::new();
        for trade in trades {
            if let Some(date) = trade.date {
                *by_day.entry(date).or_default() += trade.expected_profit;
                *monthly.entry((date.year(), date.month())).or_default() += trade.expected_profit;
            }
        }
        let day_profits: Vec<f64> = by_day.values().copied().collect();
        let daily = DailyStats {
            trading_days: day_profits.len(),
            average: mean(&day_profits),
            best: day_profits.iter().copied().reduce(f64::max).unwrap_or(0.0),
            worst: day_profits.iter().copied().reduce(f64::min).unwrap_or(0.0),
            positive_days: day_profits.iter().filter(|p| **p > 0.0).count(),
            days_at_target: day_profits.iter().filter(|p| **p >= daily_target).count(),
        };

        let (high, rest): (Vec<&TradePlan>, Vec<&TradePlan>) =
            trades.iter().partition(|t| t.confidence >= HIGH_CONFIDENCE);
        let (medium, low): (Vec<&TradePlan>, Vec<&TradePlan>) =
            rest.into_iter().partition(|t| t.confidence >= MEDIUM_CONFIDENCE);

        RunSummary {
            total_trades,
            total_profit,
            exit_types,
            profitable: winners.len(),
            non_profitable: total_trades - winners.len(),
            average_profitable: mean(&winners),
            daily,
            high_confidence: bucket(&high),
            medium_confidence: bucket(&medium),
            low_confidence: bucket(&low),
            monthly,
            target_total: daily_target * daily.trading_days as f64,
        }
    }

    /// total_profit / target_total, or 0 when there is no target.
    pub fn target_ratio(&self) -> f64 {
        if self.target_total > 0.0 {
            self.total_profit / self.target_total
        } else {
            0.0
        }
    }
}

/// Exposure for a set of plans if every stop loss were hit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RiskReport {
    pub total_invested: f64,
    pub max_loss: f64,
    pub expected_profit: f64,
    pub trade_count: usize,
}

impl RiskReport {
    pub fn compute(trades: &[TradePlan]) -> Self {
        RiskReport {
            total_invested: trades.iter().map(|t| t.invested).sum(),
            max_loss: trades.iter().map(TradePlan::max_loss).sum(),
            expected_profit: trades.iter().map(|t| t.expected_profit).sum(),
            trade_count: trades.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::regime::Regime;
    use approx::assert_relative_eq;

    fn trade(day: u32, month: u32, exit_type: ExitType, profit: f64, confidence: f64) -> TradePlan {
        TradePlan {
            ticker: "AAPL".into(),
            date: NaiveDate::from_ymd_opt(2024, month, day),
            entry: Some(100.0),
            exit: Some(100.0 + profit / 10.0),
            exit_type: Some(exit_type),
            stop_loss: Some(97.5),
            shares: if profit > 0.0 { 10 } else { 0 },
            invested: if profit > 0.0 { 1000.0 } else { 0.0 },
            expected_profit: profit,
            confidence,
            ..TradePlan::no_op(Regime::Normal)
        }
    }

    fn sample() -> Vec<TradePlan> {
        vec![
            trade(2, 1, ExitType::Close, 100.0, 0.5),
            trade(2, 1, ExitType::TrailingStop, 80.0, 0.9),
            trade(3, 1, ExitType::StopLoss, 0.0, 0.5),
            trade(1, 2, ExitType::Close, 20.0, 0.7),
        ]
    }

    #[test]
    fn totals_and_profitability() {
        let s = RunSummary::compute(&sample(), 150.0);
        assert_eq!(s.total_trades, 4);
        assert_relative_eq!(s.total_profit, 200.0);
        assert_eq!(s.profitable, 3);
        assert_eq!(s.non_profitable, 1);
        assert_relative_eq!(s.average_profitable, 200.0 / 3.0);
    }

    #[test]
    fn exit_type_breakdown_most_frequent_first() {
        let s = RunSummary::compute(&sample(), 150.0);
        assert_eq!(s.exit_types[0].exit_type, ExitType::Close);
        assert_eq!(s.exit_types[0].count, 2);
        assert_relative_eq!(s.exit_types[0].share, 0.5);
        assert_eq!(s.exit_types.len(), 3);
    }

    #[test]
    fn daily_stats() {
        let s = RunSummary::compute(&sample(), 150.0);
        assert_eq!(s.daily.trading_days, 3);
        assert_relative_eq!(s.daily.best, 180.0);
        assert_relative_eq!(s.daily.worst, 0.0);
        assert_eq!(s.daily.positive_days, 2);
        assert_eq!(s.daily.days_at_target, 1);
        assert_relative_eq!(s.target_total, 450.0);
        assert_relative_eq!(s.target_ratio(), 200.0 / 450.0);
    }

    #[test]
    fn confidence_buckets() {
        let s = RunSummary::compute(&sample(), 150.0);
        assert_eq!(s.high_confidence.count, 2);
        assert_relative_eq!(s.high_confidence.average_profit, 50.0);
        assert_eq!(s.medium_confidence.count, 2);
        assert_eq!(s.low_confidence.count, 0);
        assert_eq!(s.low_confidence.average_profit, 0.0);
    }

    #[test]
    fn monthly_totals() {
        let s = RunSummary::compute(&sample(), 150.0);
        assert_relative_eq!(s.monthly[&(2024, 1)], 180.0);
        assert_relative_eq!(s.monthly[&(2024, 2)], 20.0);
    }

    #[test]
    fn empty_log() {
        let s = RunSummary::compute(&[], 150.0);
        assert_eq!(s.total_trades, 0);
        assert!(s.exit_types.is_empty());
        assert_eq!(s.daily, DailyStats::default());
        assert_eq!(s.target_ratio(), 0.0);
    }

    #[test]
    fn risk_report() {
        let r = RiskReport::compute(&sample());
        assert_eq!(r.trade_count, 4);
        assert_relative_eq!(r.total_invested, 3000.0);
        // three positions of 10 shares, 2.5 below entry each
        assert_relative_eq!(r.max_loss, 75.0);
        assert_relative_eq!(r.expected_profit, 200.0);
    }
}
