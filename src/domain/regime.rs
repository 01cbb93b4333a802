//! Volatility regime detection.
//!
//! Per-ticker volatility is (high - low) / open. The snapshot's regime is
//! decided by the mean over every ticker with a usable open:
//! - mean > 3.5%  → high volatility
//! - mean < 1.5%  → low volatility
//! - otherwise    → normal
//!
//! An empty snapshot, or one without a single usable open, is `Normal`.

use crate::domain::market::MarketSnapshot;
use serde::Serialize;
use std::fmt;

pub const HIGH_VOLATILITY_THRESHOLD: f64 = 0.035;
pub const LOW_VOLATILITY_THRESHOLD: f64 = 0.015;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    HighVolatility,
    #[default]
    Normal,
    LowVolatility,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::HighVolatility => "high_volatility",
            Regime::Normal => "normal",
            Regime::LowVolatility => "low_volatility",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn detect_regime(snapshot: &MarketSnapshot) -> Regime {
    let volatilities: Vec<f64> = snapshot
        .bars()
        .filter_map(|bar| bar.volatility())
        .filter(|v| v.is_finite())
        .collect();

    if volatilities.is_empty() {
        return Regime::Normal;
    }

    let avg = volatilities.iter().sum::<f64>() / volatilities.len() as f64;
    classify(avg)
}

pub fn classify(avg_volatility: f64) -> Regime {
    if avg_volatility > HIGH_VOLATILITY_THRESHOLD {
        Regime::HighVolatility
    } else if avg_volatility < LOW_VOLATILITY_THRESHOLD {
        Regime::LowVolatility
    } else {
        Regime::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::MarketBar;
    use chrono::NaiveDate;

    fn bar(ticker: &str, open: f64, high: f64, low: f64) -> MarketBar {
        MarketBar {
            ticker: ticker.into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            open,
            high,
            low,
            close: open,
            volume: 1_000_000,
            sector: "Tech".into(),
        }
    }

    #[test]
    fn empty_snapshot_is_normal() {
        assert_eq!(detect_regime(&MarketSnapshot::default()), Regime::Normal);
    }

    #[test]
    fn five_percent_average_is_high_volatility() {
        let snapshot: MarketSnapshot = vec![
            bar("AAPL", 100.0, 104.0, 100.0),
            bar("MSFT", 100.0, 105.0, 100.0),
            bar("NVDA", 100.0, 106.0, 100.0),
        ]
        .into_iter()
        .collect();
        assert_eq!(detect_regime(&snapshot), Regime::HighVolatility);
    }

    #[test]
    fn tight_ranges_are_low_volatility() {
        let snapshot: MarketSnapshot = vec![
            bar("AAPL", 100.0, 100.5, 100.0),
            bar("MSFT", 200.0, 201.0, 199.5),
        ]
        .into_iter()
        .collect();
        assert_eq!(detect_regime(&snapshot), Regime::LowVolatility);
    }

    #[test]
    fn mid_range_is_normal() {
        let snapshot: MarketSnapshot = vec![bar("AAPL", 100.0, 102.0, 100.0)]
            .into_iter()
            .collect();
        assert_eq!(detect_regime(&snapshot), Regime::Normal);
    }

    #[test]
    fn zero_open_is_ignored() {
        let snapshot: MarketSnapshot = vec![
            bar("BAD", 0.0, 10.0, 0.0),
            bar("AAPL", 100.0, 100.5, 100.0),
        ]
        .into_iter()
        .collect();
        assert_eq!(detect_regime(&snapshot), Regime::LowVolatility);
    }

    #[test]
    fn only_invalid_opens_is_normal() {
        let snapshot: MarketSnapshot = vec![bar("BAD", 0.0, 10.0, 0.0)].into_iter().collect();
        assert_eq!(detect_regime(&snapshot), Regime::Normal);
    }

    #[test]
    fn boundaries_are_exclusive() {
        assert_eq!(classify(0.035), Regime::Normal);
        assert_eq!(classify(0.015), Regime::Normal);
        assert_eq!(classify(0.0351), Regime::HighVolatility);
        assert_eq!(classify(0.0149), Regime::LowVolatility);
    }

    #[test]
    fn display_labels() {
        assert_eq!(Regime::HighVolatility.to_string(), "high_volatility");
        assert_eq!(Regime::Normal.to_string(), "normal");
        assert_eq!(Regime::LowVolatility.to_string(), "low_volatility");
    }
}
