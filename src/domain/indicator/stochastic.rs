//! Stochastic oscillator.
//!
//! %K = (close - lowest_low) / (highest_high - lowest_low) × 100 over the last
//! k_period highs/lows, where close is the latest value of the close series.
//! %D is reported equal to %K instead of a moving average of recent %K values.
//!
//! Fewer than k_period closes, or a zero range: %K = %D = 50.

pub const DEFAULT_K_PERIOD: usize = 14;
pub const DEFAULT_D_PERIOD: usize = 3;
pub const NEUTRAL_STOCHASTIC: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StochasticValue {
    pub k: f64,
    pub d: f64,
}

impl StochasticValue {
    fn neutral() -> Self {
        StochasticValue {
            k: NEUTRAL_STOCHASTIC,
            d: NEUTRAL_STOCHASTIC,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StochasticSignal {
    #[default]
    Neutral,
    OversoldBuy,
    OverboughtSell,
    Bullish,
    Bearish,
}

impl StochasticSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            StochasticSignal::Neutral => "neutral",
            StochasticSignal::OversoldBuy => "oversold_buy",
            StochasticSignal::OverboughtSell => "overbought_sell",
            StochasticSignal::Bullish => "bullish",
            StochasticSignal::Bearish => "bearish",
        }
    }
}

/// `d_period` is accepted for signature parity with the textbook oscillator
/// but %D is not smoothed.
pub fn calculate_stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    k_period: usize,
    _d_period: usize,
) -> StochasticValue {
    if k_period == 0
        || closes.len() < k_period
        || highs.len() < k_period
        || lows.len() < k_period
    {
        return StochasticValue::neutral();
    }

    let highest_high = highs[highs.len() - k_period..]
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let lowest_low = lows[lows.len() - k_period..]
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min);
    let close = closes[closes.len() - 1];

    if highest_high == lowest_low {
        return StochasticValue::neutral();
    }

    let k = (close - lowest_low) / (highest_high - lowest_low) * 100.0;
    StochasticValue { k, d: k }
}

/// Close series standing in for intraday highs and lows.
pub fn calculate_stochastic_from_closes(closes: &[f64]) -> StochasticValue {
    calculate_stochastic(closes, closes, closes, DEFAULT_K_PERIOD, DEFAULT_D_PERIOD)
}

pub fn stochastic_signal(value: &StochasticValue) -> StochasticSignal {
    if value.k < 20.0 {
        StochasticSignal::OversoldBuy
    } else if value.k > 80.0 {
        StochasticSignal::OverboughtSell
    } else if value.k > value.d {
        StochasticSignal::Bullish
    } else {
        StochasticSignal::Bearish
    }
}
