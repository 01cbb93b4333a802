//! MACD (Moving Average Convergence Divergence) over trailing closes.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! EMAs are span-based with α = 2/(span+1) and bias-adjusted weights, so the
//! first value equals the first close and no SMA seed is needed.
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Fewer than `slow` closes: (0, 0, 0).

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MacdValue {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MacdSignal {
    #[default]
    Neutral,
    Bullish,
    Bearish,
}

impl MacdSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            MacdSignal::Neutral => "neutral",
            MacdSignal::Bullish => "bullish",
            MacdSignal::Bearish => "bearish",
        }
    }
}

/// Bias-adjusted exponential moving average:
/// y[t] = Σ (1-α)^i · x[t-i] / Σ (1-α)^i
pub fn ewm_adjusted(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    values
        .iter()
        .map(|&x| {
            numerator = x + decay * numerator;
            denominator = 1.0 + decay * denominator;
            numerator / denominator
        })
        .collect()
}

pub fn calculate_macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> MacdValue {
    if fast == 0 || slow == 0 || signal_period == 0 || closes.len() < slow {
        return MacdValue::default();
    }

    let ema_fast = ewm_adjusted(closes, fast);
    let ema_slow = ewm_adjusted(closes, slow);
    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ewm_adjusted(&macd_line, signal_period);

    let line = macd_line.last().copied().unwrap_or(0.0);
    let signal = signal_line.last().copied().unwrap_or(0.0);

    MacdValue {
        line,
        signal,
        histogram: line - signal,
    }
}

pub fn calculate_macd_default(closes: &[f64]) -> MacdValue {
    calculate_macd(closes, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}

pub fn macd_signal(value: &MacdValue) -> MacdSignal {
    if value.line > value.signal && value.histogram > 0.0 {
        MacdSignal::Bullish
    } else if value.line < value.signal && value.histogram < 0.0 {
        MacdSignal::Bearish
    } else {
        MacdSignal::Neutral
    }
}
