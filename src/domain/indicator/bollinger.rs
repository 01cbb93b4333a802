//! Bollinger Bands over the trailing closes.
//!
//! - Middle: Simple Moving Average (SMA) over the last n closes
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Fewer than `period` closes: no bands.

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl Bands {
    /// Where `price` sits between the bands: 0 at the lower band, 1 at the upper.
    /// `None` when the bands have collapsed to a single value.
    pub fn position(&self, price: f64) -> Option<f64> {
        let width = self.upper - self.lower;
        (width != 0.0).then(|| (price - self.lower) / width)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BollingerSignal {
    #[default]
    Neutral,
    OversoldBuy,
    OverboughtSell,
    BelowMean,
    AboveMean,
}

impl BollingerSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            BollingerSignal::Neutral => "neutral",
            BollingerSignal::OversoldBuy => "oversold_buy",
            BollingerSignal::OverboughtSell => "overbought_sell",
            BollingerSignal::BelowMean => "below_mean",
            BollingerSignal::AboveMean => "above_mean",
        }
    }
}

pub fn calculate_bollinger(closes: &[f64], period: usize, multiplier: f64) -> Option<Bands> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let window = &closes[closes.len() - period..];
    let middle = window.iter().sum::<f64>() / period as f64;
    let variance = window
        .iter()
        .map(|c| {
            let diff = c - middle;
            diff * diff
        })
        .sum::<f64>()
        / period as f64;
    let stddev = variance.sqrt();

    Some(Bands {
        upper: middle + multiplier * stddev,
        middle,
        lower: middle - multiplier * stddev,
    })
}

pub fn calculate_bollinger_default(closes: &[f64]) -> Option<Bands> {
    calculate_bollinger(closes, DEFAULT_PERIOD, DEFAULT_MULTIPLIER)
}

pub fn bollinger_signal(price: f64, bands: Option<Bands>) -> BollingerSignal {
    let Some(bands) = bands else {
        return BollingerSignal::Neutral;
    };

    if price <= bands.lower {
        BollingerSignal::OversoldBuy
    } else if price >= bands.upper {
        BollingerSignal::OverboughtSell
    } else if price < bands.middle {
        BollingerSignal::BelowMean
    } else {
        BollingerSignal::AboveMean
    }
}
