//! RSI (Relative Strength Index) over trailing closes.
//!
//! Averages are the plain mean of the last n gains and losses (not Wilder's
//! smoothing):
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Needs n + 1 closes (n price changes); with fewer the result is a neutral 50.

pub const DEFAULT_PERIOD: usize = 14;
pub const NEUTRAL_RSI: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RsiSignal {
    #[default]
    Neutral,
    OversoldBuy,
    OverboughtSell,
    Bearish,
    Bullish,
}

impl RsiSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            RsiSignal::Neutral => "neutral",
            RsiSignal::OversoldBuy => "oversold_buy",
            RsiSignal::OverboughtSell => "overbought_sell",
            RsiSignal::Bearish => "bearish",
            RsiSignal::Bullish => "bullish",
        }
    }
}

pub fn calculate_rsi(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period + 1 {
        return NEUTRAL_RSI;
    }

    let recent = &closes[closes.len() - (period + 1)..];
    let (gain_sum, loss_sum) = recent
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0, 0.0), |(g, l), delta| {
            if delta > 0.0 {
                (g + delta, l)
            } else {
                (g, l - delta)
            }
        });

    let avg_gain = gain_sum / period as f64;
    let avg_loss = loss_sum / period as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }

    100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
}

pub fn rsi_signal(rsi: f64) -> RsiSignal {
    if rsi < 30.0 {
        RsiSignal::OversoldBuy
    } else if rsi > 70.0 {
        RsiSignal::OverboughtSell
    } else if rsi < 50.0 {
        RsiSignal::Bearish
    } else {
        RsiSignal::Bullish
    }
}
