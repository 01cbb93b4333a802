//! Intraday price action: the open-to-close move of the current bar.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceAction {
    StrongBullish,
    Bullish,
    #[default]
    Neutral,
    Bearish,
    StrongBearish,
}

impl PriceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceAction::StrongBullish => "strong_bullish",
            PriceAction::Bullish => "bullish",
            PriceAction::Neutral => "neutral",
            PriceAction::Bearish => "bearish",
            PriceAction::StrongBearish => "strong_bearish",
        }
    }
}

pub fn price_action(open: f64, close: f64) -> PriceAction {
    if open == 0.0 || !open.is_finite() {
        return PriceAction::Neutral;
    }

    let change = (close - open) / open;
    if change > 0.02 {
        PriceAction::StrongBullish
    } else if change > 0.005 {
        PriceAction::Bullish
    } else if change < -0.02 {
        PriceAction::StrongBearish
    } else if change < -0.005 {
        PriceAction::Bearish
    } else {
        PriceAction::Neutral
    }
}
