//! Trade log output port trait.

use crate::domain::error::DaytraderError;
use crate::domain::trade_plan::TradePlan;

/// Port for persisting a run's trade log.
pub trait TradeLogPort {
    fn write(&self, trades: &[TradePlan], output_path: &str) -> Result<(), DaytraderError>;
}
