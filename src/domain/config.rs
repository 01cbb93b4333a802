//! Engine configuration.
//!
//! Built once (usually from an INI file, see `cli::build_engine_config`) and
//! passed by reference into selection, sizing and the simulator.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::domain::market::UNKNOWN_SECTOR;

pub const DEFAULT_INITIAL_FUNDS: f64 = 25_000.0;
pub const DEFAULT_DAILY_TARGET: f64 = 150.0;

pub const DEFAULT_TICKERS: [&str; 18] = [
    "AAPL", "MSFT", "NVDA", "TSLA", "GOOG", "AMZN", "META", "NFLX", "CRM", "ADBE", "AMD", "ORCL",
    "PYPL", "INTC", "QCOM", "TXN", "AVGO", "CSCO",
];

pub const DEFAULT_ALLOWED_SECTORS: [&str; 8] = [
    "Tech",
    "Auto",
    "Media",
    "E-Commerce",
    "Finance",
    "Healthcare",
    "Energy",
    "Consumer",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizingMethod {
    #[default]
    Adaptive,
    Equal,
    Custom,
}

impl FromStr for SizingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "adaptive" => Ok(SizingMethod::Adaptive),
            "equal" => Ok(SizingMethod::Equal),
            "custom" => Ok(SizingMethod::Custom),
            other => Err(format!(
                "unknown sizing method '{other}' (expected adaptive, equal or custom)"
            )),
        }
    }
}

impl fmt::Display for SizingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SizingMethod::Adaptive => "adaptive",
            SizingMethod::Equal => "equal",
            SizingMethod::Custom => "custom",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionSizingConfig {
    pub method: SizingMethod,
    pub min_position_value: f64,
    pub max_position_value: f64,
    pub max_positions: usize,
    pub risk_per_trade: f64,
}

impl Default for PositionSizingConfig {
    fn default() -> Self {
        PositionSizingConfig {
            method: SizingMethod::Adaptive,
            min_position_value: 500.0,
            max_position_value: 4000.0,
            max_positions: 18,
            risk_per_trade: 0.03,
        }
    }
}

/// Strategy thresholds carried with the configuration. The decision engine
/// uses its own regime tables; these are validated and reported.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub profit_threshold: f64,
    pub stop_loss_pct: f64,
    pub trailing_stop_pct: f64,
    pub volume_threshold: f64,
    pub volatility_threshold: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            profit_threshold: 0.004,
            stop_loss_pct: 0.025,
            trailing_stop_pct: 0.02,
            volume_threshold: 1_000_000.0,
            volatility_threshold: 0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub ticker_universe: Vec<String>,
    pub position_sizing: PositionSizingConfig,
    pub custom_position_sizes: BTreeMap<String, f64>,
    pub strategy: StrategyConfig,
    pub initial_funds: f64,
    pub daily_target: f64,
    pub allowed_sectors: Vec<String>,
    pub sectors: HashMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            ticker_universe: DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect(),
            position_sizing: PositionSizingConfig::default(),
            custom_position_sizes: BTreeMap::new(),
            strategy: StrategyConfig::default(),
            initial_funds: DEFAULT_INITIAL_FUNDS,
            daily_target: DEFAULT_DAILY_TARGET,
            allowed_sectors: default_allowed_sectors(),
            sectors: HashMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn sector_of(&self, ticker: &str) -> &str {
        self.sectors
            .get(ticker)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_SECTOR)
    }
}

pub fn default_allowed_sectors() -> Vec<String> {
    DEFAULT_ALLOWED_SECTORS
        .iter()
        .map(|s| s.to_string())
        .collect()
}
