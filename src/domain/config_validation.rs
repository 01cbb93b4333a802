//! Configuration validation.
//!
//! Checks raw INI values before an `EngineConfig` or `BacktestConfig` is
//! built from them. Missing keys fall back to defaults; present keys must be
//! well formed.

use crate::domain::backtest::SelectionMode;
use crate::domain::config::SizingMethod;
use crate::domain::error::DaytraderError;
use crate::domain::universe::parse_tickers;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::str::FromStr;

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> DaytraderError {
    DaytraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_engine_config(config: &dyn ConfigPort) -> Result<(), DaytraderError> {
    validate_funds(config)?;
    validate_tickers(config)?;
    validate_position_sizing(config)?;
    validate_custom_sizes(config)?;
    validate_strategy(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), DaytraderError> {
    validate_dates(config)?;
    validate_selection(config)?;
    validate_lookback(config)?;
    Ok(())
}

/// Parse `[section] key` when present. A value that does not parse is an
/// error rather than a silent fallback to the default.
fn number<T: FromStr>(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<T>, DaytraderError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("expected a number, got '{raw}'"))),
    }
}

fn validate_funds(config: &dyn ConfigPort) -> Result<(), DaytraderError> {
    if number::<f64>(config, "engine", "initial_funds")?.is_some_and(|v| v <= 0.0) {
        return Err(invalid("engine", "initial_funds", "initial_funds must be positive"));
    }
    if number::<f64>(config, "engine", "daily_target")?.is_some_and(|v| v < 0.0) {
        return Err(invalid("engine", "daily_target", "daily_target must be non-negative"));
    }
    Ok(())
}

fn validate_tickers(config: &dyn ConfigPort) -> Result<(), DaytraderError> {
    if let Some(raw) = config.get_string("engine", "tickers") {
        parse_tickers(&raw)?;
    }
    Ok(())
}

fn validate_position_sizing(config: &dyn ConfigPort) -> Result<(), DaytraderError> {
    if let Some(method) = config.get_string("position_sizing", "method") {
        method
            .parse::<SizingMethod>()
            .map_err(|reason| invalid("position_sizing", "method", reason))?;
    }

    let min = number::<f64>(config, "position_sizing", "min_position_value")?.unwrap_or(0.0);
    let max = number::<f64>(config, "position_sizing", "max_position_value")?.unwrap_or(f64::MAX);
    if min < 0.0 {
        return Err(invalid(
            "position_sizing",
            "min_position_value",
            "min_position_value must be non-negative",
        ));
    }
    if min > max {
        return Err(invalid(
            "position_sizing",
            "min_position_value",
            "min_position_value must not exceed max_position_value",
        ));
    }

    if number::<i64>(config, "position_sizing", "max_positions")?.is_some_and(|v| v <= 0) {
        return Err(invalid(
            "position_sizing",
            "max_positions",
            "max_positions must be at least 1",
        ));
    }

    if number::<f64>(config, "position_sizing", "risk_per_trade")?.is_some_and(|r| r <= 0.0 || r > 1.0) {
        return Err(invalid(
            "position_sizing",
            "risk_per_trade",
            "risk_per_trade must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_custom_sizes(config: &dyn ConfigPort) -> Result<(), DaytraderError> {
    for (ticker, value) in config.get_section("custom_position_sizes") {
        match value.trim().parse::<f64>() {
            Ok(v) if v > 0.0 => {}
            _ => {
                return Err(invalid(
                    "custom_position_sizes",
                    &ticker,
                    format!("expected a positive dollar amount, got '{value}'"),
                ));
            }
        }
    }
    Ok(())
}

fn validate_strategy(config: &dyn ConfigPort) -> Result<(), DaytraderError> {
    for key in [
        "profit_threshold",
        "stop_loss_pct",
        "trailing_stop_pct",
        "volume_threshold",
        "volatility_threshold",
    ] {
        if number::<f64>(config, "strategy", key)?.is_some_and(|v| v < 0.0) {
            return Err(invalid("strategy", key, format!("{key} must be non-negative")));
        }
    }
    Ok(())
}

/// Parse a `[backtest]` date key.
pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, DaytraderError> {
    match value {
        None => Err(DaytraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "backtest",
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), DaytraderError> {
    let start_date = parse_date(config.get_string("backtest", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(config.get_string("backtest", "end_date").as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

fn validate_selection(config: &dyn ConfigPort) -> Result<(), DaytraderError> {
    if let Some(mode) = config.get_string("backtest", "selection") {
        mode.parse::<SelectionMode>()
            .map_err(|reason| invalid("backtest", "selection", reason))?;
    }
    Ok(())
}

fn validate_lookback(config: &dyn ConfigPort) -> Result<(), DaytraderError> {
    if number::<i64>(config, "backtest", "history_lookback")?.is_some_and(|v| v <= 0) {
        return Err(invalid(
            "backtest",
            "history_lookback",
            "history_lookback must be at least 1",
        ));
    }
    Ok(())
}
