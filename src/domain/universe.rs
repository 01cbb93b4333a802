//! Ticker universe: parsing the configured ticker list and picking the
//! tickers to trade from a snapshot.

use crate::domain::config::EngineConfig;
use crate::domain::market::MarketSnapshot;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),

    #[error("ticker list is empty")]
    Empty,
}

/// Parse a comma separated ticker list. Tickers are trimmed and uppercased;
/// empty tokens and duplicates are rejected.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    if input.trim().is_empty() {
        return Err(UniverseError::Empty);
    }

    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

/// Parse a comma separated list of labels (sectors), keeping their case.
/// Blank entries are dropped.
pub fn parse_labels(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configured tickers present in the snapshot, in configured order, capped at
/// `max_positions`.
pub fn select_universe(config: &EngineConfig, snapshot: &MarketSnapshot) -> Vec<String> {
    config
        .ticker_universe
        .iter()
        .filter(|t| snapshot.contains(t))
        .take(config.position_sizing.max_positions)
        .cloned()
        .collect()
}
