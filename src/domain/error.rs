//! Domain error types.
//!
//! The decision engine itself never fails: insufficient history and degenerate
//! numbers resolve to fallback values. Errors only arise at the edges, when
//! configuration, market data or report files are read and written.

use crate::domain::universe::UniverseError;

/// Top-level error type for daytrader.
#[derive(Debug, thiserror::Error)]
pub enum DaytraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error("market data error: {reason}")]
    Data { reason: String },

    #[error("no market data for {ticker}")]
    NoData { ticker: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&DaytraderError> for std::process::ExitCode {
    fn from(err: &DaytraderError) -> Self {
        let code: u8 = match err {
            DaytraderError::Io(_) | DaytraderError::Report { .. } => 1,
            DaytraderError::ConfigParse { .. }
            | DaytraderError::ConfigMissing { .. }
            | DaytraderError::ConfigInvalid { .. }
            | DaytraderError::Universe(_) => 2,
            DaytraderError::Data { .. } => 3,
            DaytraderError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
