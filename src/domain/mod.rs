//! Core domain types and logic.

pub mod market;
pub mod regime;
pub mod indicator;
pub mod selection;
pub mod sizing;
pub mod decision;
pub mod trade_plan;
pub mod portfolio;
pub mod backtest;
pub mod metrics;
pub mod config;
pub mod config_validation;
pub mod universe;
pub mod error;
