//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvSnapshotProvider;
use crate::adapters::csv_report::CsvTradeLog;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{
    run_backtest, BacktestConfig, SelectionMode, DEFAULT_HISTORY_LOOKBACK,
};
use crate::domain::config::{
    default_allowed_sectors, EngineConfig, PositionSizingConfig, StrategyConfig,
    DEFAULT_DAILY_TARGET, DEFAULT_INITIAL_FUNDS,
};
use crate::domain::config_validation::{
    parse_date, validate_backtest_config, validate_engine_config,
};
use crate::domain::decision::decide;
use crate::domain::error::DaytraderError;
use crate::domain::market::MarketSnapshot;
use crate::domain::metrics::{RiskReport, RunSummary};
use crate::domain::regime::{detect_regime, Regime};
use crate::domain::sizing::size_by_config;
use crate::domain::trade_plan::TradePlan;
use crate::domain::universe::{parse_labels, parse_tickers, select_universe};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::SnapshotProvider;
use crate::ports::report_port::TradeLogPort;

#[derive(Parser, Debug)]
#[command(name = "daytrader", about = "Rule-based day-trading planner and backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay the engine over the configured date range
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory of <TICKER>.csv files
        #[arg(short, long)]
        data: PathBuf,
        /// Write the trade log as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Plan trades for a single day
    Plan {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        /// YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// `info` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data,
            output,
        } => run_backtest_command(&config, &data, output.as_ref()),
        Command::Plan { config, data, date } => run_plan_command(&config, &data, date),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = DaytraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn report(err: DaytraderError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

fn invalid(section: &str, key: &str, reason: String) -> DaytraderError {
    DaytraderError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason,
    }
}

/// Build the engine configuration. Absent keys take their defaults.
pub fn build_engine_config(adapter: &dyn ConfigPort) -> Result<EngineConfig, DaytraderError> {
    validate_engine_config(adapter)?;
    let defaults = EngineConfig::default();
    let sizing_defaults = PositionSizingConfig::default();
    let strategy_defaults = StrategyConfig::default();

    let ticker_universe = match adapter.get_string("engine", "tickers") {
        Some(raw) => parse_tickers(&raw)?,
        None => defaults.ticker_universe,
    };

    let allowed_sectors = adapter
        .get_string("engine", "allowed_sectors")
        .map(|raw| parse_labels(&raw))
        .filter(|sectors| !sectors.is_empty())
        .unwrap_or_else(default_allowed_sectors);

    let method = match adapter.get_string("position_sizing", "method") {
        Some(raw) => raw
            .parse()
            .map_err(|reason| invalid("position_sizing", "method", reason))?,
        None => sizing_defaults.method,
    };

    let position_sizing = PositionSizingConfig {
        method,
        min_position_value: adapter.get_double(
            "position_sizing",
            "min_position_value",
            sizing_defaults.min_position_value,
        ),
        max_position_value: adapter.get_double(
            "position_sizing",
            "max_position_value",
            sizing_defaults.max_position_value,
        ),
        max_positions: adapter.get_int(
            "position_sizing",
            "max_positions",
            sizing_defaults.max_positions as i64,
        ) as usize,
        risk_per_trade: adapter.get_double(
            "position_sizing",
            "risk_per_trade",
            sizing_defaults.risk_per_trade,
        ),
    };

    let custom_position_sizes = adapter
        .get_section("custom_position_sizes")
        .into_iter()
        .filter_map(|(ticker, value)| {
            value
                .trim()
                .parse::<f64>()
                .ok()
                .map(|v| (ticker.to_uppercase(), v))
        })
        .collect();

    let strategy = StrategyConfig {
        profit_threshold: adapter.get_double(
            "strategy",
            "profit_threshold",
            strategy_defaults.profit_threshold,
        ),
        stop_loss_pct: adapter.get_double("strategy", "stop_loss_pct", strategy_defaults.stop_loss_pct),
        trailing_stop_pct: adapter.get_double(
            "strategy",
            "trailing_stop_pct",
            strategy_defaults.trailing_stop_pct,
        ),
        volume_threshold: adapter.get_double(
            "strategy",
            "volume_threshold",
            strategy_defaults.volume_threshold,
        ),
        volatility_threshold: adapter.get_double(
            "strategy",
            "volatility_threshold",
            strategy_defaults.volatility_threshold,
        ),
    };

    let sectors: HashMap<String, String> = adapter
        .get_section("sectors")
        .into_iter()
        .map(|(ticker, sector)| (ticker.to_uppercase(), sector.trim().to_string()))
        .collect();

    Ok(EngineConfig {
        ticker_universe,
        position_sizing,
        custom_position_sizes,
        strategy,
        initial_funds: adapter.get_double("engine", "initial_funds", DEFAULT_INITIAL_FUNDS),
        daily_target: adapter.get_double("engine", "daily_target", DEFAULT_DAILY_TARGET),
        allowed_sectors,
        sectors,
    })
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, DaytraderError> {
    validate_backtest_config(adapter)?;

    let start_date = parse_date(adapter.get_string("backtest", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(adapter.get_string("backtest", "end_date").as_deref(), "end_date")?;

    let selection = match adapter.get_string("backtest", "selection") {
        Some(raw) => raw
            .parse::<SelectionMode>()
            .map_err(|reason| invalid("backtest", "selection", reason))?,
        None => SelectionMode::default(),
    };

    Ok(BacktestConfig {
        start_date,
        end_date,
        selection,
        technical_history: adapter.get_bool("backtest", "technical_history", false),
        history_lookback: adapter.get_int(
            "backtest",
            "history_lookback",
            DEFAULT_HISTORY_LOOKBACK as i64,
        ) as usize,
    })
}

fn load_provider(data: &PathBuf, engine: &EngineConfig) -> Result<CsvSnapshotProvider, DaytraderError> {
    let provider = CsvSnapshotProvider::load(data, engine)?;
    if provider.tickers().is_empty() {
        return Err(DaytraderError::NoData {
            ticker: engine.ticker_universe.join(","),
        });
    }
    if let Some((first, last)) = provider.date_range() {
        info!(tickers = provider.tickers().len(), %first, %last, "loaded market data");
    }
    Ok(provider)
}

fn run_backtest_command(config_path: &PathBuf, data: &PathBuf, output: Option<&PathBuf>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let engine = match build_engine_config(&adapter) {
        Ok(c) => c,
        Err(e) => return report(e),
    };
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return report(e),
    };
    let provider = match load_provider(data, &engine) {
        Ok(p) => p,
        Err(e) => return report(e),
    };

    run_backtest_pipeline(&provider, &engine, &bt_config, output)
}

/// Run the simulator, print the run summary and optionally write the trade log.
pub fn run_backtest_pipeline(
    provider: &dyn SnapshotProvider,
    engine: &EngineConfig,
    bt_config: &BacktestConfig,
    output: Option<&PathBuf>,
) -> ExitCode {
    eprintln!(
        "Running backtest: {} tickers, {} to {} ({} selection)",
        engine.ticker_universe.len(),
        bt_config.start_date,
        bt_config.end_date,
        bt_config.selection,
    );

    let result = match run_backtest(provider, engine, bt_config) {
        Ok(r) => r,
        Err(e) => return report(e),
    };

    let summary = RunSummary::compute(result.trades(), engine.daily_target);
    print_summary(&summary, result.empty_days);
    if let Some(peak) = result.portfolio.peak_equity() {
        eprintln!("\n=== Funds ===");
        eprintln!("Starting Funds: ${:.2}", result.portfolio.initial_funds);
        eprintln!("Ending Funds:   ${:.2}", result.portfolio.available_funds());
        eprintln!("Peak Funds:     ${:.2} on {}", peak.equity, peak.date);
    }

    if let Some(output) = output {
        let path = output.display().to_string();
        if let Err(e) = CsvTradeLog::new().write(result.trades(), &path) {
            return report(e);
        }
        eprintln!("\nTrade log written to: {path}");
    }

    ExitCode::SUCCESS
}

fn print_summary(summary: &RunSummary, empty_days: usize) {
    eprintln!("\n=== Backtest Results ===");
    eprintln!("Total Trades:          {}", summary.total_trades);
    eprintln!("Total Expected Profit: ${:.2}", summary.total_profit);
    if empty_days > 0 {
        eprintln!("Days Without Data:     {empty_days}");
    }

    if summary.total_trades == 0 {
        return;
    }

    eprintln!("\n=== Exit Types ===");
    for e in &summary.exit_types {
        eprintln!("{:<18} {:>6} ({:.1}%)", e.exit_type.as_str(), e.count, e.share * 100.0);
    }

    let total = summary.total_trades as f64;
    eprintln!("\n=== Profitability ===");
    eprintln!(
        "Profitable:     {} ({:.1}%)",
        summary.profitable,
        summary.profitable as f64 / total * 100.0
    );
    eprintln!(
        "Non-Profitable: {} ({:.1}%)",
        summary.non_profitable,
        summary.non_profitable as f64 / total * 100.0
    );
    if summary.profitable > 0 {
        eprintln!("Average Profitable Trade: ${:.2}", summary.average_profitable);
    }

    let daily = &summary.daily;
    eprintln!("\n=== Daily Performance ===");
    eprintln!("Trading Days:   {}", daily.trading_days);
    eprintln!("Average Day:    ${:.2}", daily.average);
    eprintln!("Best Day:       ${:.2}", daily.best);
    eprintln!("Worst Day:      ${:.2}", daily.worst);
    eprintln!("Positive Days:  {}", daily.positive_days);
    eprintln!("Days At Target: {}", daily.days_at_target);

    eprintln!("\n=== Confidence ===");
    for (label, bucket) in [
        ("High (>=0.7)", &summary.high_confidence),
        ("Medium (0.5-0.7)", &summary.medium_confidence),
        ("Low (<0.5)", &summary.low_confidence),
    ] {
        eprintln!(
            "{:<17} {:>6} trades, avg ${:.2}",
            label, bucket.count, bucket.average_profit
        );
    }

    eprintln!("\n=== Target ===");
    eprintln!("Target: ${:.2}", summary.target_total);
    eprintln!("Actual: ${:.2} ({:.1}%)", summary.total_profit, summary.target_ratio() * 100.0);

    eprintln!("\n=== Monthly ===");
    for ((year, month), profit) in &summary.monthly {
        eprintln!("{year}-{month:02}: ${profit:.2}");
    }
}

/// One planned trade plus what the configured sizing method would allocate.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedTrade {
    pub plan: TradePlan,
    pub config_shares: u64,
    pub config_investment: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayPlan {
    pub regime: Regime,
    pub tickers: Vec<String>,
    pub trades: Vec<PlannedTrade>,
    pub risk: RiskReport,
}

/// Plan a single day against its own snapshot. Funds are split across the
/// selected tickers and shrink by each position's invested amount before the
/// next ticker is decided.
pub fn plan_day(snapshot: &MarketSnapshot, engine: &EngineConfig) -> DayPlan {
    let regime = detect_regime(snapshot);
    let tickers = select_universe(engine, snapshot);
    let min_tickers = tickers.len();
    let mut funds = engine.initial_funds;
    let mut trades = Vec::with_capacity(tickers.len());

    for ticker in &tickers {
        let Some(bar) = snapshot.get(ticker) else {
            continue;
        };
        let plan = decide(Some(bar), funds, min_tickers, regime, None);
        let (config_shares, config_investment) =
            size_by_config(ticker, bar.open, funds, regime, engine);
        funds -= plan.invested;
        trades.push(PlannedTrade {
            plan,
            config_shares,
            config_investment,
        });
    }

    let plans: Vec<TradePlan> = trades.iter().map(|t| t.plan.clone()).collect();
    DayPlan {
        regime,
        tickers,
        risk: RiskReport::compute(&plans),
        trades,
    }
}

fn run_plan_command(config_path: &PathBuf, data: &PathBuf, date: NaiveDate) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let engine = match build_engine_config(&adapter) {
        Ok(c) => c,
        Err(e) => return report(e),
    };
    let provider = match load_provider(data, &engine) {
        Ok(p) => p,
        Err(e) => return report(e),
    };
    run_plan_pipeline(&provider, &engine, date)
}

/// Print the plan for `date`. Exit code 5 when the provider has no bars for it.
pub fn run_plan_pipeline(provider: &dyn SnapshotProvider, engine: &EngineConfig, date: NaiveDate) -> ExitCode {
    let snapshot = match provider.get_snapshot(date) {
        Ok(s) => s,
        Err(e) => return report(e),
    };
    if snapshot.is_empty() {
        warn!(%date, "no market data");
        return report(DaytraderError::NoData {
            ticker: format!("any ticker on {date}"),
        });
    }

    eprintln!(
        "Planning {date} with ${:.2} aiming for ${:.2}",
        engine.initial_funds, engine.daily_target
    );
    eprintln!("Position sizing method: {}", engine.position_sizing.method);
    let day = plan_day(&snapshot, engine);
    info!(regime = %day.regime, tickers = day.tickers.len(), "planned day");
    eprintln!("Market regime: {}", day.regime);
    eprintln!("Selected tickers: {}", day.tickers.join(", "));

    for t in &day.trades {
        let p = &t.plan;
        println!(
            "{:<6} entry={:<9} exit={:<9} type={:<16} stop={:<9} shares={:<5} invested={:<10.2} profit={:<8.2} conf={:.2} sized={}@{:.2}",
            p.ticker,
            fmt_price(p.entry),
            fmt_price(p.exit),
            p.exit_type.map(|e| e.as_str()).unwrap_or("-"),
            fmt_price(p.stop_loss),
            p.shares,
            p.invested,
            p.expected_profit,
            p.confidence,
            t.config_shares,
            t.config_investment,
        );
    }

    eprintln!("\n--- Risk Report ---");
    eprintln!("Total Invested: ${:.2}", day.risk.total_invested);
    eprintln!(
        "Maximum Possible Loss (if all stop-losses hit): ${:.2}",
        day.risk.max_loss
    );
    eprintln!(
        "Expected Profit (if all targets hit): ${:.2}",
        day.risk.expected_profit
    );
    eprintln!("Number of trades: {}", day.risk.trade_count);

    ExitCode::SUCCESS
}

fn fmt_price(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".into())
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let engine = match build_engine_config(&adapter) {
        Ok(c) => c,
        Err(e) => return report(e),
    };
    eprintln!("\nEngine:");
    eprintln!("  initial_funds: {:.2}", engine.initial_funds);
    eprintln!("  daily_target:  {:.2}", engine.daily_target);
    eprintln!("  tickers:       {}", engine.ticker_universe.join(", "));
    eprintln!("  sectors:       {}", engine.allowed_sectors.join(", "));
    eprintln!(
        "  sizing:        {} (max {} positions, {:.0}-{:.0})",
        engine.position_sizing.method,
        engine.position_sizing.max_positions,
        engine.position_sizing.min_position_value,
        engine.position_sizing.max_position_value
    );

    if adapter.get_string("backtest", "start_date").is_some() {
        match build_backtest_config(&adapter) {
            Ok(bt) => {
                eprintln!("\nBacktest:");
                eprintln!("  range:     {} to {}", bt.start_date, bt.end_date);
                eprintln!("  selection: {}", bt.selection);
                eprintln!(
                    "  history:   {} (lookback {})",
                    bt.technical_history, bt.history_lookback
                );
            }
            Err(e) => return report(e),
        }
    }

    eprintln!("\nConfiguration is valid");
    ExitCode::SUCCESS
}
