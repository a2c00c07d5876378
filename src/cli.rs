//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestConfig, BacktestEngine, BacktestResult, RecordSelection};
use crate::domain::balance::DEFAULT_STARTING_BALANCE;
use crate::domain::config_validation::{
    parse_number, parse_optional, strategy_name, validate_backtest_config,
    validate_strategy_config,
};
use crate::domain::error::BacktestError;
use crate::domain::indicator::parse_indicator_list;
use crate::domain::session::{self, DEFAULT_SESSION_LENGTH, TrailingSession};
use crate::domain::strategy::{
    DEFAULT_HEIKIN_PERIOD, DEFAULT_LONG_PERIOD, DEFAULT_ORDER_SIZE, DEFAULT_RSI_MAX,
    DEFAULT_RSI_MIN, DEFAULT_RSI_PERIOD, DEFAULT_SHORT_PERIOD, DEFAULT_SIGNAL_PERIOD,
    StrategyConfig, StrategyKind, StrategyName,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "intraday-backtest", about = "Intraday strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Bar file, overriding [data] path
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Series CSV; the summary goes next to it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the extent of the bar data
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data,
            output,
        } => run_backtest(&config, data.as_deref(), output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, data } => run_info(&config, data.as_deref()),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn fail(err: BacktestError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

fn run_backtest(config_path: &Path, data: Option<&Path>, output: Option<&Path>) -> ExitCode {
    // Stage 1: Load config
    info!(path = %config_path.display(), "loading config");
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Validate
    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(e);
    }
    if let Err(e) = validate_strategy_config(&adapter) {
        return fail(e);
    }

    // Stage 3: Build typed configs
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let strategy_config = match build_strategy_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    info!(strategy = %strategy_config.kind, "strategy configured");

    // Stage 4: Resolve data source
    let data_path = match resolve_data_path(data, &adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let data_port = CsvAdapter::new(data_path);

    // Stages 5-7: Load, replay, report
    match run_backtest_pipeline(&data_port, &strategy_config, &bt_config, output) {
        Ok(result) => {
            print_report(&result);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

/// Loads bars, replays them and writes the CSV reports when `output` is set.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    strategy_config: &StrategyConfig,
    bt_config: &BacktestConfig,
    output: Option<&Path>,
) -> Result<BacktestResult, BacktestError> {
    let bars = data_port.fetch_bars()?;
    info!(bars = bars.len(), "bars loaded");

    let engine = BacktestEngine::new(bt_config.clone(), bars, strategy_config.build())?;
    let result = engine.run()?;

    if let Some(path) = output {
        if result.sessions.is_empty() {
            warn!(record = %bt_config.record, "no sessions recorded, series file will be empty");
        }
        let reporter = CsvReportAdapter::new();
        reporter.write_series(&result, path)?;
        reporter.write_summary(&result, &CsvReportAdapter::summary_path(path))?;
    }
    Ok(result)
}

fn print_report(result: &BacktestResult) {
    println!("strategy: {}", result.strategy);
    for (name, value) in result.report.entries() {
        if name == "total_trades" {
            println!("{name}: {value}");
        } else {
            println!("{name}: {value:.2}");
        }
    }
    println!("final_position: {}", result.final_position);
    println!(
        "sessions: {} processed, {} skipped, {} bars",
        result.sessions_processed, result.sessions_skipped, result.bars_processed
    );
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, BacktestError> {
    let session_length = parse_number::<usize>(adapter, "backtest", "session_length")?
        .unwrap_or(DEFAULT_SESSION_LENGTH);
    if session_length == 0 {
        return Err(BacktestError::invalid(
            "backtest",
            "session_length",
            "session_length must be at least 1",
        ));
    }

    Ok(BacktestConfig {
        starting_balance: parse_number::<f64>(adapter, "backtest", "starting_balance")?
            .unwrap_or(DEFAULT_STARTING_BALANCE),
        session_length,
        trailing_session: parse_optional::<TrailingSession>(adapter, "backtest", "trailing_session")?
            .unwrap_or_default(),
        record: parse_optional::<RecordSelection>(adapter, "backtest", "record")?
            .unwrap_or_default(),
        stop_after_record: adapter.get_bool("backtest", "stop_after_record", false),
        skip_unrecorded: adapter.get_bool("backtest", "skip_unrecorded", false),
        allow_reversal: adapter.get_bool("backtest", "allow_reversal", true),
    })
}

fn period(adapter: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, BacktestError> {
    let value = parse_number::<usize>(adapter, "strategy", key)?.unwrap_or(default);
    if value == 0 {
        return Err(BacktestError::invalid(
            "strategy",
            key,
            format!("{key} must be at least 1"),
        ));
    }
    Ok(value)
}

pub fn build_strategy_config(adapter: &dyn ConfigPort) -> Result<StrategyConfig, BacktestError> {
    let kind = match strategy_name(adapter)? {
        StrategyName::MaCrossover => StrategyKind::MaCrossover {
            short_period: period(adapter, "short_period", DEFAULT_SHORT_PERIOD)?,
            long_period: period(adapter, "long_period", DEFAULT_LONG_PERIOD)?,
        },
        StrategyName::MacdCrossover => StrategyKind::MacdCrossover {
            short_period: period(adapter, "short_period", DEFAULT_SHORT_PERIOD)?,
            long_period: period(adapter, "long_period", DEFAULT_LONG_PERIOD)?,
            signal_period: period(adapter, "signal_period", DEFAULT_SIGNAL_PERIOD)?,
        },
        StrategyName::RsiPosition => StrategyKind::RsiPosition {
            period: period(adapter, "rsi_period", DEFAULT_RSI_PERIOD)?,
            min: parse_number::<f64>(adapter, "strategy", "rsi_min")?.unwrap_or(DEFAULT_RSI_MIN),
            max: parse_number::<f64>(adapter, "strategy", "rsi_max")?.unwrap_or(DEFAULT_RSI_MAX),
        },
        StrategyName::HeikinAshi => StrategyKind::HeikinAshi {
            period: period(adapter, "heikin_period", DEFAULT_HEIKIN_PERIOD)?,
        },
    };

    let order_size = parse_number::<u64>(adapter, "strategy", "order_size")?
        .unwrap_or(DEFAULT_ORDER_SIZE);
    if order_size == 0 {
        return Err(BacktestError::invalid(
            "strategy",
            "order_size",
            "order_size must be at least 1",
        ));
    }

    let panel = match adapter.get_string("strategy", "panel") {
        Some(list) => parse_indicator_list(&list)
            .map_err(|reason| BacktestError::invalid("strategy", "panel", reason))?,
        None => Vec::new(),
    };

    Ok(StrategyConfig {
        kind,
        order_size,
        panel,
    })
}

/// `--data` wins over `[data] path`.
pub fn resolve_data_path(
    data_override: Option<&Path>,
    config: &dyn ConfigPort,
) -> Result<PathBuf, BacktestError> {
    if let Some(path) = data_override {
        return Ok(path.to_path_buf());
    }
    config
        .get_string("data", "path")
        .map(PathBuf::from)
        .ok_or_else(|| BacktestError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        })
}

pub fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(e);
    }
    if let Err(e) = validate_strategy_config(&adapter) {
        return fail(e);
    }
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let strategy_config = match build_strategy_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    eprintln!("\nBacktest:");
    eprintln!("  starting_balance: {}", bt_config.starting_balance);
    eprintln!("  session_length:   {}", bt_config.session_length);
    eprintln!("  trailing_session: {}", bt_config.trailing_session);
    eprintln!("  record:           {}", bt_config.record);
    eprintln!("  allow_reversal:   {}", bt_config.allow_reversal);

    eprintln!("\nStrategy:");
    eprintln!("  {}", strategy_config.kind);
    eprintln!("  order_size: {}", strategy_config.order_size);
    if !strategy_config.panel.is_empty() {
        let panel: Vec<String> = strategy_config.panel.iter().map(|i| i.to_string()).collect();
        eprintln!("  panel: {}", panel.join(", "));
    }

    match resolve_data_path(None, &adapter) {
        Ok(path) => eprintln!("\nData: {}", path.display()),
        Err(_) => eprintln!("\nData: not set (pass --data when running)"),
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

pub fn run_info(config_path: &Path, data: Option<&Path>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(e);
    }
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let data_path = match resolve_data_path(data, &adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    let data_port = CsvAdapter::new(&data_path);
    match data_port.data_range() {
        Ok(Some(range)) => {
            let sessions = session::session_count(
                range.bars,
                bt_config.session_length,
                bt_config.trailing_session,
            );
            println!(
                "{}: {} bars over {} days, {} to {}",
                data_path.display(),
                range.bars,
                range.days,
                range.first,
                range.last
            );
            println!(
                "{} sessions of {} bars (trailing: {})",
                sessions, bt_config.session_length, bt_config.trailing_session
            );
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("{}: no data found", data_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}
