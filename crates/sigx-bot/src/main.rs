//! sigx - Signal Execution Engine - Entry Point
//!
//! Executes one trade signal: sizes it, places the legs, waits for the
//! private stream to confirm them and prints the report as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use sigx_bot::{AppConfig, ExecutionOrchestrator, ExecutionPlanner};
use sigx_core::{Direction, Price, Signal};
use sigx_executor::ApiCredentials;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Execute a trade signal as margin orders
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via SIGX_CONFIG env var)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Signal as a JSON file
    #[arg(long, conflicts_with_all = ["ticker", "direction", "entry", "target", "stoploss"])]
    signal: Option<PathBuf>,

    /// Base ticker, e.g. SOL
    #[arg(long)]
    ticker: Option<String>,

    /// LONG or SHORT
    #[arg(long)]
    direction: Option<Direction>,

    /// Entry prices (comma separated)
    #[arg(long, value_delimiter = ',')]
    entry: Vec<Decimal>,

    /// Target prices in order (comma separated); the first is the take-profit
    #[arg(long, value_delimiter = ',')]
    target: Vec<Decimal>,

    /// Stop loss price
    #[arg(long)]
    stoploss: Option<Decimal>,

    /// Resolve and size only; print the legs without placing anything
    #[arg(long)]
    dry_run: bool,
}

fn load_signal(args: &Args) -> Result<Signal> {
    if let Some(path) = &args.signal {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read signal file {}", path.display()))?;
        return serde_json::from_str(&content).context("Failed to parse signal file");
    }

    let ticker = args.ticker.clone().context("--ticker or --signal is required")?;
    let direction = args.direction.context("--direction is required")?;
    let prices = |values: &[Decimal]| -> Vec<Price> {
        values.iter().copied().map(Price::new).collect()
    };
    Ok(Signal::new(
        ticker,
        direction,
        prices(&args.entry),
        prices(&args.target),
        args.stoploss.map(Price::new),
    ))
}

fn config_path(args: &Args) -> Option<PathBuf> {
    if let Some(path) = args
        .config
        .clone()
        .or_else(|| std::env::var("SIGX_CONFIG").ok().map(PathBuf::from))
    {
        return Some(path);
    }
    let default = Path::new(DEFAULT_CONFIG_PATH);
    if default.exists() {
        Some(default.to_path_buf())
    } else {
        warn!(path = DEFAULT_CONFIG_PATH, "Config file not found, using defaults");
        None
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize TLS crypto provider (must be before any WS connections)
    sigx_ws::init_crypto();

    let args = Args::parse();

    sigx_telemetry::init_logging()?;

    info!("Starting sigx v{}", env!("CARGO_PKG_VERSION"));

    let path = config_path(&args);
    info!(config_path = ?path, "Loading configuration");
    let config = AppConfig::load(path.as_deref())?;
    info!(
        rest_url = %config.rest_url,
        ws_url = %config.ws_url,
        leverage = config.order.leverage,
        usd_amount = %config.order.usd_amount,
        leg_mode = ?config.order.leg_mode,
        "Configuration loaded"
    );

    let signal = load_signal(&args)?;

    if args.dry_run {
        let plan = ExecutionPlanner::new(&config)?.plan(&signal).await?;
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(ExitCode::SUCCESS);
    }

    let credentials = ApiCredentials::from_env(&config.credentials.source())?;
    let orchestrator = ExecutionOrchestrator::new(config, credentials)?;
    let report = orchestrator.execute(&signal).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.outcome.is_confirmed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(2))
    }
}
