//! SetupScan CLI: scan, detect, watch, session and history commands.
//!
//! Commands:
//! - `scan`: one pass over the configured symbols, detections as JSON lines
//! - `detect`: raw admitted detections per symbol, no signals or history
//! - `watch`: repeat the pass on an interval
//! - `session`: current trading-session status
//! - `history`: recent signals from the JSONL history file
//!
//! Events and signals go to stdout; logs go to stderr.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use setupscan_core::domain::{
    is_high_volatility_period, next_session_change, session_status, Timeframe,
};
use setupscan_core::scanner::MarketScanner;
use setupscan_core::sink::{MemorySignalSink, SignalSink};
use setupscan_core::store::{CandleStore, MemoryCandleStore};
use setupscan_runner::{
    load_csv, seed_synthetic, JsonLineBroadcaster, ScanConfig, ScanPass, ScanReport,
    SignalHistory,
};

/// Candles generated per series with `--synthetic`.
const SYNTHETIC_CANDLES: usize = 200;

#[derive(Parser)]
#[command(
    name = "setupscan",
    about = "SetupScan: multi-timeframe candle pattern scanner"
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. info, debug, setupscan_core=trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Path to a TOML scan config. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// CSV candle file (symbol,timeframe,timestamp,open,high,low,close,volume).
    #[arg(long, conflicts_with = "synthetic")]
    data: Option<PathBuf>,

    /// Generate deterministic synthetic candles instead of reading a file.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Symbols to scan, overriding the config (repeatable).
    #[arg(long = "symbol")]
    symbols: Vec<String>,

    /// Signal probability floor, overriding the config.
    #[arg(long)]
    floor: Option<u8>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scan pass.
    Scan {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print admitted detections as JSON lines without generating signals.
    Detect {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Run scan passes on an interval.
    Watch {
        #[command(flatten)]
        source: SourceArgs,

        /// Seconds between passes, overriding the config.
        #[arg(long)]
        interval: Option<u64>,

        /// Stop after this many passes. Runs until interrupted when omitted.
        #[arg(long)]
        iterations: Option<usize>,
    },
    /// Print the current trading-session status.
    Session,
    /// Print recent signals from the history file.
    History {
        /// History file. Defaults to the config's history_path.
        #[arg(long)]
        path: Option<PathBuf>,

        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of signals to show, newest first.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Scan { source } => run_scan(source, None, Some(1)),
        Commands::Detect { source } => run_detect(source),
        Commands::Watch {
            source,
            interval,
            iterations,
        } => run_scan(source, interval, iterations),
        Commands::Session => run_session(),
        Commands::History {
            path,
            config,
            limit,
        } => run_history(path, config, limit),
    }
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ScanConfig> {
    match path {
        Some(path) => ScanConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(ScanConfig::default()),
    }
}

/// Config file plus command-line overrides, validated.
fn resolve_config(source: &SourceArgs, interval: Option<u64>) -> Result<ScanConfig> {
    let mut config = load_config(source.config.as_deref())?;
    if !source.symbols.is_empty() {
        config.symbols = source.symbols.clone();
    }
    if let Some(floor) = source.floor {
        config.signal_floor = floor;
    }
    if let Some(secs) = interval {
        config.interval_secs = secs;
    }
    config.validate()?;
    Ok(config)
}

fn build_store(source: &SourceArgs, config: &ScanConfig) -> Result<MemoryCandleStore> {
    let store = MemoryCandleStore::new();
    match (&source.data, source.synthetic) {
        (Some(path), _) => {
            load_csv(path, &store).with_context(|| format!("loading candles from {}", path.display()))?;
        }
        (None, true) => {
            let inserted = seed_synthetic(
                &store,
                &config.symbols,
                &config.timeframes,
                SYNTHETIC_CANDLES,
                Utc::now(),
            )?;
            info!(candles = inserted, "using synthetic candles");
        }
        (None, false) => bail!("one of --data or --synthetic is required"),
    }
    Ok(store)
}

fn run_detect(source: SourceArgs) -> Result<()> {
    let config = resolve_config(&source, None)?;
    let store = build_store(&source, &config)?;
    let scanner = MarketScanner::with_config(&store, config.scanner.clone());

    let stdout = io::stdout();
    let count = write_detections(&scanner, &config.symbols, &config.timeframes, stdout.lock())?;
    info!(detections = count, "detect finished");
    Ok(())
}

/// One JSON line per admitted detection, symbols in order. Returns the count.
fn write_detections<S, W>(
    scanner: &MarketScanner<S>,
    symbols: &[String],
    timeframes: &[Timeframe],
    mut out: W,
) -> Result<usize>
where
    S: CandleStore,
    W: Write,
{
    let mut count = 0;
    for symbol in symbols {
        for detection in scanner.analyze_market(symbol, timeframes) {
            serde_json::to_writer(&mut out, &detection)?;
            writeln!(out)?;
            count += 1;
        }
    }
    out.flush()?;
    Ok(count)
}

fn run_scan(source: SourceArgs, interval: Option<u64>, iterations: Option<usize>) -> Result<()> {
    let config = resolve_config(&source, interval)?;
    let store = build_store(&source, &config)?;

    let sink: Arc<dyn SignalSink> = match &config.history_path {
        Some(path) => Arc::new(SignalHistory::new(path.clone())),
        None => Arc::new(MemorySignalSink::new()),
    };

    let pass = ScanPass::new(
        MarketScanner::with_config(&store, config.scanner.clone()),
        sink,
        JsonLineBroadcaster::new(io::stdout()),
    )
    .with_timeframes(config.timeframes.clone())
    .with_signal_floor(config.signal_floor);

    pass.watch(&config.symbols, config.interval(), iterations, print_summary);
    Ok(())
}

fn print_summary(report: &ScanReport) {
    for symbol in &report.symbols {
        eprintln!(
            "{:<10} detections: {:>2}  signals: {:>2}",
            symbol.symbol,
            symbol.detections,
            symbol.signals.len()
        );
    }
    eprintln!(
        "Session {} | {} signal(s) at {}",
        report.session,
        report.total_signals(),
        report.scanned_at.to_rfc3339()
    );
}

/// Session status, volatility flag and next session open at `now`.
fn session_report(now: DateTime<Utc>) -> serde_json::Value {
    let next = next_session_change(now);
    json!({
        "status": session_status(now),
        "isHighVolatilityPeriod": is_high_volatility_period(now),
        "nextChange": {
            "session": next.session,
            "minutesUntil": next.time_until.num_minutes(),
        },
    })
}

fn run_session() -> Result<()> {
    let now = Utc::now();
    println!("{}", serde_json::to_string_pretty(&session_report(now))?);

    let next = next_session_change(now);
    let minutes = next.time_until.num_minutes();
    let volatility = if is_high_volatility_period(now) {
        "high volatility"
    } else {
        "normal volatility"
    };
    println!(
        "Next: {} opens in {}h {:02}m ({volatility})",
        next.session,
        minutes / 60,
        minutes % 60
    );
    Ok(())
}

fn run_history(path: Option<PathBuf>, config: Option<PathBuf>, limit: usize) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => match load_config(config.as_deref())?.history_path {
            Some(path) => path,
            None => bail!("no history file: pass --path or set history_path in the config"),
        },
    };

    let history = SignalHistory::new(path);
    for signal in history.recent(limit)? {
        println!("{}", serde_json::to_string(&signal)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::CommandFactory;
    use setupscan_core::domain::Candle;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_watch_flags() {
        let cli = Cli::try_parse_from([
            "setupscan",
            "watch",
            "--synthetic",
            "--symbol",
            "XAU/USD",
            "--symbol",
            "EURUSD",
            "--iterations",
            "3",
            "--interval",
            "5",
        ])
        .unwrap();
        match cli.command {
            Commands::Watch {
                source,
                interval,
                iterations,
            } => {
                assert!(source.synthetic);
                assert_eq!(source.symbols, vec!["XAU/USD", "EURUSD"]);
                assert_eq!(interval, Some(5));
                assert_eq!(iterations, Some(3));
            }
            _ => panic!("expected watch"),
        }
    }

    #[test]
    fn parses_detect_flags() {
        let cli = Cli::try_parse_from(["setupscan", "detect", "--data", "candles.csv", "--symbol", "XAU/USD"])
            .unwrap();
        match cli.command {
            Commands::Detect { source } => {
                assert_eq!(source.data, Some(PathBuf::from("candles.csv")));
                assert!(!source.synthetic);
                assert_eq!(source.symbols, vec!["XAU/USD"]);
            }
            _ => panic!("expected detect"),
        }
    }

    /// An order block window: fires only the order block detector.
    fn order_block_store(symbol: &str) -> MemoryCandleStore {
        let mut data = vec![(100.0, 100.0, 100.0, 100.0); 8];
        data.push((100.0, 110.0, 99.0, 109.0));
        data.push((109.0, 112.0, 105.0, 111.0));
        data.extend(vec![(111.0, 111.0, 111.0, 111.0); 5]);

        let start = Utc.with_ymd_and_hms(2024, 4, 1, 6, 0, 0).unwrap();
        let store = MemoryCandleStore::new();
        store
            .extend(data.iter().enumerate().map(|(i, &(open, high, low, close))| Candle {
                symbol: symbol.to_string(),
                timeframe: Timeframe::M15,
                open,
                high,
                low,
                close,
                volume: None,
                timestamp: start + Timeframe::M15.duration() * i as i32,
            }))
            .unwrap();
        store
    }

    #[test]
    fn detect_writes_one_json_line_per_detection() {
        let store = order_block_store("XAU/USD");
        let scanner = MarketScanner::new(&store);
        let symbols = vec!["XAU/USD".to_string(), "EURUSD".to_string()];

        let mut out = Vec::new();
        let count =
            write_detections(&scanner, &symbols, &Timeframe::DEFAULT_SCAN, &mut out).unwrap();
        assert_eq!(count, 1);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["strategy"], "ORDER_BLOCK");
        assert_eq!(value["probability"], 72);
        assert_eq!(value["symbol"], "XAU/USD");
        assert_eq!(value["timeframe"], "M15");
    }

    #[test]
    fn session_report_flags_london_open() {
        let at = Utc.with_ymd_and_hms(2024, 6, 3, 8, 30, 0).unwrap();
        let report = session_report(at);
        assert_eq!(report["isHighVolatilityPeriod"], true);
        assert_eq!(report["status"]["current"], "LONDON");

        let next = next_session_change(at);
        assert_eq!(report["nextChange"]["minutesUntil"], next.time_until.num_minutes());

        let quiet = Utc.with_ymd_and_hms(2024, 6, 3, 11, 0, 0).unwrap();
        assert_eq!(session_report(quiet)["isHighVolatilityPeriod"], false);
    }

    #[test]
    fn data_and_synthetic_conflict() {
        let parsed = Cli::try_parse_from(["setupscan", "scan", "--data", "x.csv", "--synthetic"]);
        assert!(parsed.is_err());
    }
}
