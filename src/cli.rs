//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::{read_positions, CsvDataSource};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::{run_backtest_until, BacktestReport};
use crate::domain::config::{Preset, ScreenerConfig};
use crate::domain::config_validation::load_screener_config;
use crate::domain::error::ScreenerError;
use crate::domain::exit::{review_positions, HoldingsReview};
use crate::domain::pipeline::{scan, ScanOutcome};
use crate::ports::data_port::Providers;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "stockhunter", about = "Equity screener and backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Screen the market on one day
    Scan {
        /// Directory holding index.csv, prices/, flow/ and fundamentals.csv
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        date: NaiveDate,
        #[arg(short, long, conflicts_with = "preset")]
        config: Option<PathBuf>,
        #[arg(short, long)]
        preset: Option<Preset>,
        /// JSON report, or a decision table when the path ends in .csv
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replay the screener over a date range
    Backtest {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(short, long, conflicts_with = "preset")]
        config: Option<PathBuf>,
        #[arg(short, long)]
        preset: Option<Preset>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Stop after this many weekdays
        #[arg(long)]
        max_days: Option<usize>,
    },
    /// Evaluate exit conditions for held positions
    Holdings {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        date: NaiveDate,
        /// CSV with ticker,entry_price,entry_date[,peak_price]
        #[arg(long)]
        positions: PathBuf,
        #[arg(short, long, conflicts_with = "preset")]
        config: Option<PathBuf>,
        #[arg(short, long)]
        preset: Option<Preset>,
    },
    /// Validate a screener configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List built-in presets
    Presets,
    /// Show the data range of a data directory
    Info {
        #[arg(short, long)]
        data: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Scan {
            data,
            date,
            config,
            preset,
            output,
        } => run_scan(&data, date, config.as_deref(), preset, output.as_deref()),
        Command::Backtest {
            data,
            start,
            end,
            config,
            preset,
            output,
            max_days,
        } => run_backtest(
            &data,
            start,
            end,
            config.as_deref(),
            preset,
            output.as_deref(),
            max_days,
        ),
        Command::Holdings {
            data,
            date,
            positions,
            config,
            preset,
        } => run_holdings(&data, date, &positions, config.as_deref(), preset),
        Command::Validate { config } => run_validate(&config),
        Command::Presets => {
            run_presets();
            Ok(())
        }
        Command::Info { data } => run_info(&data),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ScreenerError> {
    FileConfigAdapter::from_file(path).map_err(|e| ScreenerError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Config file when given, else the named preset, else the standard preset.
pub fn resolve_config(
    config_path: Option<&Path>,
    preset: Option<Preset>,
) -> Result<ScreenerConfig, ScreenerError> {
    match (config_path, preset) {
        (Some(path), _) => {
            info!(path = %path.display(), "loading config");
            load_screener_config(&load_config(path)?)
        }
        (None, Some(preset)) => Ok(ScreenerConfig::preset(preset)),
        (None, None) => Ok(ScreenerConfig::default()),
    }
}

fn run_scan(
    data: &Path,
    date: NaiveDate,
    config_path: Option<&Path>,
    preset: Option<Preset>,
    output: Option<&Path>,
) -> Result<(), ScreenerError> {
    let config = resolve_config(config_path, preset)?;
    let source = CsvDataSource::open(data)?;
    let outcome = scan(date, &config, &Providers::from_source(&source))?;

    print_scan(&outcome);
    if let Some(path) = output {
        JsonReportAdapter::new().write_scan(&outcome, path)?;
    }
    Ok(())
}

fn run_backtest(
    data: &Path,
    start: NaiveDate,
    end: NaiveDate,
    config_path: Option<&Path>,
    preset: Option<Preset>,
    output: Option<&Path>,
    max_days: Option<usize>,
) -> Result<(), ScreenerError> {
    let config = resolve_config(config_path, preset)?;
    let source = CsvDataSource::open(data)?;

    let mut attempted = 0usize;
    let report = run_backtest_until(
        start,
        end,
        &config,
        &Providers::from_source(&source),
        |_| {
            attempted += 1;
            max_days.is_some_and(|max| attempted > max)
        },
    )?;

    print_backtest(&report);
    if let Some(path) = output {
        JsonReportAdapter::new().write_backtest(&report, path)?;
    }
    Ok(())
}

fn run_holdings(
    data: &Path,
    date: NaiveDate,
    positions_path: &Path,
    config_path: Option<&Path>,
    preset: Option<Preset>,
) -> Result<(), ScreenerError> {
    let config = resolve_config(config_path, preset)?;
    let source = CsvDataSource::open(data)?;
    let positions = read_positions(positions_path)?;
    let review = review_positions(date, &positions, &config, &Providers::from_source(&source))?;
    print_holdings(&review);
    Ok(())
}

fn run_validate(path: &Path) -> Result<(), ScreenerError> {
    let config = load_screener_config(&load_config(path)?)?;
    println!(
        "Configuration is valid: {} (top {}, {} days of history)",
        config.name,
        config.top_n,
        config.required_history()
    );
    Ok(())
}

fn run_presets() {
    for preset in Preset::ALL {
        let c = ScreenerConfig::preset(preset);
        println!(
            "{:<10} top_n={:<3} liquidity={:?}>={} price={}..{} valuation={:?}",
            preset.name(),
            c.top_n,
            c.liquidity.measure,
            c.liquidity.floor,
            c.liquidity.price_min,
            c.liquidity.price_max,
            c.valuation.mode,
        );
    }
}

fn run_info(data: &Path) -> Result<(), ScreenerError> {
    let source = CsvDataSource::open(data)?;
    let tickers = source.tickers();
    match source.date_range() {
        Some((first, last)) => println!(
            "{}: {} tickers, index {} to {}",
            source.base_path().display(),
            tickers.len(),
            first,
            last
        ),
        None => println!("{}: no index data", source.base_path().display()),
    }
    Ok(())
}

fn print_scan(outcome: &ScanOutcome) {
    let regime = &outcome.regime;
    println!("{} market {}", outcome.date, regime.status);
    for reason in &regime.reasons {
        println!("  {}", reason);
    }
    if regime.status.is_danger() {
        println!("No recommendations: all positions should be closed.");
        return;
    }

    println!(
        "{:<8} {:>5} {:>8} {:>6} {:>10} {:>10} {:>10}",
        "ticker", "score", "tier", "alloc", "close", "stop", "target"
    );
    for d in &outcome.decisions {
        println!(
            "{:<8} {:>5} {:>8} {:>5.0}% {:>10.2} {:>10.2} {:>10}",
            d.ticker,
            d.score,
            d.allocation.tier,
            d.allocation.fraction * 100.0,
            d.close,
            d.risk.stop_loss,
            d.risk
                .take_profit
                .map(|t| format!("{:.2}", t))
                .unwrap_or_else(|| "-".into()),
        );
    }
    println!(
        "{} recommended, {} unranked, {} rejected, {} failed",
        outcome.decisions.len(),
        outcome.unranked,
        outcome.rejections.len(),
        outcome.failures.len()
    );
}

fn print_backtest(report: &BacktestReport) {
    println!(
        "Backtest {} {} to {}{}",
        report.config_name,
        report.start,
        report.end,
        if report.truncated { " (truncated)" } else { "" }
    );
    println!(
        "  days scanned: {}  danger days: {}  gaps: {}  recommendations: {}",
        report.days.len(),
        report.danger_days(),
        report.gaps.len(),
        report.total_recommendations
    );
    for h in &report.horizons {
        println!(
            "  T+{:<3} valid {:>5}  win rate {:>6.2}%  avg return {:>7.2}%",
            h.horizon,
            h.valid_count,
            h.win_rate * 100.0,
            h.avg_return * 100.0
        );
    }
}

fn print_holdings(review: &HoldingsReview) {
    println!("{} market {}", review.date, review.regime.status);
    for r in &review.reviews {
        println!(
            "{:<8} close {:>10.2} pnl {:>7.2}% held {:>3}d  {}",
            r.position.ticker,
            r.quote.close,
            r.action.pnl_ratio * 100.0,
            r.quote.holding_days,
            r.action.kind
        );
    }
    for f in &review.failures {
        println!("{:<8} unavailable: {}", f.ticker, f.reason);
    }
}
