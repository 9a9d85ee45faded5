//! Tactica CLI: evaluate and replay allocation cycles over a CSV price history.
//!
//! Commands:
//! - `presets`: list the built-in strategies with their config fingerprints
//! - `show-config`: print a preset as TOML, ready to edit and pass to `--config`
//! - `evaluate`: run one cycle using history up to a date
//! - `replay`: run a cycle on the first trading day of every month

mod history;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tactica_core::{CycleReport, PeriodId, RebalanceController, StrategyConfig, StrategyPreset};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::history::PriceHistory;

#[derive(Parser)]
#[command(
    name = "tactica",
    about = "Tactica CLI: periodic target weights for tactical allocation strategies"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in strategy presets.
    Presets,
    /// Print a preset's configuration as TOML.
    ShowConfig {
        /// Preset name (see `tactica presets`).
        #[arg(long)]
        preset: String,
    },
    /// Run one allocation cycle on history up to a date.
    Evaluate {
        #[command(flatten)]
        strategy: StrategyArgs,

        /// Price CSV with header `date,symbol,close`.
        #[arg(long)]
        prices: PathBuf,

        /// Evaluation date (YYYY-MM-DD). Defaults to the last date in the file.
        #[arg(long)]
        as_of: Option<String>,

        /// Print the cycle report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Replay monthly cycles over the price history.
    Replay {
        #[command(flatten)]
        strategy: StrategyArgs,

        /// Price CSV with header `date,symbol,close`.
        #[arg(long)]
        prices: PathBuf,

        /// First date considered (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// Last date considered (YYYY-MM-DD).
        #[arg(long)]
        end: Option<String>,

        /// Print one JSON object per rebalance.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Args)]
struct StrategyArgs {
    /// Named preset: sixty_forty, composite_dual_momentum, global_equity_fixed_income, channel_slices.
    #[arg(long)]
    preset: Option<String>,

    /// Path to a TOML strategy config.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl StrategyArgs {
    fn load(&self) -> Result<StrategyConfig> {
        match (&self.preset, &self.config) {
            (Some(_), Some(_)) => bail!("--config and --preset are mutually exclusive"),
            (None, None) => bail!("one of --config or --preset is required"),
            (Some(name), None) => Ok(name.parse::<StrategyPreset>()?.to_config()),
            (None, Some(path)) => Ok(StrategyConfig::from_file(path)?),
        }
    }
}

/// One rebalance line of `replay --json`.
#[derive(Serialize)]
struct DatedReport<'a> {
    date: NaiveDate,
    #[serde(flatten)]
    report: &'a CycleReport,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Presets => run_presets(),
        Commands::ShowConfig { preset } => run_show_config(&preset),
        Commands::Evaluate {
            strategy,
            prices,
            as_of,
            json,
        } => run_evaluate(&strategy, prices, as_of.as_deref(), json),
        Commands::Replay {
            strategy,
            prices,
            start,
            end,
            json,
        } => run_replay(&strategy, prices, start.as_deref(), end.as_deref(), json),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{value}', expected YYYY-MM-DD"))
}

fn load_history(path: &Path) -> Result<PriceHistory> {
    let history = PriceHistory::from_path(path)?;
    let symbols: Vec<&str> = history.symbols().map(|a| a.symbol()).collect();
    debug!(path = %path.display(), ?symbols, last = ?history.last_date(), "prices loaded");
    Ok(history)
}

fn run_presets() -> Result<()> {
    for preset in StrategyPreset::all() {
        let config = preset.to_config();
        println!(
            "{:<28} {:<26} {}",
            preset.name(),
            config.policy.kind(),
            config.fingerprint()?.short()
        );
    }
    Ok(())
}

fn run_show_config(name: &str) -> Result<()> {
    let preset: StrategyPreset = name.parse()?;
    print!("{}", preset.to_config().to_toml()?);
    Ok(())
}

fn run_evaluate(
    strategy: &StrategyArgs,
    prices: PathBuf,
    as_of: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut controller = RebalanceController::new(strategy.load()?)?;
    let history = load_history(&prices)?;

    let date = match as_of {
        Some(value) => parse_date(value)?,
        None => match history.last_date() {
            Some(date) => date,
            None => bail!("price file {} has no rows", prices.display()),
        },
    };

    let report = controller.run_cycle(&history.as_of(date), PeriodId::year_of(date))?;
    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        print_report(date, &report);
    }
    Ok(())
}

fn run_replay(
    strategy: &StrategyArgs,
    prices: PathBuf,
    start: Option<&str>,
    end: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut controller = RebalanceController::new(strategy.load()?)?;
    let history = load_history(&prices)?;
    let start = start.map(parse_date).transpose()?;
    let end = end.map(parse_date).transpose()?;

    let schedule = history.month_starts(start, end);
    if schedule.is_empty() {
        bail!("no trading days in the requested range");
    }

    let mut rebalances = 0usize;
    let mut failures = 0usize;
    for date in &schedule {
        let source = history.as_of(*date);
        let report = match controller.run_cycle(&source, PeriodId::year_of(*date)) {
            Ok(report) => report,
            Err(err) => {
                warn!(%date, "skipping cycle: {err}");
                failures += 1;
                continue;
            }
        };
        if !report.rebalanced {
            continue;
        }
        rebalances += 1;
        if json {
            let line = DatedReport {
                date: *date,
                report: &report,
            };
            println!("{}", serde_json::to_string(&line)?);
        } else {
            print_report(*date, &report);
        }
    }

    info!(
        strategy = %controller.config().name,
        cycles = schedule.len(),
        rebalances,
        failures,
        "replay finished"
    );
    Ok(())
}

fn print_report(date: NaiveDate, report: &CycleReport) {
    let targets = report.allocation.summary();
    let targets = if targets.is_empty() { "(cash)" } else { targets.as_str() };
    if report.signals.is_empty() {
        println!("{date}  held={}  {targets}", report.held);
    } else {
        println!(
            "{date}  held={}  risk_on={}/{}  {targets}",
            report.held,
            report.risk_on,
            report.signals.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn strategy_from_preset_or_file() {
        let by_name = StrategyArgs {
            preset: Some("sixty_forty".into()),
            config: None,
        };
        let preset = by_name.load().unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(preset.to_toml().unwrap().as_bytes()).unwrap();
        let by_file = StrategyArgs {
            preset: None,
            config: Some(file.path().to_path_buf()),
        };
        assert_eq!(by_file.load().unwrap(), preset);
    }

    #[test]
    fn strategy_args_are_exclusive() {
        let both = StrategyArgs {
            preset: Some("sixty_forty".into()),
            config: Some(PathBuf::from("x.toml")),
        };
        assert!(both.load().is_err());
        let neither = StrategyArgs {
            preset: None,
            config: None,
        };
        assert!(neither.load().is_err());
        let unknown = StrategyArgs {
            preset: Some("nope".into()),
            config: None,
        };
        assert!(unknown.load().is_err());
    }

    #[test]
    fn cli_parses_replay() {
        let cli = Cli::try_parse_from([
            "tactica", "replay", "--preset", "channel_slices", "--prices", "p.csv", "--start",
            "2020-01-01", "--json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Replay { json: true, .. }));
    }

    #[test]
    fn dates_must_be_iso() {
        assert!(parse_date("2021-02-01").is_ok());
        assert!(parse_date("02/01/2021").is_err());
    }

    #[test]
    fn load_history_reads_csv_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"date,symbol,close\n2021-01-05,SPY,2.0\n2021-01-04,SPY,1.0\n")
            .unwrap();
        let history = load_history(file.path()).unwrap();
        assert_eq!(history.symbols().count(), 1);
        assert_eq!(history.last_date(), NaiveDate::from_ymd_opt(2021, 1, 5));
    }
}
