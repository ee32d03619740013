//! EmaLab CLI: run, batch, latest, and synthetic-data commands.
//!
//! Commands:
//! - `run`: compute signals from a TOML config file or from ad hoc flags
//! - `batch`: run several config files in parallel
//! - `latest`: show the stored latest signal and history for a symbol
//! - `synthetic`: write a seeded synthetic index series as CSV

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use emalab_core::repository::SignalRepository;
use emalab_core::rng::{synthetic_series, RngHierarchy, SyntheticSpec};
use emalab_runner::{
    open_repository, render_summary, save_report, signal_history, trade_history,
    RepositoryConfig, RunConfig, RunReport, SignalRunner, SourceConfig, StrategyConfig,
};

#[derive(Parser)]
#[command(
    name = "emalab",
    about = "EmaLab CLI: EMA crossover signals with a minimum holding period"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute signals from a TOML config file or from ad hoc flags.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// CSV price file with `date,index_value` columns (ad hoc mode).
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Symbol name (ad hoc mode).
        #[arg(long, default_value = "NEPSE")]
        symbol: String,

        /// EMA period (ad hoc mode).
        #[arg(long, allow_hyphen_values = true)]
        ema_period: Option<i64>,

        /// Minimum holding period in trading-day steps (ad hoc mode).
        #[arg(long, allow_hyphen_values = true)]
        min_holding_days: Option<i64>,

        /// Store signals as JSON snapshots in this directory (ad hoc mode).
        #[arg(long)]
        json_dir: Option<PathBuf>,

        /// Store signals in this SQLite database (ad hoc mode).
        #[arg(long)]
        sqlite: Option<PathBuf>,

        /// Write report JSON and CSV files to this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the full report as JSON instead of the text summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run several config files in parallel.
    Batch {
        /// TOML config files.
        #[arg(required = true)]
        configs: Vec<PathBuf>,

        /// Write report files for each successful run to this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Show the stored latest signal and history for a symbol.
    Latest {
        #[arg(long, default_value = "NEPSE")]
        symbol: String,

        /// JSON snapshot directory.
        #[arg(long)]
        json_dir: Option<PathBuf>,

        /// SQLite database.
        #[arg(long)]
        sqlite: Option<PathBuf>,

        /// Number of history entries to show.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Write a seeded synthetic index series as CSV.
    Synthetic {
        #[arg(long, default_value = "SYN")]
        symbol: String,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Number of trading days.
        #[arg(long, default_value_t = 250)]
        days: usize,

        /// First calendar day (YYYY-MM-DD).
        #[arg(long, default_value = "2024-01-01")]
        start: String,

        #[arg(long, default_value_t = 2000.0)]
        start_value: f64,

        /// Largest daily move as a fraction (0.02 = 2%).
        #[arg(long, default_value_t = 0.02)]
        max_daily_move: f64,

        /// Output CSV path.
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            csv,
            symbol,
            ema_period,
            min_holding_days,
            json_dir,
            sqlite,
            output_dir,
            json,
        } => {
            let run_config = match (config, csv) {
                (Some(_), Some(_)) => bail!("--config and --csv are mutually exclusive"),
                (None, None) => bail!("one of --config or --csv is required"),
                (Some(path), None) => RunConfig::from_file(&path)?,
                (None, Some(csv)) => {
                    let (Some(ema_period), Some(min_holding_days)) = (ema_period, min_holding_days)
                    else {
                        bail!("--ema-period and --min-holding-days are required with --csv");
                    };
                    let config = RunConfig {
                        symbol,
                        strategy: StrategyConfig {
                            ema_period,
                            min_holding_days,
                        },
                        source: SourceConfig::Csv { path: csv },
                        repository: repository_config(json_dir, sqlite)?,
                    };
                    config.validate()?;
                    config
                }
            };
            run_cmd(&run_config, output_dir.as_deref(), json)
        }
        Commands::Batch {
            configs,
            output_dir,
        } => run_batch_cmd(&configs, output_dir.as_deref()),
        Commands::Latest {
            symbol,
            json_dir,
            sqlite,
            limit,
        } => run_latest_cmd(&symbol, repository_config(json_dir, sqlite)?, limit),
        Commands::Synthetic {
            symbol,
            seed,
            days,
            start,
            start_value,
            max_daily_move,
            out,
        } => {
            let start_date = NaiveDate::parse_from_str(&start, "%Y-%m-%d")
                .with_context(|| format!("invalid --start date '{start}'"))?;
            let spec = SyntheticSpec {
                start_date,
                days,
                start_value,
                max_daily_move,
            };
            run_synthetic_cmd(&symbol, seed, &spec, &out)
        }
    }
}

fn repository_config(
    json_dir: Option<PathBuf>,
    sqlite: Option<PathBuf>,
) -> Result<RepositoryConfig> {
    Ok(match (json_dir, sqlite) {
        (Some(_), Some(_)) => bail!("--json-dir and --sqlite are mutually exclusive"),
        (Some(dir), None) => RepositoryConfig::Json { dir },
        (None, Some(path)) => RepositoryConfig::Sqlite { path },
        (None, None) => RepositoryConfig::Memory,
    })
}

fn run_cmd(config: &RunConfig, output_dir: Option<&Path>, json: bool) -> Result<()> {
    let report = SignalRunner::new().run_config(config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_summary(&report));
    }

    if let Some(dir) = output_dir {
        let path = save_report(&report, dir)?;
        println!("Report saved to: {}", path.display());
    }
    Ok(())
}

fn run_batch_cmd(paths: &[PathBuf], output_dir: Option<&Path>) -> Result<()> {
    let configs = paths
        .iter()
        .map(|p| RunConfig::from_file(p).with_context(|| format!("loading {}", p.display())))
        .collect::<Result<Vec<_>>>()?;

    let outcomes = SignalRunner::new().run_config_batch(&configs);

    let mut failures = 0;
    println!(
        "{:<12} {:>8} {:>8} {:>10} {:>12}",
        "Symbol", "Signals", "Trades", "Win rate", "Total ret"
    );
    println!("{}", "-".repeat(54));
    for outcome in &outcomes {
        match &outcome.result {
            Ok(report) => {
                print_batch_row(report);
                if let Some(dir) = output_dir {
                    save_report(report, dir)?;
                }
            }
            Err(e) => {
                failures += 1;
                error!(symbol = %outcome.symbol, error = %e, "run failed");
                println!("{:<12} failed: {e}", outcome.symbol);
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} runs failed", outcomes.len());
    }
    Ok(())
}

fn print_batch_row(report: &RunReport) {
    let s = &report.summary;
    println!(
        "{:<12} {:>8} {:>8} {:>9.1}% {:>11.2}%",
        report.symbol, s.total_signals, s.total_trades, s.win_rate, s.total_return
    );
}

fn run_latest_cmd(symbol: &str, repository: RepositoryConfig, limit: usize) -> Result<()> {
    if repository == RepositoryConfig::Memory {
        bail!("one of --json-dir or --sqlite is required");
    }
    let repo: Box<dyn SignalRepository> = open_repository(&repository, symbol)?;

    match repo.get_latest_signal()? {
        Some(row) => println!(
            "Latest actionable: {} on {} at {:.2} (EMA {:.2}) [{}]",
            row.signal_type,
            row.date,
            row.price,
            row.ema,
            row.status.as_str()
        ),
        None => println!("No actionable signal stored for {symbol}"),
    }
    if let Some(fp) = repo.load_fingerprint()? {
        println!(
            "Stored run:        {} (EMA {}, hold {}, {} points)",
            fp.run_id(),
            fp.params.ema_period(),
            fp.params.min_holding_days(),
            fp.points
        );
    }

    let signals = repo.load_signals()?;
    if !signals.is_empty() {
        println!();
        println!("{:<12} {:<5} {:>10} {:>10}  Status", "Date", "Type", "Price", "EMA");
        for entry in signal_history(&signals).iter().take(limit) {
            println!(
                "{:<12} {:<5} {:>10.2} {:>10.2}  {}",
                entry.date,
                entry.signal_type,
                entry.price,
                entry.ema,
                entry.status.as_str()
            );
        }
    }

    let trades = repo.load_trades()?;
    if !trades.is_empty() {
        println!();
        println!(
            "{:<12} {:>10} {:<12} {:>10} {:>5} {:>9}  Result",
            "Entry", "Price", "Exit", "Price", "Days", "Return"
        );
        for t in trade_history(&trades).iter().take(limit) {
            println!(
                "{:<12} {:>10.2} {:<12} {:>10.2} {:>5} {:>8.2}%  {}",
                t.entry_date,
                t.entry_price,
                t.exit_date,
                t.exit_price,
                t.days_held,
                t.return_pct,
                t.result
            );
        }
    }
    Ok(())
}

fn run_synthetic_cmd(symbol: &str, seed: u64, spec: &SyntheticSpec, out: &Path) -> Result<()> {
    if spec.days == 0 {
        bail!("--days must be > 0");
    }
    let points = synthetic_series(&RngHierarchy::new(seed), symbol, spec);

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(out)
        .with_context(|| format!("failed to create {}", out.display()))?;
    wtr.write_record(["date", "index_value"])?;
    for p in &points {
        wtr.write_record([p.date.to_string(), format!("{:.2}", p.price)])?;
    }
    wtr.flush()?;

    info!(symbol, seed, points = points.len(), path = %out.display(), "synthetic series written");
    println!("Wrote {} points to {}", points.len(), out.display());
    Ok(())
}
