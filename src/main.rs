//! CLI entry point for the noise monitor.
//!
//! Loads the station and measurement files once, then answers one query,
//! prints the dataset catalog or runs an interactive session that recomputes
//! a report for every filter line read from stdin.

use anyhow::{Context, Result, ensure};
use clap::{Args, Parser, Subcommand};
use noise_monitor::analyzers::{Filter, query, summarize_window};
use noise_monitor::config::AppConfig;
use noise_monitor::dataset::Dataset;
use noise_monitor::error::QueryError;
use noise_monitor::loader::load_dataset;
use noise_monitor::model::{Period, ZoneType};
use noise_monitor::output::{print_pretty, print_window, to_json, write_violations_csv};
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "noise_monitor")]
#[command(about = "Noise level summaries, period comparisons and limit violations", long_about = None)]
struct Cli {
    /// JSON config file with data and log paths
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Station metadata CSV (overrides config and NOISE_STATIONS_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    stations: Option<PathBuf>,

    /// Monthly measurements CSV (overrides config and NOISE_MEASUREMENTS_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    measurements: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize one city and month, compare against earlier months and list violations
    Query(QueryArgs),
    /// Aggregate a range of months for a city
    Window(WindowArgs),
    /// List cities, zone types and the period span of the dataset
    Catalog,
    /// Read query/window commands from stdin until EOF or `quit`
    Session,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// City name (case-insensitive; several words are joined with spaces)
    #[arg(long, num_args = 1.., required = true)]
    city: Vec<String>,

    /// Month to report on
    #[arg(long, value_name = "YYYY-MM")]
    period: Period,

    /// Zone type to include (repeatable; default: all)
    #[arg(long = "zone", value_name = "ZONE")]
    zones: Vec<ZoneType>,

    /// Earlier month to compare against (repeatable; default: the previous month)
    #[arg(long = "compare", value_name = "YYYY-MM")]
    compare: Vec<Period>,

    /// Print the report as JSON on stdout
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Write the violation list to this CSV file
    #[arg(long, value_name = "PATH")]
    violations_csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct WindowArgs {
    /// City name (case-insensitive; several words are joined with spaces)
    #[arg(long, num_args = 1.., required = true)]
    city: Vec<String>,

    /// First month of the window
    #[arg(long, value_name = "YYYY-MM")]
    from: Period,

    /// Last month of the window (inclusive)
    #[arg(long, value_name = "YYYY-MM")]
    to: Period,

    /// Zone type to include (repeatable; default: all)
    #[arg(long = "zone", value_name = "ZONE")]
    zones: Vec<ZoneType>,

    /// Print the summary as JSON on stdout
    #[arg(long, default_value_t = false)]
    json: bool,
}

/// One line of an interactive session.
#[derive(Parser)]
#[command(name = "noise_monitor", no_binary_name = true)]
struct SessionLine {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Summarize one city and month
    Query(QueryArgs),
    /// Aggregate a range of months
    Window(WindowArgs),
    /// List cities, zone types and periods
    Catalog,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?.with_env(),
        None => AppConfig::from_env(),
    };
    if let Some(path) = cli.stations {
        config.stations_path = path;
    }
    if let Some(path) = cli.measurements {
        config.measurements_path = path;
    }

    let _log_guard = init_tracing(&config.log_file_path)?;

    let dataset = load_dataset(&config.stations_path, &config.measurements_path)
        .context("cannot start without the noise dataset")?;

    match cli.command {
        Commands::Query(args) => run_query(&dataset, args)?,
        Commands::Window(args) => run_window(&dataset, args)?,
        Commands::Catalog => print_catalog(&dataset),
        Commands::Session => run_session(&dataset)?,
    }

    Ok(())
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_tracing(log_file_path: &Path) -> Result<WorkerGuard> {
    let log_dir = log_file_path.parent().unwrap_or(Path::new("logs"));
    let log_file_name = log_file_path
        .file_name()
        .unwrap_or(OsStr::new("noise_monitor.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}

/// Joins the words of a multi-word city and trims the result.
fn city_name(words: &[String]) -> String {
    words.join(" ").trim().to_string()
}

fn zone_set(zones: Vec<ZoneType>) -> BTreeSet<ZoneType> {
    if zones.is_empty() {
        ZoneType::ALL.into_iter().collect()
    } else {
        zones.into_iter().collect()
    }
}

/// Runs one query. A period without data is reported, not treated as a failure.
fn run_query(dataset: &Dataset, args: QueryArgs) -> Result<()> {
    let compare = if args.compare.is_empty() {
        args.period.previous().into_iter().collect()
    } else {
        args.compare
    };
    let filter = Filter::new(city_name(&args.city), args.period)
        .with_zones(zone_set(args.zones))
        .with_comparisons(compare);

    let report = match query(dataset, &filter) {
        Ok(report) => report,
        Err(e @ QueryError::NoData { .. }) => {
            warn!(error = %e, "Nothing to report");
            return Ok(());
        }
    };

    if args.json {
        println!("{}", to_json(&report)?);
    } else {
        print_pretty(&report);
    }

    if let Some(path) = args.violations_csv {
        write_violations_csv(&path, &report.violations)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), rows = report.violations.len(), "Violations exported");
    }

    Ok(())
}

fn run_window(dataset: &Dataset, args: WindowArgs) -> Result<()> {
    ensure!(
        args.from <= args.to,
        "--from ({}) must not be after --to ({})",
        args.from,
        args.to
    );

    let zones = zone_set(args.zones);
    let window = summarize_window(
        dataset,
        &city_name(&args.city),
        &zones,
        &Period::range(args.from, args.to),
    );

    if args.json {
        println!("{}", to_json(&window)?);
    } else {
        print_window(&window);
    }
    Ok(())
}

fn print_catalog(dataset: &Dataset) {
    let periods = dataset.periods();
    let zones: Vec<&str> = dataset.zone_types().iter().map(|z| z.as_str()).collect();
    let summary = dataset.summary();

    info!(cities = ?dataset.cities(), "Cities");
    info!(zones = ?zones, "Zone types");
    if let (Some(first), Some(last)) = (periods.first(), periods.last()) {
        info!(first = %first, last = %last, months = periods.len(), "Periods");
    }
    info!(
        stations = dataset.stations().count(),
        records = dataset.records().len(),
        excluded_rows = summary.dropped(),
        "Load summary"
    );
}

/// Re-evaluates a report for every command line read from stdin.
#[tracing::instrument(skip_all)]
fn run_session(dataset: &Dataset) -> Result<()> {
    info!("Session started. Type `help` for commands, `quit` to leave.");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut lines = stdin.lock().lines();

    loop {
        write!(stdout, "noise> ")?;
        stdout.flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let line = line.trim();

        match line {
            "" => continue,
            "quit" | "exit" => break,
            _ => {}
        }

        let parsed = match SessionLine::try_parse_from(line.split_whitespace()) {
            Ok(parsed) => parsed,
            Err(e) => {
                // also covers `help` and `--help`
                if let Err(write_err) = e.print() {
                    debug!(error = %write_err, "Failed to print command usage");
                }
                continue;
            }
        };

        let result = match parsed.command {
            SessionCommand::Query(args) => run_query(dataset, args),
            SessionCommand::Window(args) => run_window(dataset, args),
            SessionCommand::Catalog => {
                print_catalog(dataset);
                Ok(())
            }
        };
        if let Err(e) = result {
            error!(error = %format!("{e:#}"), "Command failed");
        }
    }

    info!("Session ended");
    Ok(())
}
