//! gcwatch - offline GC log analyzer.
//!
//! Parses complete GC logs, exports event tables and time-bin histograms,
//! and compares multiple runs on a shared bin grid.

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use gcwatch_core::bins::{self, BinSpec};
use gcwatch_core::config::MonitorConfig;
use gcwatch_core::export::{self, Table};
use gcwatch_core::session::MonitoringSession;

/// Offline GC log analyzer.
#[derive(Parser)]
#[command(name = "gcwatch", about = "Offline GC log analyzer", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Parse one GC log and export event + histogram tables.
    Export {
        /// GC log file.
        log: PathBuf,

        /// Number of equal-width time bins.
        #[arg(long, conflicts_with = "interval")]
        bins: Option<usize>,

        /// Fixed bin interval in seconds (edges at exact multiples).
        #[arg(long)]
        interval: Option<f64>,

        /// Output directory.
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Output file name prefix.
        #[arg(long, default_value = "JvmGC")]
        prefix: String,

        /// Write JSON instead of CSV.
        #[arg(long)]
        json: bool,
    },

    /// Compare several GC logs on one shared time grid.
    Compare {
        /// GC log files (at least two).
        #[arg(num_args = 2..)]
        logs: Vec<PathBuf>,

        /// Fixed bin interval in seconds; runs are only comparable on the
        /// same grid, so this is required.
        #[arg(short, long)]
        interval: f64,

        /// Output directory.
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Output file name prefix.
        #[arg(long, default_value = "JvmGCCompare")]
        prefix: String,

        /// Write JSON instead of CSV.
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("gcwatch={}", level).parse().unwrap())
        .add_directive(format!("gcwatch_core={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Command::Export {
            log,
            bins,
            interval,
            out_dir,
            prefix,
            json,
        } => run_export(&log, bins, interval, &out_dir, &prefix, json),
        Command::Compare {
            logs,
            interval,
            out_dir,
            prefix,
            json,
        } => run_compare(&logs, interval, &out_dir, &prefix, json),
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// Parses a whole log file into a fresh session.
fn parse_log(path: &Path) -> Result<MonitoringSession, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;

    let mut session = MonitoringSession::new(MonitorConfig {
        gc_log: path.to_path_buf(),
        ..MonitorConfig::default()
    });
    let mut failures = 0usize;
    for line in text.lines() {
        if let Err(e) = session.feed_line(line) {
            failures += 1;
            warn!("skipping gc line: {} ({})", line, e);
        }
    }

    info!(
        "{}: {} events ({} minor, {} full), {} unparseable lines",
        path.display(),
        session.store().len(),
        session.store().minor().len(),
        session.store().full().len(),
        failures
    );
    Ok(session)
}

fn run_export(
    log: &Path,
    bin_count: Option<usize>,
    interval: Option<f64>,
    out_dir: &Path,
    prefix: &str,
    json: bool,
) -> Result<(), String> {
    let session = parse_log(log)?;
    let store = session.store();
    if store.is_empty() {
        warn!("no gc events to export");
        return Ok(());
    }

    // Bin spec: explicit count or interval; otherwise a small default count
    // capped by the number of events.
    let spec = match (bin_count, interval) {
        (Some(n), _) => BinSpec::Count(n),
        (None, Some(w)) => BinSpec::Interval(w),
        (None, None) => BinSpec::Count(8.min(store.len())),
    };

    let stamp = Utc::now().format("%Y%m%d%H%M%S").to_string();
    let mut written = Vec::new();

    let views: [(&str, Vec<&gcwatch_core::model::GcEvent>, bool); 3] = [
        ("all", store.all().iter().collect(), true),
        ("minor", store.minor(), false),
        ("full", store.full(), false),
    ];
    for (name, events, include_is_full) in &views {
        let table = export::events_table(events.iter().copied(), *include_is_full);
        written.push(write_table(out_dir, prefix, name, &stamp, &table, json)?);

        let bins = bins::bucket(events.iter().copied(), spec)
            .map_err(|e| format!("binning {}: {}", name, e))?;
        if !bins.is_empty() {
            let table = export::bins_table(&bins);
            let bins_name = format!("{}-bins", name);
            written.push(write_table(out_dir, prefix, &bins_name, &stamp, &table, json)?);
        }
    }

    info!("wrote {} tables", written.len());
    Ok(())
}

fn run_compare(
    logs: &[PathBuf],
    interval: f64,
    out_dir: &Path,
    prefix: &str,
    json: bool,
) -> Result<(), String> {
    let sessions: Vec<(String, MonitoringSession)> = logs
        .iter()
        .zip(run_labels(logs))
        .map(|(path, label)| parse_log(path).map(|session| (label, session)))
        .collect::<Result<_, _>>()?;

    let runs: Vec<(String, Vec<&gcwatch_core::model::GcEvent>)> = sessions
        .iter()
        .map(|(label, session)| (label.clone(), session.store().all().iter().collect()))
        .collect();

    let compared = bins::compare(&runs, interval).map_err(|e| e.to_string())?;
    if compared.is_empty() {
        warn!("no gc events to compare");
        return Ok(());
    }

    let stamp = Utc::now().format("%Y%m%d%H%M%S").to_string();
    write_table(
        out_dir,
        prefix,
        "count",
        &stamp,
        &export::compare_count_table(&compared),
        json,
    )?;
    write_table(
        out_dir,
        prefix,
        "costtime",
        &stamp,
        &export::compare_cost_table(&compared),
        json,
    )?;
    Ok(())
}

/// Labels runs by file stem; falls back to log1/log2/... when stems clash.
fn run_labels(logs: &[PathBuf]) -> Vec<String> {
    let stems: Vec<String> = logs
        .iter()
        .map(|p| {
            p.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.display().to_string())
        })
        .collect();

    let mut unique = stems.clone();
    unique.sort();
    unique.dedup();
    if unique.len() == stems.len() {
        stems
    } else {
        (1..=logs.len()).map(|i| format!("log{}", i)).collect()
    }
}

fn write_table(
    out_dir: &Path,
    prefix: &str,
    name: &str,
    stamp: &str,
    table: &Table,
    json: bool,
) -> Result<PathBuf, String> {
    let ext = if json { "json" } else { "csv" };
    let path = out_dir.join(format!("{}-{}-{}.{}", prefix, name, stamp, ext));
    let body = if json {
        serde_json::to_string_pretty(table).map_err(|e| e.to_string())?
    } else {
        table.to_csv()
    };
    std::fs::write(&path, body).map_err(|e| format!("cannot write {}: {}", path.display(), e))?;
    info!("wrote {}", path.display());
    Ok(path)
}
