//! gcwatchd - JVM GC log monitoring agent.
//!
//! Tails a live GC log, parses events into an in-memory session, evaluates
//! configured alert conditions each poll cycle, and optionally exports
//! event and histogram tables as CSV on shutdown.

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use gcwatch_core::alert::{self, AlertCondition, Evaluation, SessionResolver};
use gcwatch_core::collector::GcLogCollector;
use gcwatch_core::config::MonitorConfig;
use gcwatch_core::export;
use gcwatch_core::session::MonitoringSession;

/// JVM GC log monitoring agent.
#[derive(Parser)]
#[command(name = "gcwatchd", about = "JVM GC log monitoring agent", version)]
struct Args {
    /// Path to the YAML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// GC log file to tail (overrides the config file).
    #[arg(short = 'l', long)]
    gc_log: Option<PathBuf>,

    /// Poll interval in seconds (overrides the config file).
    #[arg(short, long)]
    interval: Option<u64>,

    /// Start tailing at the end of the file instead of replaying it.
    #[arg(long)]
    from_end: bool,

    /// Alert condition, e.g. "fgc.interval_sec < 60". Repeatable; replaces
    /// the config file's alerts.
    #[arg(short, long)]
    alert: Vec<String>,

    /// Write event and histogram CSV tables on shutdown.
    #[arg(long)]
    export_on_exit: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
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
        .add_directive(format!("gcwatchd={}", level).parse().unwrap())
        .add_directive(format!("gcwatch_core={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Builds the effective config from file and CLI overrides.
fn build_config(args: &Args) -> Result<MonitorConfig, String> {
    let mut config = match &args.config {
        Some(path) => MonitorConfig::load(path).map_err(|e| e.to_string())?,
        None => MonitorConfig::default(),
    };

    if let Some(gc_log) = &args.gc_log {
        config.gc_log = gc_log.clone();
    } else if args.config.is_none() {
        return Err("either --config or --gc-log is required".to_string());
    }
    if let Some(interval) = args.interval {
        config.poll_interval_secs = interval;
    }
    if args.from_end {
        config.from_start = false;
    }
    if !args.alert.is_empty() {
        config.alerts = args.alert.clone();
    }
    config.validate().map_err(|e| e.to_string())?;

    Ok(config)
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };

    let conditions: Vec<AlertCondition> = config
        .alerts
        .iter()
        .filter_map(|expr| AlertCondition::parse(expr).ok())
        .collect();

    info!("gcwatchd {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: log={}, interval={}s, from_start={}, alerts={}",
        config.gc_log.display(),
        config.poll_interval_secs,
        config.from_start,
        conditions.len()
    );

    let mut session = MonitoringSession::new(config.clone());
    let mut collector = match GcLogCollector::open(session.config()) {
        Ok(collector) => collector,
        Err(e) => {
            error!("cannot open {}: {}", config.gc_log.display(), e);
            std::process::exit(1);
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        }) {
            warn!("cannot install signal handler: {}", e);
        }
    }

    // One latch per condition: alert on the transition into triggered, not
    // on every poll cycle while it stays true.
    let mut latched = vec![false; conditions.len()];

    while running.load(Ordering::SeqCst) {
        let stats = collector.collect(&mut session);

        if stats.events_parsed > 0 || !conditions.is_empty() {
            let resolver = SessionResolver {
                store: Some(session.store()),
                ..SessionResolver::default()
            };
            for (condition, latch) in conditions.iter().zip(latched.iter_mut()) {
                match alert::evaluate(condition, &resolver) {
                    Ok(Evaluation::Triggered { message, .. }) => {
                        if !*latch {
                            warn!("ALERT at {}: {}", Utc::now().to_rfc3339(), message);
                            *latch = true;
                        }
                    }
                    Ok(Evaluation::NotTriggered { .. }) => *latch = false,
                    Ok(Evaluation::Skipped(_)) => {}
                    Err(e) => error!(
                        "alert '{}.{}' failed: {}",
                        condition.object, condition.field, e
                    ),
                }
            }
        }

        std::thread::sleep(Duration::from_secs(config.poll_interval_secs));
    }

    info!(
        "gcwatchd stopping: {} events ({} minor, {} full)",
        session.store().len(),
        session.store().minor().len(),
        session.store().full().len()
    );

    if args.export_on_exit
        && let Err(e) = export_session(&session)
    {
        error!("export failed: {}", e);
    }
}

/// Writes event tables (all/minor/full) and, when a bin spec is configured,
/// per-view histogram tables, as timestamped CSV files.
fn export_session(session: &MonitoringSession) -> std::io::Result<()> {
    let config = session.config();
    let store = session.store();
    if store.is_empty() {
        warn!("no gc events to export");
        return Ok(());
    }

    let stamp = Utc::now().format("%Y%m%d%H%M%S");
    let dir = &config.export.dir;
    let prefix = &config.export.prefix;

    let mut write = |name: &str, csv: String| -> std::io::Result<()> {
        let path = dir.join(format!("{}-{}-{}.csv", prefix, name, stamp));
        std::fs::write(&path, csv)?;
        info!("wrote {}", path.display());
        Ok(())
    };

    write("all", export::events_table(store.all(), true).to_csv())?;
    write("minor", export::events_table(store.minor(), false).to_csv())?;
    write("full", export::events_table(store.full(), false).to_csv())?;

    if let Some(spec) = config.bin_spec() {
        for (name, bins) in [
            ("all-bins", gcwatch_core::bins::bucket(store.all(), spec)),
            ("minor-bins", gcwatch_core::bins::bucket(store.minor(), spec)),
            ("full-bins", gcwatch_core::bins::bucket(store.full(), spec)),
        ] {
            match bins {
                Ok(bins) => write(name, export::bins_table(&bins).to_csv())?,
                Err(e) => warn!("skipping {}: {}", name, e),
            }
        }
    }

    Ok(())
}
