//! GC log collector: tails the log file and feeds lines into a session.
//!
//! The collector owns the I/O side of the pipeline. Parse failures are
//! logged here with the offending line and counted — a malformed line never
//! stops the tail loop.

pub mod tailer;

use std::io;
use std::path::Path;

use tracing::{debug, warn};

use crate::config::MonitorConfig;
use crate::session::MonitoringSession;

use tailer::{FileTailer, TailFrom};

/// Counters for one collect cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
    pub lines_read: usize,
    pub events_parsed: usize,
    pub parse_failures: usize,
}

/// Tails one GC log and drives a [`MonitoringSession`].
pub struct GcLogCollector {
    tailer: FileTailer,
}

impl GcLogCollector {
    /// Opens the configured log file for tailing.
    pub fn open(config: &MonitorConfig) -> io::Result<Self> {
        let from = if config.from_start {
            TailFrom::Start
        } else {
            TailFrom::End
        };
        let tailer = FileTailer::new(config.gc_log.clone(), from)?;
        Ok(Self { tailer })
    }

    /// Reads new lines and feeds them to the session.
    pub fn collect(&mut self, session: &mut MonitoringSession) -> CollectStats {
        let lines = match self.tailer.read_new_lines() {
            Ok(lines) => lines,
            Err(e) => {
                warn!("reading {} failed: {}", self.tailer.path().display(), e);
                return CollectStats::default();
            }
        };

        let mut stats = CollectStats {
            lines_read: lines.len(),
            ..CollectStats::default()
        };

        for line in &lines {
            match session.feed_line(line) {
                Ok(Some(_)) => stats.events_parsed += 1,
                Ok(None) => {}
                Err(e) => {
                    stats.parse_failures += 1;
                    warn!("skipping gc line: {} ({})", line, e);
                }
            }
        }

        if stats.events_parsed > 0 {
            debug!(
                "collected {} events from {} lines ({} total)",
                stats.events_parsed,
                stats.lines_read,
                session.store().len()
            );
        }

        stats
    }

    pub fn path(&self) -> &Path {
        self.tailer.path()
    }
}
