//! Monitoring session: parser state, event store and configuration under
//! one explicit owner (no process-wide globals).

use chrono::{DateTime, Utc};

use crate::config::MonitorConfig;
use crate::model::GcEvent;
use crate::parse::{GcLineParser, ParseError};
use crate::store::GcEventStore;

/// One monitoring session over one GC log.
///
/// Owns the line parser, the append-only event store and the session
/// configuration. Feeding a line parses it, computes the same-class
/// inter-event interval against the store, and appends the event.
#[derive(Debug)]
pub struct MonitoringSession {
    parser: GcLineParser,
    store: GcEventStore,
    config: MonitorConfig,
    started_at: DateTime<Utc>,
}

impl MonitoringSession {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            parser: GcLineParser::new(),
            store: GcEventStore::new(),
            config,
            started_at: Utc::now(),
        }
    }

    /// Parses one raw log line and records the event.
    ///
    /// Returns `Ok(None)` for non-GC lines, `Ok(Some)` with a reference to
    /// the stored event, or the parse error for the caller to log. An error
    /// leaves the store untouched; the session stays usable for the next
    /// line.
    pub fn feed_line(&mut self, line: &str) -> Result<Option<&GcEvent>, ParseError> {
        let parsed = match self.parser.parse_line(line)? {
            Some(parsed) => parsed,
            None => return Ok(None),
        };

        // Interval against the most recent event of the same class; 0 for
        // the first of each class (no prior reference exists). Clamped so
        // the non-negativity invariant holds even on a replayed log.
        let interval_sec = self
            .store
            .last_of_class(parsed.is_full)
            .map(|prev| (parsed.jvm_time_sec - prev.jvm_time_sec).max(0.0))
            .unwrap_or(0.0);

        self.store.append(parsed.into_event(interval_sec));
        Ok(self.store.all().last())
    }

    pub fn store(&self) -> &GcEventStore {
        &self.store
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}
