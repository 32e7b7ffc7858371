//! JVM GC log line parser.
//!
//! Handles the documented `-Xloggc` dialects: Parallel Scavenge, ParNew/CMS
//! (with their duplicated timestamp tokens), and lines carrying a wall-clock
//! prefix before the uptime token.
//!
//! ```text
//! 0.084: [GC (Allocation Failure) [PSYoungGen: 1525K->512K(1536K)] 3556K->2886K(5632K), 0.0039928 secs] [Times: ...]
//! 0.089: [Full GC (Ergonomics) [PSYoungGen: 1536K->0K(1536K)] [ParOldGen: 3312K->4088K(4096K)] 4848K->4088K(5632K), [Metaspace: 3313K->3313K(1056768K)], 0.0416957 secs] [Times: ...]
//! 0.064: [GC (Allocation Failure) 0.064: [ParNew: 509K->64K(576K), 0.0032549 secs] 509K->282K(1984K), 0.0033544 secs] [Times: ...]
//! ```
//!
//! The parser is pure: it never logs and never consults history. The caller
//! owns the decision to log a [`ParseError`] and keep tailing — a malformed
//! line must never terminate a monitoring session. Inter-event intervals are
//! computed by [`crate::session::MonitoringSession`], which sees the store.

pub mod generation;
pub mod normalize;

use crate::model::{GcEvent, GenerationDelta, HeapSummary};

use generation::parse_generation_clause;
use normalize::{
    cleanup_summary, extract_bracket_groups, split_leading_timestamp, strip_double_dash,
    strip_timestamp_tokens,
};

/// Error for a line that looked like a GC line but did not match any
/// documented dialect. Recoverable by contract: the caller logs it and
/// moves on to the next line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A bracket group other than `[Times: ...]` did not match the
    /// generation grammar — an unrecognized dialect, not a benign mismatch.
    MalformedClause { clause: String },
    /// The timestamp token was not a number.
    BadTimestamp { token: String },
    /// No whole-heap summary clause remained after group extraction.
    MissingSummary { line: String },
    /// The summary clause carried no pause duration.
    MissingCostTime { line: String },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MalformedClause { clause } => {
                write!(f, "unrecognized generation clause: {}", clause)
            }
            ParseError::BadTimestamp { token } => {
                write!(f, "invalid timestamp token: {}", token)
            }
            ParseError::MissingSummary { line } => {
                write!(f, "no heap summary clause in: {}", line)
            }
            ParseError::MissingCostTime { line } => {
                write!(f, "summary clause without pause time in: {}", line)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// A fully parsed GC line, before interval computation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedGcLine {
    pub jvm_time_sec: f64,
    pub is_full: bool,
    pub heap: HeapSummary,
    pub generations: Vec<(String, GenerationDelta)>,
}

impl ParsedGcLine {
    /// Finalizes into an event with the given same-class interval.
    pub fn into_event(self, interval_sec: f64) -> GcEvent {
        GcEvent {
            jvm_time_sec: self.jvm_time_sec,
            is_full: self.is_full,
            interval_sec,
            heap: self.heap,
            generations: self.generations,
        }
    }
}

/// Stateless GC log line parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct GcLineParser;

impl GcLineParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses one raw log line.
    ///
    /// Returns `Ok(None)` for lines that are not GC lines at all (the cheap
    /// pre-filter: a GC line contains both `": ["` and `"->"`), `Ok(Some)`
    /// for a parsed line, and `Err` for a line that passed the pre-filter
    /// but did not match any documented dialect.
    pub fn parse_line(&self, line: &str) -> Result<Option<ParsedGcLine>, ParseError> {
        if !line.contains(": [") || !line.contains("->") {
            return Ok(None);
        }

        let work = strip_double_dash(line);
        let (groups, remainder) = extract_bracket_groups(&work);

        let mut generations = Vec::new();
        for group in groups {
            if group.starts_with("[Times:") {
                // CPU-time breakdown, not generation data.
                continue;
            }
            let (name, delta) = parse_generation_clause(&group).ok_or_else(|| {
                ParseError::MalformedClause {
                    clause: group.clone(),
                }
            })?;
            generations.push((name, delta));
        }

        // The pre-filter guarantees the original line had a `": ["`; if the
        // remainder lost it, every bracket was an innermost group and no
        // summary clause is left.
        let (token, summary) =
            split_leading_timestamp(&remainder).ok_or_else(|| ParseError::MissingSummary {
                line: line.to_string(),
            })?;
        let jvm_time_sec = token.parse::<f64>().map_err(|_| ParseError::BadTimestamp {
            token: token.to_string(),
        })?;

        let summary = cleanup_summary(&strip_timestamp_tokens(summary));
        let (cause, heap_delta) =
            parse_generation_clause(&summary).ok_or_else(|| ParseError::MissingSummary {
                line: line.to_string(),
            })?;
        let cost_time_sec = heap_delta
            .cost_time_sec
            .ok_or_else(|| ParseError::MissingCostTime {
                line: line.to_string(),
            })?;

        Ok(Some(ParsedGcLine {
            jvm_time_sec,
            is_full: line.contains("Full GC"),
            heap: HeapSummary {
                cause,
                before_kb: heap_delta.before_kb,
                after_kb: heap_delta.after_kb,
                total_kb: heap_delta.total_kb,
                cost_time_sec,
            },
            generations,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PS_MINOR: &str = "0.084: [GC (Allocation Failure) [PSYoungGen: 1525K->512K(1536K)] 3556K->2886K(5632K), 0.0039928 secs] [Times: user=0.01 sys=0.00, real=0.00 secs]";
    const PS_FULL: &str = "0.089: [Full GC (Ergonomics) [PSYoungGen: 1536K->0K(1536K)] [ParOldGen: 3312K->4088K(4096K)] 4848K->4088K(5632K), [Metaspace: 3313K->3313K(1056768K)], 0.0416957 secs] [Times: user=0.13 sys=0.00, real=0.04 secs]";
    const PARNEW_MINOR: &str = "0.064: [GC (Allocation Failure) 0.064: [ParNew: 509K->64K(576K), 0.0032549 secs] 509K->282K(1984K), 0.0033544 secs] [Times: user=0.01 sys=0.00, real=0.00 secs]";
    const CMS_FULL: &str = "104429.457: [Full GC (System) 104429.457: [CMS: 219741K->215266K(1835008K), 0.5469450 secs] 244623K->215266K(2070976K), [CMS Perm : 128846K->128831K(262144K)], 0.5470720 secs] [Times: user=0.54 sys=0.00, real=0.55 secs]";
    const WALL_CLOCK_FULL: &str = "2019-03-28T18:09:15.774+0800: 389.142: [Full GC (Ergonomics) [PSYoungGen: 17010K->0K(925184K)] [ParOldGen: 2098093K->2103707K(2776064K)] 2115103K->2103707K(3701248K), [Metaspace: 62299K->62299K(1105920K)], 5.5291426 secs] [Times: user=14.83 sys=0.09, real=5.53 secs]";

    fn parse(line: &str) -> ParsedGcLine {
        GcLineParser::new().parse_line(line).unwrap().unwrap()
    }

    #[test]
    fn test_parallel_scavenge_minor() {
        let parsed = parse(PS_MINOR);
        assert_eq!(parsed.jvm_time_sec, 0.084);
        assert!(!parsed.is_full);
        assert_eq!(parsed.heap.cause, "GC (Allocation Failure)");
        assert_eq!(parsed.heap.before_kb, 3556.0);
        assert_eq!(parsed.heap.after_kb, 2886.0);
        assert_eq!(parsed.heap.total_kb, 5632.0);
        assert_eq!(parsed.heap.cost_time_sec, 0.0039928);
        assert_eq!(parsed.generations.len(), 1);
        let (name, young) = &parsed.generations[0];
        assert_eq!(name, "PSYoungGen");
        assert_eq!(young.before_kb, 1525.0);
        assert_eq!(young.after_kb, 512.0);
        assert_eq!(young.total_kb, 1536.0);
        assert!(young.cost_time_sec.is_none());
    }

    #[test]
    fn test_full_gc_collects_all_generations() {
        let parsed = parse(PS_FULL);
        assert!(parsed.is_full);
        assert_eq!(parsed.heap.cause, "Full GC (Ergonomics)");
        assert_eq!(parsed.heap.cost_time_sec, 0.0416957);
        let names: Vec<&str> = parsed.generations.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["PSYoungGen", "ParOldGen", "Metaspace"]);
        assert_eq!(parsed.generations[1].1.after_kb, 4088.0);
        assert_eq!(parsed.generations[2].1.total_kb, 1056768.0);
    }

    #[test]
    fn test_parnew_duplicated_timestamp() {
        let parsed = parse(PARNEW_MINOR);
        assert_eq!(parsed.jvm_time_sec, 0.064);
        assert!(!parsed.is_full);
        assert_eq!(parsed.heap.before_kb, 509.0);
        assert_eq!(parsed.heap.after_kb, 282.0);
        assert_eq!(parsed.heap.cost_time_sec, 0.0033544);
        let (name, par_new) = &parsed.generations[0];
        assert_eq!(name, "ParNew");
        assert_eq!(par_new.cost_time_sec, Some(0.0032549));
    }

    #[test]
    fn test_parnew_near_duplicate_timestamp() {
        // The second token may drift by up to 0.001 s; it is still the same
        // occurrence and the first token wins.
        let line = "0.064: [GC (Allocation Failure) 0.065: [ParNew: 509K->64K(576K), 0.0032549 secs] 509K->282K(1984K), 0.0033544 secs]";
        let parsed = parse(line);
        assert_eq!(parsed.jvm_time_sec, 0.064);
        assert_eq!(parsed.heap.cause, "GC (Allocation Failure)");
    }

    #[test]
    fn test_cms_full() {
        let parsed = parse(CMS_FULL);
        assert_eq!(parsed.jvm_time_sec, 104429.457);
        assert!(parsed.is_full);
        assert_eq!(parsed.heap.before_kb, 244623.0);
        assert_eq!(parsed.heap.cost_time_sec, 0.5470720);
        let names: Vec<&str> = parsed.generations.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["CMS", "CMS Perm"]);
        assert_eq!(parsed.generations[0].1.cost_time_sec, Some(0.5469450));
    }

    #[test]
    fn test_wall_clock_prefix() {
        let parsed = parse(WALL_CLOCK_FULL);
        assert_eq!(parsed.jvm_time_sec, 389.142);
        assert!(parsed.is_full);
        assert_eq!(parsed.heap.cost_time_sec, 5.5291426);
        assert_eq!(parsed.generations.len(), 3);
    }

    #[test]
    fn test_double_dash_artifact() {
        let line = "0.095: [GC (Allocation Failure) --[PSYoungGen: 1520K->1520K(1536K)] 4784K->5608K(5632K), 0.0099458 secs] [Times: user=0.03 sys=0.00, real=0.01 secs]";
        let parsed = parse(line);
        assert_eq!(parsed.jvm_time_sec, 0.095);
        assert_eq!(parsed.generations[0].0, "PSYoungGen");
        assert_eq!(parsed.heap.before_kb, 4784.0);
    }

    #[test]
    fn test_non_gc_line_is_none() {
        let parser = GcLineParser::new();
        assert_eq!(parser.parse_line("hello world").unwrap(), None);
        assert_eq!(
            parser
                .parse_line("Java HotSpot(TM) 64-Bit Server VM (25.152-b16) for linux-amd64")
                .unwrap(),
            None
        );
        assert_eq!(parser.parse_line("").unwrap(), None);
    }

    #[test]
    fn test_malformed_clause_is_error() {
        let line = "0.084: [GC (Allocation Failure) [PSYoungGen: garbage] 3556K->2886K(5632K), 0.0039928 secs]";
        let err = GcLineParser::new().parse_line(line).unwrap_err();
        assert!(matches!(err, ParseError::MalformedClause { .. }));
    }

    #[test]
    fn test_missing_summary_is_error() {
        // Generation clause present but nothing summary-shaped remains.
        let line = "0.084: [PSYoungGen: 1525K->512K(1536K)]";
        let err = GcLineParser::new().parse_line(line).unwrap_err();
        assert!(matches!(err, ParseError::MissingSummary { .. }));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let parser = GcLineParser::new();
        let first = parser.parse_line(PS_MINOR).unwrap().unwrap();
        let second = parser.parse_line(PS_MINOR).unwrap().unwrap();
        assert_eq!(first, second);
    }
}
