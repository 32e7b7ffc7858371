//! Time-bin aggregation of GC events.
//!
//! Partitions events into time-aligned buckets, either a fixed number of
//! equal-width bins over the data range or fixed-interval bins whose edges
//! are exact multiples of the interval. The latter makes separate runs
//! directly comparable on the same grid, which is what
//! [`compare`] builds on.
//!
//! Bucketing assigns each event by index arithmetic, so a request costs
//! O(events + bins) regardless of how often it is repeated.

use serde::Serialize;

use crate::model::GcEvent;

/// Bin specification: a fixed bin count over the data range, or a fixed
/// interval in seconds with edges at exact multiples of the interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinSpec {
    Count(usize),
    Interval(f64),
}

/// One aggregation bucket over `[start, end)` of `jvm_time_sec`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeBin {
    pub start: f64,
    pub end: f64,
    /// Number of events whose `jvm_time_sec` falls in the range.
    pub count: usize,
    /// Sum of `cost_time_sec` over those events.
    pub cost_time_total: f64,
}

/// Caller contract violation: a non-positive bin count or interval.
#[derive(Debug, Clone, PartialEq)]
pub enum BinError {
    InvalidCount(usize),
    InvalidInterval(f64),
}

impl std::fmt::Display for BinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinError::InvalidCount(n) => write!(f, "bin count must be positive, got {}", n),
            BinError::InvalidInterval(w) => {
                write!(f, "bin interval must be positive, got {}", w)
            }
        }
    }
}

impl std::error::Error for BinError {}

/// Buckets per-run results keyed by run label, on a shared grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunBins {
    pub label: String,
    pub bins: Vec<TimeBin>,
}

/// Partitions events into time bins.
///
/// An empty event set yields an empty result. Events on a bin boundary fall
/// into the bin whose *left* edge they sit on (right-open bins); with a
/// count spec the data maximum — the right edge of the last bin — is folded
/// into that last bin so every event is counted.
pub fn bucket<'a, I>(events: I, spec: BinSpec) -> Result<Vec<TimeBin>, BinError>
where
    I: IntoIterator<Item = &'a GcEvent>,
{
    let events: Vec<&GcEvent> = events.into_iter().collect();
    match spec {
        BinSpec::Count(n) => bucket_by_count(&events, n),
        BinSpec::Interval(w) => bucket_by_interval(&events, w),
    }
}

fn bucket_by_count(events: &[&GcEvent], n: usize) -> Result<Vec<TimeBin>, BinError> {
    if n == 0 {
        return Err(BinError::InvalidCount(n));
    }
    if events.is_empty() {
        return Ok(Vec::new());
    }

    let lo = fold_time(events, f64::min);
    let hi = fold_time(events, f64::max);
    let width = (hi - lo) / n as f64;

    let mut bins: Vec<TimeBin> = (0..n)
        .map(|i| TimeBin {
            start: lo + i as f64 * width,
            end: lo + (i + 1) as f64 * width,
            count: 0,
            cost_time_total: 0.0,
        })
        .collect();

    for event in events {
        let index = if width > 0.0 {
            (((event.jvm_time_sec - lo) / width).floor() as usize).min(n - 1)
        } else {
            // All events share one timestamp; everything lands in bin 0.
            0
        };
        bins[index].count += 1;
        bins[index].cost_time_total += event.cost_time_sec();
    }

    Ok(bins)
}

fn bucket_by_interval(events: &[&GcEvent], interval: f64) -> Result<Vec<TimeBin>, BinError> {
    if !(interval > 0.0) {
        return Err(BinError::InvalidInterval(interval));
    }
    if events.is_empty() {
        return Ok(Vec::new());
    }

    let max = fold_time(events, f64::max);
    Ok(fill_grid(events, interval, grid_len(max, interval)))
}

/// Number of `[i*w, (i+1)*w)` bins needed so the last edge strictly exceeds
/// the data maximum.
fn grid_len(max_time: f64, interval: f64) -> usize {
    (max_time / interval).floor() as usize + 1
}

/// Buckets events onto a fixed grid of `len` interval-wide bins.
fn fill_grid(events: &[&GcEvent], interval: f64, len: usize) -> Vec<TimeBin> {
    let mut bins: Vec<TimeBin> = (0..len)
        .map(|i| TimeBin {
            start: i as f64 * interval,
            end: (i + 1) as f64 * interval,
            count: 0,
            cost_time_total: 0.0,
        })
        .collect();

    for event in events {
        let index = (event.jvm_time_sec / interval).floor() as usize;
        if let Some(bin) = bins.get_mut(index) {
            bin.count += 1;
            bin.cost_time_total += event.cost_time_sec();
        }
    }

    bins
}

fn fold_time(events: &[&GcEvent], f: fn(f64, f64) -> f64) -> f64 {
    // events is non-empty at every call site.
    let mut acc = events[0].jvm_time_sec;
    for event in &events[1..] {
        acc = f(acc, event.jvm_time_sec);
    }
    acc
}

/// Buckets several runs against one shared grid.
///
/// The grid is derived from the maximum `jvm_time_sec` across *all* runs and
/// the given interval, so every run's bins line up edge for edge. Runs that
/// are all empty yield an empty result.
pub fn compare(
    runs: &[(String, Vec<&GcEvent>)],
    interval: f64,
) -> Result<Vec<RunBins>, BinError> {
    if !(interval > 0.0) {
        return Err(BinError::InvalidInterval(interval));
    }

    let max = runs
        .iter()
        .flat_map(|(_, events)| events.iter())
        .map(|e| e.jvm_time_sec)
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Ok(Vec::new());
    }

    let len = grid_len(max, interval);
    Ok(runs
        .iter()
        .map(|(label, events)| RunBins {
            label: label.clone(),
            bins: fill_grid(events, interval, len),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HeapSummary;

    fn event(jvm_time_sec: f64, cost_time_sec: f64) -> GcEvent {
        GcEvent {
            jvm_time_sec,
            is_full: false,
            interval_sec: 0.0,
            heap: HeapSummary {
                cause: "GC (Allocation Failure)".to_string(),
                before_kb: 100.0,
                after_kb: 50.0,
                total_kb: 200.0,
                cost_time_sec,
            },
            generations: Vec::new(),
        }
    }

    #[test]
    fn test_interval_bins_align_to_multiples() {
        // 10 events spanning 0-100 at interval 30 -> [0,30) [30,60) [60,90) [90,120).
        let events: Vec<GcEvent> = (0..10).map(|i| event(i as f64 * 100.0 / 9.0, 0.01)).collect();
        let bins = bucket(&events, BinSpec::Interval(30.0)).unwrap();
        assert_eq!(bins.len(), 4);
        assert_eq!(bins[0].start, 0.0);
        assert_eq!(bins[0].end, 30.0);
        assert_eq!(bins[3].start, 90.0);
        assert_eq!(bins[3].end, 120.0);
        let total: usize = bins.iter().map(|b| b.count).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn test_boundary_event_goes_to_left_edge_bin() {
        let events = [event(30.0, 0.5)];
        let bins = bucket(&events, BinSpec::Interval(30.0)).unwrap();
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].count, 0);
        assert_eq!(bins[1].count, 1);
        assert_eq!(bins[1].start, 30.0);
    }

    #[test]
    fn test_cost_time_sums_per_bin() {
        let events = [event(1.0, 0.1), event(2.0, 0.2), event(35.0, 0.4)];
        let bins = bucket(&events, BinSpec::Interval(30.0)).unwrap();
        assert_eq!(bins[0].count, 2);
        assert!((bins[0].cost_time_total - 0.3).abs() < 1e-9);
        assert_eq!(bins[1].count, 1);
        assert!((bins[1].cost_time_total - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_count_spec_covers_data_range() {
        let events: Vec<GcEvent> = (0..=10).map(|i| event(i as f64, 0.01)).collect();
        let bins = bucket(&events, BinSpec::Count(5)).unwrap();
        assert_eq!(bins.len(), 5);
        assert_eq!(bins[0].start, 0.0);
        assert_eq!(bins[4].end, 10.0);
        // The maximum sits on the final right edge and still gets counted.
        let total: usize = bins.iter().map(|b| b.count).sum();
        assert_eq!(total, 11);
    }

    #[test]
    fn test_count_spec_single_timestamp() {
        let events = [event(5.0, 0.1), event(5.0, 0.2)];
        let bins = bucket(&events, BinSpec::Count(3)).unwrap();
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[1].count, 0);
    }

    #[test]
    fn test_empty_events_yield_empty_bins() {
        let events: Vec<GcEvent> = Vec::new();
        assert!(bucket(&events, BinSpec::Interval(30.0)).unwrap().is_empty());
        assert!(bucket(&events, BinSpec::Count(4)).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_specs_are_errors() {
        let events = [event(1.0, 0.1)];
        assert_eq!(
            bucket(&events, BinSpec::Count(0)).unwrap_err(),
            BinError::InvalidCount(0)
        );
        assert_eq!(
            bucket(&events, BinSpec::Interval(0.0)).unwrap_err(),
            BinError::InvalidInterval(0.0)
        );
        assert!(bucket(&events, BinSpec::Interval(-1.0)).is_err());
    }

    #[test]
    fn test_compare_shares_one_grid() {
        let short: Vec<GcEvent> = vec![event(5.0, 0.1), event(25.0, 0.1)];
        let long: Vec<GcEvent> = vec![event(10.0, 0.2), event(95.0, 0.3)];
        let runs = vec![
            ("before".to_string(), short.iter().collect::<Vec<_>>()),
            ("after".to_string(), long.iter().collect::<Vec<_>>()),
        ];

        let compared = compare(&runs, 30.0).unwrap();
        assert_eq!(compared.len(), 2);
        // Both runs get the grid sized by the global maximum (95 -> 4 bins).
        assert_eq!(compared[0].bins.len(), 4);
        assert_eq!(compared[1].bins.len(), 4);
        assert_eq!(compared[0].label, "before");
        assert_eq!(compared[0].bins[0].count, 2);
        assert_eq!(compared[1].bins[3].count, 1);
        for (a, b) in compared[0].bins.iter().zip(&compared[1].bins) {
            assert_eq!(a.start, b.start);
            assert_eq!(a.end, b.end);
        }
    }

    #[test]
    fn test_compare_empty_runs() {
        let runs: Vec<(String, Vec<&GcEvent>)> = vec![("empty".to_string(), Vec::new())];
        assert!(compare(&runs, 10.0).unwrap().is_empty());
        assert!(compare(&[], 10.0).unwrap().is_empty());
    }

    #[test]
    fn test_compare_invalid_interval() {
        assert!(compare(&[], 0.0).is_err());
    }
}
