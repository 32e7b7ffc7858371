//! Data model for parsed GC events.
//!
//! Events are strongly typed: per-generation deltas live in a list keyed by
//! generation name, and the whole-heap summary is a separate struct.
//! Flattening to `"<Gen>.field"` string columns happens only at the export
//! boundary (see [`crate::export`]).

use serde::Serialize;

/// Reserved generation name under which the whole-heap summary is exported.
pub const HEAP_GENERATION: &str = "Heap";

/// One generation's space change within a single GC pause.
///
/// The generation name is held by the owning [`GcEvent`], not here, so the
/// same struct describes both named generation clauses and the whole-heap
/// numbers inside [`HeapSummary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationDelta {
    /// Occupied space before the pause, kilobytes.
    pub before_kb: f64,
    /// Occupied space after the pause, kilobytes.
    pub after_kb: f64,
    /// Committed space of the generation, kilobytes.
    pub total_kb: f64,
    /// Pause time reported by this clause, when the dialect includes one.
    /// ParNew/CMS inline clauses carry their own timing; Parallel Scavenge
    /// per-generation clauses do not.
    pub cost_time_sec: Option<f64>,
}

/// The whole-heap summary clause of a GC line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeapSummary {
    /// Cause text as printed by the JVM, e.g. `"GC (Allocation Failure)"`
    /// or `"Full GC (Ergonomics)"`.
    pub cause: String,
    /// Heap occupancy before the pause, kilobytes.
    pub before_kb: f64,
    /// Heap occupancy after the pause, kilobytes.
    pub after_kb: f64,
    /// Committed heap size, kilobytes.
    pub total_kb: f64,
    /// Total pause duration, seconds.
    pub cost_time_sec: f64,
}

/// One parsed garbage-collection occurrence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GcEvent {
    /// JVM uptime at pause start, seconds, from the leading timestamp token.
    pub jvm_time_sec: f64,
    /// True when the cause text contains `"Full GC"`.
    pub is_full: bool,
    /// Seconds since the previous event of the same class (minor vs. full
    /// tracked independently). 0 for the first event of each class.
    pub interval_sec: f64,
    /// Whole-heap summary. Retained rather than discarded after timing
    /// extraction; exported under the reserved name [`HEAP_GENERATION`].
    pub heap: HeapSummary,
    /// Per-generation deltas, in clause order.
    pub generations: Vec<(String, GenerationDelta)>,
}

impl GcEvent {
    /// Total pause duration, from the summary clause.
    pub fn cost_time_sec(&self) -> f64 {
        self.heap.cost_time_sec
    }

    /// Looks up a generation delta by name.
    pub fn generation(&self, name: &str) -> Option<&GenerationDelta> {
        self.generations
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, delta)| delta)
    }
}
