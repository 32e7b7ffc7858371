//! Append-only store for parsed GC events.

use crate::model::GcEvent;

/// Ordered collection of GC events for one monitoring session.
///
/// Insertion order is chronological order: events are appended as the log is
/// tailed, never removed or reordered, and are immutable once appended.
/// Single-writer by design — one tail loop feeds the store. Concurrent
/// readers must wrap the store (or the owning session) in a mutex; iteration
/// during mutation is not supported.
#[derive(Debug, Default)]
pub struct GcEventStore {
    events: Vec<GcEvent>,
}

impl GcEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event. The caller (the session) is responsible for having
    /// computed `interval_sec` against this store first.
    pub fn append(&mut self, event: GcEvent) {
        self.events.push(event);
    }

    /// All events, in chronological order.
    pub fn all(&self) -> &[GcEvent] {
        &self.events
    }

    /// Minor (non-full) events, chronological order preserved.
    pub fn minor(&self) -> Vec<&GcEvent> {
        self.filtered(false)
    }

    /// Full-GC events, chronological order preserved.
    pub fn full(&self) -> Vec<&GcEvent> {
        self.filtered(true)
    }

    fn filtered(&self, is_full: bool) -> Vec<&GcEvent> {
        self.events.iter().filter(|e| e.is_full == is_full).collect()
    }

    /// Most recent event of the given class.
    pub fn last_of_class(&self, is_full: bool) -> Option<&GcEvent> {
        self.events.iter().rev().find(|e| e.is_full == is_full)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
