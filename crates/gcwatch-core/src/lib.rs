//! gcwatch-core — shared library for the gcwatch JVM monitoring tools.
//!
//! Provides:
//! - `parse` — GC log line parser (Parallel Scavenge, ParNew/CMS dialects)
//! - `model` — typed event model (generation deltas, heap summary)
//! - `store` — append-only event store with minor/full views
//! - `session` — explicit owner of parser state, store and config
//! - `bins` — time-bin aggregation and multi-run comparison
//! - `alert` — `<field> <op> <value>` condition evaluation
//! - `collector` — file tailer and tail-to-session wiring
//! - `config` — YAML session configuration
//! - `export` — flattened tables, CSV rendering
//!
//! The parsing core is pure and synchronous: all inputs are in-memory
//! strings, there are no suspension points, and a malformed line is a
//! `Result` for the caller — never a crashed tail loop.

pub mod alert;
pub mod bins;
pub mod collector;
pub mod config;
pub mod export;
pub mod model;
pub mod parse;
pub mod session;
pub mod store;
