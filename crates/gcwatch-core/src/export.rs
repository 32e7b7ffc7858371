//! Tabular export of events and bin aggregates.
//!
//! This is the serialization boundary: the typed event model is flattened
//! into `"<Gen>.field"` string columns here and nowhere else. Tables go out
//! as CSV (hand-rendered, RFC 4180 quoting) or as JSON via `serde`.

use serde::Serialize;

use crate::bins::{RunBins, TimeBin};
use crate::model::{GcEvent, HEAP_GENERATION};

/// One table cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Num(f64),
    Bool(bool),
    Text(String),
    Empty,
}

/// A column-ordered table ready for the export collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Renders the table as CSV with a header row.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        write_csv_row(&mut out, self.columns.iter().map(String::as_str));
        for row in &self.rows {
            let rendered: Vec<String> = row.iter().map(render_cell).collect();
            write_csv_row(&mut out, rendered.iter().map(String::as_str));
        }
        out
    }
}

fn render_cell(cell: &Cell) -> String {
    match cell {
        Cell::Num(value) => format!("{}", value),
        Cell::Bool(value) => value.to_string(),
        Cell::Text(text) => text.clone(),
        Cell::Empty => String::new(),
    }
}

/// Writes one CSV row, quoting fields that contain commas, quotes or
/// newlines (double-quote escaping).
fn write_csv_row<'a, I>(out: &mut String, fields: I)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        first = false;
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}

/// Flattens events into a table.
///
/// Fixed columns first (`jvm_time_sec`, `interval_sec`, `cost_time_sec`,
/// plus `is_full` when requested — the minor/full views drop it since the
/// view implies it), then the retained whole-heap summary under the
/// reserved `Heap.` prefix, then each generation's columns in first-seen
/// clause order. A generation absent from an event yields empty cells; a
/// `cost_time_sec` column appears only for generations that report one.
pub fn events_table<'a, I>(events: I, include_is_full: bool) -> Table
where
    I: IntoIterator<Item = &'a GcEvent>,
{
    let events: Vec<&GcEvent> = events.into_iter().collect();

    // First-seen generation order, and whether any clause carries timing.
    let mut names: Vec<String> = Vec::new();
    let mut timed: Vec<bool> = Vec::new();
    for event in &events {
        for (name, delta) in &event.generations {
            match names.iter().position(|n| n == name) {
                Some(i) => timed[i] |= delta.cost_time_sec.is_some(),
                None => {
                    names.push(name.clone());
                    timed.push(delta.cost_time_sec.is_some());
                }
            }
        }
    }

    let mut columns = vec![
        "jvm_time_sec".to_string(),
        "interval_sec".to_string(),
        "cost_time_sec".to_string(),
    ];
    if include_is_full {
        columns.push("is_full".to_string());
    }
    for field in ["before_kb", "after_kb", "total_kb"] {
        columns.push(format!("{}.{}", HEAP_GENERATION, field));
    }
    for (name, &has_time) in names.iter().zip(&timed) {
        for field in ["before_kb", "after_kb", "total_kb"] {
            columns.push(format!("{}.{}", name, field));
        }
        if has_time {
            columns.push(format!("{}.cost_time_sec", name));
        }
    }

    let rows = events
        .iter()
        .map(|event| {
            let mut row = vec![
                Cell::Num(event.jvm_time_sec),
                Cell::Num(event.interval_sec),
                Cell::Num(event.cost_time_sec()),
            ];
            if include_is_full {
                row.push(Cell::Bool(event.is_full));
            }
            row.push(Cell::Num(event.heap.before_kb));
            row.push(Cell::Num(event.heap.after_kb));
            row.push(Cell::Num(event.heap.total_kb));
            for (name, &has_time) in names.iter().zip(&timed) {
                match event.generation(name) {
                    Some(delta) => {
                        row.push(Cell::Num(delta.before_kb));
                        row.push(Cell::Num(delta.after_kb));
                        row.push(Cell::Num(delta.total_kb));
                        if has_time {
                            row.push(match delta.cost_time_sec {
                                Some(secs) => Cell::Num(secs),
                                None => Cell::Empty,
                            });
                        }
                    }
                    None => {
                        let width = if has_time { 4 } else { 3 };
                        row.extend(std::iter::repeat_n(Cell::Empty, width));
                    }
                }
            }
            row
        })
        .collect();

    Table { columns, rows }
}

/// Renders time bins as a table: the bin range, its right edge (a handy
/// numeric sort key for spreadsheets), the event count and the summed
/// pause time.
pub fn bins_table(bins: &[TimeBin]) -> Table {
    let columns = vec![
        "bin".to_string(),
        "time".to_string(),
        "count".to_string(),
        "cost_time_sec".to_string(),
    ];
    let rows = bins
        .iter()
        .map(|bin| {
            vec![
                Cell::Text(format!("[{}, {})", bin.start, bin.end)),
                Cell::Num(bin.end),
                Cell::Num(bin.count as f64),
                Cell::Num(bin.cost_time_total),
            ]
        })
        .collect();
    Table { columns, rows }
}

/// Merged per-run event counts on the shared grid: one `<label>.count`
/// column per run, joined on bin index.
pub fn compare_count_table(runs: &[RunBins]) -> Table {
    compare_table(runs, "count", |bin| Cell::Num(bin.count as f64))
}

/// Merged per-run pause-time totals on the shared grid.
pub fn compare_cost_table(runs: &[RunBins]) -> Table {
    compare_table(runs, "cost_time_sec", |bin| Cell::Num(bin.cost_time_total))
}

fn compare_table(runs: &[RunBins], suffix: &str, value: fn(&TimeBin) -> Cell) -> Table {
    let mut columns = vec!["time".to_string()];
    for run in runs {
        columns.push(format!("{}.{}", run.label, suffix));
    }

    let grid_len = runs.first().map(|run| run.bins.len()).unwrap_or(0);
    let rows = (0..grid_len)
        .map(|i| {
            let mut row = Vec::with_capacity(runs.len() + 1);
            row.push(Cell::Num(runs[0].bins[i].end));
            for run in runs {
                row.push(match run.bins.get(i) {
                    Some(bin) => value(bin),
                    None => Cell::Empty,
                });
            }
            row
        })
        .collect();

    Table { columns, rows }
}
