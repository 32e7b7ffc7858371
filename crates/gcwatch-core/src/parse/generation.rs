//! Single generation-clause parser.
//!
//! Grammar: `[<name>: <before>K-><after>K(<total>K)[, <seconds> secs]]`.
//! K values are base-10 integers, seconds a plain float; no locale formats.

use crate::model::GenerationDelta;

/// Parses one generation clause into its name and delta.
///
/// Accepts the clause with or without surrounding brackets, so the same
/// grammar serves bracketed per-generation clauses and the reformatted
/// whole-heap summary. The trailing cost-time group is optional and its
/// absence is not an error. Returns `None` when the numeric pattern does
/// not match.
///
/// Generation names are trimmed: the CMS dialect prints `"CMS Perm "` with
/// a trailing space.
pub fn parse_generation_clause(text: &str) -> Option<(String, GenerationDelta)> {
    let s = text.trim();
    let s = s.strip_prefix('[').unwrap_or(s);
    let s = s.strip_suffix(']').unwrap_or(s);

    let (name, rest) = s.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let rest = rest.trim_start();
    let (before_kb, rest) = take_kilobytes(rest)?;
    let rest = rest.strip_prefix("->")?;
    let (after_kb, rest) = take_kilobytes(rest)?;
    let rest = rest.strip_prefix('(')?;
    let (total_kb, rest) = take_kilobytes(rest)?;
    let rest = rest.strip_prefix(')')?;

    let cost_time_sec = parse_cost_time(rest);

    Some((
        name.to_string(),
        GenerationDelta {
            before_kb,
            after_kb,
            total_kb,
            cost_time_sec,
        },
    ))
}

/// Consumes a `<digits>K` size at the start of `s`.
fn take_kilobytes(s: &str) -> Option<(f64, &str)> {
    let digits_end = s.find(|c: char| !c.is_ascii_digit())?;
    if digits_end == 0 {
        return None;
    }
    let (digits, rest) = s.split_at(digits_end);
    let rest = rest.strip_prefix('K')?;
    let value = digits.parse::<u64>().ok()?;
    Some((value as f64, rest))
}

/// Parses the optional `, <seconds> secs` tail.
fn parse_cost_time(s: &str) -> Option<f64> {
    let s = s.trim_start().strip_prefix(',')?.trim_start();
    let s = s.strip_suffix("secs")?.trim();
    s.parse::<f64>().ok()
}
