//! Line normalization steps for the GC log grammar.
//!
//! Each known dialect idiosyncrasy is handled by its own named function so
//! that new dialects can be supported without touching the bracket-extraction
//! loop or the clause parser. All functions are pure string transforms.

/// Removes the `"--"` artifact some JVM versions print next to a generation
/// clause under allocation-failure causes:
///
/// `0.095: [GC (Allocation Failure) --[PSYoungGen: 1520K->1520K(1536K)] ...`
pub fn strip_double_dash(line: &str) -> String {
    line.replace("--", "")
}

/// Collects every innermost bracketed group of the line in one left-to-right
/// scan and returns the groups (brackets included) together with the line
/// with those groups removed.
///
/// An innermost group is a maximal `[...]` run containing no nested bracket.
/// A single pass over the original nesting is intentional: the outer summary
/// bracket (`[GC (...) ... secs]`) must survive for the summary pass even
/// though removing its children makes it innermost afterwards.
pub fn extract_bracket_groups(line: &str) -> (Vec<String>, String) {
    let mut groups = Vec::new();
    let mut remainder = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        match (after.find('['), after.find(']')) {
            (Some(inner), Some(close)) if inner < close => {
                // Nested open before the close: keep this bracket and scan inside.
                remainder.push_str(&rest[..open + 1]);
                rest = after;
            }
            (_, Some(close)) => {
                remainder.push_str(&rest[..open]);
                groups.push(rest[open..open + close + 2].to_string());
                rest = &after[close + 1..];
            }
            (_, None) => {
                // Unbalanced bracket: keep it and move on.
                remainder.push_str(&rest[..open + 1]);
                rest = after;
            }
        }
    }
    remainder.push_str(rest);

    (groups, remainder)
}

/// Splits the leading timestamp off a line whose first `": ["` marks the
/// start of the log message.
///
/// The JVM-uptime token is the last `:`-separated field of the prefix, which
/// tolerates a wall-clock prefix (`2019-03-28T18:09:15.774+0800: 389.142: [`).
/// Returns the uptime token and the rest of the line starting at `'['`.
pub fn split_leading_timestamp(line: &str) -> Option<(&str, &str)> {
    let pos = line.find(": [")?;
    let prefix = &line[..pos];
    let token = prefix.rsplit(':').next()?.trim();
    Some((token, &line[pos + 2..]))
}

/// Removes residual `<seconds>: ` timestamp tokens from the summary text.
///
/// ParNew/CMS lines repeat the uptime token before the inline generation
/// clause (sometimes 0.000-0.001 s apart from the leading one); once that
/// clause is stripped the token is left dangling in the summary. A token is
/// only removed at a word boundary so date fragments like `+0800:` survive.
pub fn strip_timestamp_tokens(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let at_boundary = i == 0 || bytes[i - 1].is_ascii_whitespace();
        if at_boundary && bytes[i].is_ascii_digit() {
            if let Some(len) = timestamp_token_len(&bytes[i..]) {
                i += len;
                continue;
            }
        }
        // Multi-byte UTF-8 never starts with an ASCII digit, so byte-wise
        // copying is safe only for ASCII; push the full char instead.
        let ch = text[i..].chars().next().unwrap_or('\u{FFFD}');
        out.push(ch);
        i += ch.len_utf8();
    }

    out
}

/// Length of a `digits[.digits]: ` token at the start of `bytes`, if present.
fn timestamp_token_len(bytes: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == 0 {
        return None;
    }
    if bytes.get(i) == Some(&b'.') {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j == frac_start {
            return None;
        }
        i = j;
    }
    if bytes.get(i) == Some(&b':') && bytes.get(i + 1) == Some(&b' ') {
        Some(i + 2)
    } else {
        None
    }
}

/// Reshapes the summary remainder into the generation-clause grammar:
/// collapses the `", ,"` left by a stripped trailing clause and turns the
/// `") "` after the cause text into `"):"` so the clause parser sees
/// `name: <n>K-><n>K(<n>K)`.
pub fn cleanup_summary(text: &str) -> String {
    text.replace(", ,", ",").replace(") ", "):")
}
