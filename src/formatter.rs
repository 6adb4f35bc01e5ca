//! Human-readable rendering of error reports
//!
//! Output is meant for people reading a terminal or a log file. The header is
//! always a single line; frames follow one per line, innermost first.

use crate::report::{ErrorReport, StackFrame};

/// Placeholder for missing kinds, functions and files
pub const UNKNOWN: &str = "<unknown>";

pub const DEFAULT_SEPARATOR_LENGTH: usize = 40;
pub const DEFAULT_SEPARATOR_CHAR: char = '-';

/// Render a report as `[EXPECTED] kind: message` plus its stack frames
pub fn format(report: &ErrorReport) -> String {
    let tag = if report.expected() {
        "[EXPECTED]"
    } else {
        "[UNEXPECTED]"
    };

    let mut output = format!(
        "{tag} {}: {}",
        or_unknown(&single_line(report.kind())),
        single_line(report.message())
    );

    for frame in report.stack_frames() {
        output.push('\n');
        output.push_str(&format_frame(frame));
    }

    output
}

/// Render one frame as `  at function (file:line)`
pub fn format_frame(frame: &StackFrame) -> String {
    format!(
        "  at {} ({}:{})",
        or_unknown(&single_line(&frame.function)),
        or_unknown(&single_line(&frame.file)),
        frame.line
    )
}

/// Center `insert` inside a run of `ch`, `length` characters wide
///
/// One space of margin is kept on each side of the text, even when it is
/// empty. When the split is uneven the extra character goes to the right.
/// Text at least `length` characters long is returned unchanged; text one
/// character short keeps its margins and runs one past `length`.
pub fn line_separator(insert: &str, length: usize, ch: char) -> String {
    let insert_len = insert.chars().count();
    if insert_len >= length {
        return insert.to_string();
    }

    let remaining = length.saturating_sub(insert_len + 2);
    let left = remaining / 2;
    let right = remaining - left;
    format!(
        "{} {insert} {}",
        ch.to_string().repeat(left),
        ch.to_string().repeat(right)
    )
}

/// A plain run of `ch`
pub fn rule(length: usize, ch: char) -> String {
    ch.to_string().repeat(length)
}

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        UNKNOWN
    } else {
        value
    }
}

/// Collapse line breaks so multi-line text cannot break the one-line header
fn single_line(value: &str) -> String {
    if !value.contains(['\n', '\r']) {
        return value.to_string();
    }
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
