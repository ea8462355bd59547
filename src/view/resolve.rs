//! Metric, highlight and command column resolution with fallbacks.
//!
//! A requested column that the parsed table lacks is never an error: the
//! metric falls back through CPU%, MEM%, disk read rate, disk write rate,
//! the last numeric column before the command, and finally the first column.

use crate::parse::columns::{is_command_column, is_numeric_column};

use super::options::{RenderOptions, Thresholds};

/// Fallback predicates, in priority order.
const METRIC_FALLBACKS: [fn(&str) -> bool; 4] = [
    is_cpu_percent,
    is_memory_percent,
    is_disk_read_rate,
    is_disk_write_rate,
];

fn is_cpu_percent(name: &str) -> bool {
    name.eq_ignore_ascii_case("%CPU")
}

fn is_memory_percent(name: &str) -> bool {
    name.eq_ignore_ascii_case("%MEM")
}

fn is_disk_read_rate(name: &str) -> bool {
    name.eq_ignore_ascii_case("DISK_READ") || name.eq_ignore_ascii_case("kB_rd/s")
}

fn is_disk_write_rate(name: &str) -> bool {
    name.eq_ignore_ascii_case("DISK_WRITE") || name.eq_ignore_ascii_case("kB_wr/s")
}

/// Exact match first, then a case-insensitive one.
#[must_use]
pub fn find_column(columns: &[String], name: &str) -> Option<usize> {
    columns
        .iter()
        .position(|c| c == name)
        .or_else(|| columns.iter().position(|c| c.eq_ignore_ascii_case(name)))
}

/// Resolve the metric column. `None` only for a table without columns.
#[must_use]
pub fn resolve_metric(columns: &[String], requested: &str) -> Option<usize> {
    if columns.is_empty() {
        return None;
    }
    if let Some(index) = find_column(columns, requested) {
        return Some(index);
    }
    for matches in METRIC_FALLBACKS {
        if let Some(index) = columns.iter().position(|c| matches(c)) {
            return Some(index);
        }
    }
    // Last numeric column, never the trailing command column.
    let before_command = columns.len() - 1;
    (0..before_command)
        .rev()
        .find(|&i| is_numeric_column(&columns[i]))
        .or(Some(0))
}

/// Resolve the highlight column: the override when present in the table,
/// otherwise the metric column.
#[must_use]
pub fn resolve_highlight(columns: &[String], requested: Option<&str>, metric: usize) -> usize {
    requested
        .and_then(|name| find_column(columns, name))
        .unwrap_or(metric)
}

/// Column searched by the text filter: the first one named `COMMAND`
/// (any case), else the last column.
#[must_use]
pub fn command_column(columns: &[String]) -> Option<usize> {
    columns
        .iter()
        .position(|c| is_command_column(c))
        .or_else(|| columns.len().checked_sub(1))
}

/// Fully resolved column roles for one render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub metric: usize,
    pub highlight: usize,
    pub highlight_thresholds: Thresholds,
    pub command: usize,
}

/// Resolve every column role for `options` against `columns`.
#[must_use]
pub fn resolve(columns: &[String], options: &RenderOptions) -> Option<Resolution> {
    let metric = resolve_metric(columns, &options.metric)?;
    let highlight = resolve_highlight(columns, options.highlight_column.as_deref(), metric);
    let command = command_column(columns)?;
    Some(Resolution {
        metric,
        highlight,
        highlight_thresholds: options.effective_highlight_thresholds(),
        command,
    })
}
