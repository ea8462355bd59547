//! Header location, header fragment merging, and the banner/summary line
//! patterns that surround tables in top and iotop output.

use super::columns::{is_command_column, is_pid_token};

/// Disk throughput summary markers printed by iotop before each table.
const DISK_SUMMARY_MARKERS: [&str; 3] = ["Total DISK READ", "Actual DISK READ", "Current DISK READ"];

/// Prefixes of top's summary block.
const SUMMARY_PREFIXES: [&str; 6] = ["Tasks:", "Threads:", "%Cpu", "Cpu(s)", "Mem:", "Swap:"];

/// Memory unit prefixes used by top's `MiB Mem :` style lines.
const MEMORY_UNITS: [&str; 8] = ["KiB", "MiB", "GiB", "TiB", "KB", "MB", "GB", "TB"];

/// `top - 13:36:32 up 3 days, ...`
#[must_use]
pub fn is_tool_banner(line: &str) -> bool {
    line.trim_start().starts_with("top - ")
}

/// iotop's `Total DISK READ: ... | Total DISK WRITE: ...` and companions.
#[must_use]
pub fn is_disk_summary(line: &str) -> bool {
    DISK_SUMMARY_MARKERS.iter().any(|m| line.contains(m))
}

/// Task, CPU, memory and swap summary lines of top.
#[must_use]
pub fn is_summary_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    if SUMMARY_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
        return true;
    }
    let mut tokens = trimmed.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(unit), Some(kind)) => {
            MEMORY_UNITS.contains(&unit)
                && (kind.starts_with("Mem") || kind.starts_with("Swap"))
        }
        _ => false,
    }
}

/// Lines that never belong to a table and are skipped while looking for the
/// header.
#[must_use]
pub fn is_preamble(line: &str) -> bool {
    is_tool_banner(line) || is_disk_summary(line) || is_summary_line(line)
}

/// Lines that start another snapshot; a table ends where one appears.
#[must_use]
pub fn starts_new_section(line: &str) -> bool {
    is_tool_banner(line) || is_disk_summary(line)
}

/// A header line carries a PID/TID column and mentions COMMAND.
#[must_use]
pub fn is_header_line(line: &str) -> bool {
    line.split_whitespace().any(is_pid_token) && line.to_ascii_uppercase().contains("COMMAND")
}

/// Merge header fragments that the producing tool prints as two words:
/// `DISK READ` → `DISK_READ`, `DISK WRITE` → `DISK_WRITE`, `IO >` → `IO%`.
/// A fused `IO>` becomes `IO%` as well.
#[must_use]
pub fn normalize_header(tokens: &[&str]) -> Vec<String> {
    let mut columns = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        let next = tokens.get(i + 1).copied();
        let merged = match next {
            Some(n) if token.eq_ignore_ascii_case("DISK") && n.eq_ignore_ascii_case("READ") => {
                Some("DISK_READ")
            }
            Some(n) if token.eq_ignore_ascii_case("DISK") && n.eq_ignore_ascii_case("WRITE") => {
                Some("DISK_WRITE")
            }
            Some(">") if token.eq_ignore_ascii_case("IO") => Some("IO%"),
            _ => None,
        };
        if let Some(name) = merged {
            columns.push(name.to_string());
            i += 2;
        } else {
            if token.eq_ignore_ascii_case("IO>") {
                columns.push("IO%".to_string());
            } else {
                columns.push(token.to_string());
            }
            i += 1;
        }
    }
    columns
}

/// Leave exactly one `COMMAND`, as the last column; the data always carries
/// it there. A command column found earlier in the header is moved, not
/// duplicated.
pub fn ensure_command_column(columns: &mut Vec<String>) {
    let command = match columns.iter().position(|c| is_command_column(c)) {
        Some(index) => columns.remove(index),
        None => "COMMAND".to_string(),
    };
    columns.retain(|c| !is_command_column(c));
    columns.push(command);
}
