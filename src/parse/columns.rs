//! Column-name heuristics.

/// Exact (case-insensitive) names of columns that always hold numbers.
const NUMERIC_NAMES: [&str; 6] = ["PID", "UID", "CPU", "VSZ", "RSS", "prio"];

/// Case-insensitive prefixes of numeric column names.
const NUMERIC_PREFIXES: [&str; 2] = ["TIME", "kB"];

/// Whether a column name denotes a numeric metric.
///
/// Drives display styling and sort comparator selection only; parsing never
/// consults it.
#[must_use]
pub fn is_numeric_column(name: &str) -> bool {
    if name.contains('%') {
        return true;
    }
    if NUMERIC_NAMES.iter().any(|n| n.eq_ignore_ascii_case(name)) {
        return true;
    }
    NUMERIC_PREFIXES.iter().any(|prefix| {
        name.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

/// Whether a column holds the free-text command line.
#[must_use]
pub fn is_command_column(name: &str) -> bool {
    name.eq_ignore_ascii_case("COMMAND")
}

/// Whether a header token names a process or thread id column.
#[must_use]
pub fn is_pid_token(token: &str) -> bool {
    token.eq_ignore_ascii_case("PID") || token.eq_ignore_ascii_case("TID")
}
