//! Regular-schema parser: a known header and rows whose last column is free
//! text (pidstat style).

use super::table::{CellValue, ParseOutcome, ParsedTable, Row};
use super::tokenize::{coerce, tokenize};

/// Parse `chunk` against the whitespace-separated `header`.
///
/// With `k` header columns, each non-blank line needs at least `k` tokens.
/// The first `k - 1` tokens are coerced; everything after them is joined
/// with single spaces into the last column and kept as text. Short lines are
/// dropped and counted.
#[must_use]
pub fn parse_regular(header: &str, chunk: &str) -> ParseOutcome {
    let columns: Vec<&str> = tokenize(header);
    if columns.is_empty() {
        return ParseOutcome::headerless();
    }

    let mut table = ParsedTable::with_columns(columns.iter().copied());
    let mut dropped_lines = 0;
    for line in chunk.lines() {
        let tokens = tokenize(line);
        if tokens.is_empty() {
            continue;
        }
        match split_row(columns.len(), &tokens) {
            Some(row) => table.rows.push(row),
            None => dropped_lines += 1,
        }
    }

    ParseOutcome {
        header: Some(table.columns.clone()),
        table,
        dropped_lines,
        header_found: true,
    }
}

/// Build a `width`-column row from `tokens`, or `None` when the line is too
/// short.
pub(crate) fn split_row(width: usize, tokens: &[&str]) -> Option<Row> {
    if width == 0 || tokens.len() < width {
        return None;
    }
    let (fixed, rest) = tokens.split_at(width - 1);
    let mut values: Vec<CellValue> = fixed.iter().map(|t| coerce(t)).collect();
    values.push(CellValue::Text(rest.join(" ")));
    Some(Row::new(values))
}
