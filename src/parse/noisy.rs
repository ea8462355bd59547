//! Noisy-table parser: a process table buried under banner and summary lines
//! (top style).

use super::header::{is_header_line, is_preamble, normalize_header, starts_new_section};
use super::regular::split_row;
use super::table::{ParseOutcome, ParsedTable};
use super::tokenize::tokenize;

/// Locate the header inside `chunk` and parse the table under it.
///
/// Banner and summary lines before the header are skipped. A chunk without a
/// header produces an empty outcome rather than an error. Rows follow the
/// regular-schema rules and stop at the next banner or disk summary, so a
/// chunk holding two snapshots only yields the first.
#[must_use]
pub fn parse_noisy(chunk: &str) -> ParseOutcome {
    let mut lines = chunk.lines();

    let header = loop {
        let Some(line) = lines.next() else {
            return ParseOutcome::headerless();
        };
        if is_preamble(line) {
            continue;
        }
        if is_header_line(line) {
            break normalize_header(&tokenize(line));
        }
    };

    let mut table = ParsedTable::with_columns(header.iter().cloned());
    let width = table.columns.len();
    let mut dropped_lines = 0;
    for line in lines {
        if starts_new_section(line) {
            break;
        }
        let tokens = tokenize(line);
        if tokens.is_empty() {
            continue;
        }
        match split_row(width, &tokens) {
            Some(row) => table.rows.push(row),
            None => dropped_lines += 1,
        }
    }

    ParseOutcome {
        table,
        header: Some(header),
        dropped_lines,
        header_found: true,
    }
}
