//! Fixed/variable-field parser for iotop rows.
//!
//! iotop rows cannot be split positionally: the sample time is only present
//! with `-t`, SWAPIN may be a percentage or an `?unavailable?` marker, and IO
//! disappears entirely on kernels without delay accounting. Rows are instead
//! read by walking [`IOTOP_GRAMMAR`], an ordered list of field descriptors
//! each with its own consumption rule.

use super::header::{ensure_command_column, is_disk_summary, is_header_line, normalize_header};
use super::table::{CellValue, ParseOutcome, ParsedTable, Row};
use super::tokenize::{coerce, is_time_of_day, parse_number, tokenize};

/// Rows with fewer tokens than this are malformed.
pub const MIN_ROW_TOKENS: usize = 6;

/// How a field consumes tokens from the row cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Present only when the next token is an `HH:MM:SS` time; otherwise
    /// empty and nothing is consumed.
    OptionalTime,
    /// Always consumes one token, coerced.
    Mandatory,
    /// Consumes a value and a unit token. The value is a float (0 when
    /// unparseable); the unit is discarded.
    RateWithUnit,
    /// Consumes one token. A bare `%` reads as 0, a number swallows a
    /// trailing `%`, anything else is kept as text.
    Swapin,
    /// Present only when the next token is numeric; swallows a trailing
    /// `%`. Otherwise empty and nothing is consumed.
    OptionalPercent,
    /// Every remaining token joined with single spaces.
    Rest,
}

/// One output column and the rule that fills it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub column: &'static str,
    pub rule: FieldRule,
}

/// iotop row layout, in output column order.
pub const IOTOP_GRAMMAR: [FieldSpec; 9] = [
    FieldSpec { column: "TIME", rule: FieldRule::OptionalTime },
    FieldSpec { column: "TID", rule: FieldRule::Mandatory },
    FieldSpec { column: "PRIO", rule: FieldRule::Mandatory },
    FieldSpec { column: "USER", rule: FieldRule::Mandatory },
    FieldSpec { column: "DISK_READ", rule: FieldRule::RateWithUnit },
    FieldSpec { column: "DISK_WRITE", rule: FieldRule::RateWithUnit },
    FieldSpec { column: "SWAPIN", rule: FieldRule::Swapin },
    FieldSpec { column: "IO", rule: FieldRule::OptionalPercent },
    FieldSpec { column: "COMMAND", rule: FieldRule::Rest },
];

/// Token cursor over one row.
#[derive(Debug)]
struct Cursor<'a> {
    tokens: &'a [&'a str],
    pos: usize,
}

impl<'a> Cursor<'a> {
    const fn new(tokens: &'a [&'a str]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn take(&mut self) -> Option<&'a str> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    fn take_if(&mut self, accept: impl FnOnce(&str) -> bool) -> Option<&'a str> {
        match self.peek() {
            Some(token) if accept(token) => self.take(),
            _ => None,
        }
    }

    fn rest(&mut self) -> &'a [&'a str] {
        let rest = self.tokens.get(self.pos..).unwrap_or_default();
        self.pos = self.tokens.len();
        rest
    }
}

impl FieldRule {
    fn read(self, cursor: &mut Cursor<'_>) -> CellValue {
        match self {
            Self::OptionalTime => cursor
                .take_if(is_time_of_day)
                .map_or_else(CellValue::empty, |t| CellValue::Text(t.to_owned())),
            Self::Mandatory => cursor.take().map_or_else(CellValue::empty, coerce),
            Self::RateWithUnit => {
                let value = cursor.take().map_or_else(
                    || CellValue::number(0.0),
                    |t| match parse_number(t) {
                        Some(value) => CellValue::Number {
                            value,
                            raw: t.to_owned(),
                        },
                        None => CellValue::number(0.0),
                    },
                );
                let _unit = cursor.take();
                value
            }
            Self::Swapin => match cursor.take() {
                None => CellValue::empty(),
                Some("%") => CellValue::number(0.0),
                Some(token) => match parse_number(token) {
                    Some(value) => {
                        cursor.take_if(|t| t == "%");
                        CellValue::Number {
                            value,
                            raw: token.to_owned(),
                        }
                    }
                    None => CellValue::Text(token.to_owned()),
                },
            },
            Self::OptionalPercent => match cursor.take_if(|t| parse_number(t).is_some()) {
                Some(token) => {
                    cursor.take_if(|t| t == "%");
                    coerce(token)
                }
                None => CellValue::empty(),
            },
            Self::Rest => CellValue::Text(cursor.rest().join(" ")),
        }
    }
}

/// Read one row with `grammar`. Returns `None` for malformed (short) lines.
#[must_use]
pub fn parse_row(grammar: &[FieldSpec], tokens: &[&str]) -> Option<Row> {
    if tokens.len() < MIN_ROW_TOKENS {
        return None;
    }
    let mut cursor = Cursor::new(tokens);
    let values = grammar.iter().map(|field| field.rule.read(&mut cursor)).collect();
    Some(Row::new(values))
}

/// Parse an iotop chunk.
///
/// The header is the first line with a PID/TID token and `COMMAND`; disk
/// summaries before it are skipped and the next one after it ends the
/// table. Output columns always follow [`IOTOP_GRAMMAR`]; the normalized
/// header (with `COMMAND` appended when the tool omitted it) is reported in
/// [`ParseOutcome::header`].
#[must_use]
pub fn parse_variable(chunk: &str) -> ParseOutcome {
    let mut lines = chunk.lines();

    let header = loop {
        let Some(line) = lines.next() else {
            return ParseOutcome::headerless();
        };
        if is_disk_summary(line) {
            continue;
        }
        if is_header_line(line) {
            let mut header = normalize_header(&tokenize(line));
            ensure_command_column(&mut header);
            break header;
        }
    };

    let mut table = ParsedTable::with_columns(IOTOP_GRAMMAR.iter().map(|f| f.column));
    let mut dropped_lines = 0;
    for line in lines {
        if is_disk_summary(line) {
            break;
        }
        // iotop reprints the header; it is not a row.
        if is_header_line(line) {
            continue;
        }
        let tokens = tokenize(line);
        if tokens.is_empty() {
            continue;
        }
        match parse_row(&IOTOP_GRAMMAR, &tokens) {
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
