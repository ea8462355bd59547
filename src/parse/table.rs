//! Parsed table model: typed cells, rows, and the parser outcome wrapper.

#![allow(missing_docs)]

use std::fmt;

use super::tokenize::parse_number;

/// One typed cell.
///
/// Numbers keep the token they were parsed from so a view can show `0.00`
/// rather than a re-formatted `0`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number { value: f64, raw: String },
    Text(String),
}

impl CellValue {
    /// Empty text cell, used for absent optional fields.
    #[must_use]
    pub const fn empty() -> Self {
        Self::Text(String::new())
    }

    /// Numeric cell without a source token.
    #[must_use]
    pub fn number(value: f64) -> Self {
        Self::Number {
            value,
            raw: format_number(value),
        }
    }

    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Self::Number { .. })
    }

    /// The numeric value when this cell was coerced to a number.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number { value, .. } => Some(*value),
            Self::Text(_) => None,
        }
    }

    /// Display text.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Number { raw, .. } => raw,
            Self::Text(text) => text,
        }
    }

    /// Value used by numeric comparators: the number, a numeric-looking text,
    /// or 0.
    #[must_use]
    pub fn numeric_or_zero(&self) -> f64 {
        match self {
            Self::Number { value, .. } => *value,
            Self::Text(text) => parse_number(text).unwrap_or(0.0),
        }
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// A row, positionally aligned with its table's columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub values: Vec<CellValue>,
}

impl Row {
    #[must_use]
    pub const fn new(values: Vec<CellValue>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.values.get(index)
    }
}

/// Structured result of parsing one chunk.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl ParsedTable {
    /// Table with the given header and no rows. Duplicate names get a `#n`
    /// suffix so column names stay unique.
    #[must_use]
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in columns {
            let name = name.into();
            let mut candidate = name.clone();
            let mut n = 2;
            while unique.contains(&candidate) {
                candidate = format!("{name}#{n}");
                n += 1;
            }
            unique.push(candidate);
        }
        Self {
            columns: unique,
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    /// Exact-name column lookup.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell of `row` under the column called `name`.
    #[must_use]
    pub fn value<'a>(&self, row: &'a Row, name: &str) -> Option<&'a CellValue> {
        self.column_index(name).and_then(|i| row.get(i))
    }
}

/// Everything a parser learned about one chunk.
///
/// `table` is the result callers render. The remaining fields report what
/// was absorbed silently, so callers that care about data quality can tell
/// an empty sample apart from a truncated one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParseOutcome {
    pub table: ParsedTable,
    /// Header tokens after fragment merging, when a header was located.
    pub header: Option<Vec<String>>,
    /// Non-blank lines discarded for having too few tokens.
    pub dropped_lines: usize,
    pub header_found: bool,
}

impl ParseOutcome {
    /// Outcome for a chunk whose header could not be located.
    #[must_use]
    pub fn headerless() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn into_table(self) -> ParsedTable {
        self.table
    }
}
