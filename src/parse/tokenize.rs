//! Whitespace tokenizer and token → cell coercion shared by every parser.

use chrono::NaiveTime;

use super::table::CellValue;

/// Split a line into whitespace-delimited tokens.
///
/// Leading/trailing whitespace is ignored and runs of whitespace collapse, so a
/// blank line yields no tokens.
#[must_use]
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Parse a token as a finite number.
#[must_use]
pub fn parse_number(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Classify a token: `Number` when it is a finite numeric literal, `Text`
/// otherwise. Never fails.
#[must_use]
pub fn coerce(token: &str) -> CellValue {
    parse_number(token).map_or_else(
        || CellValue::Text(token.to_owned()),
        |value| CellValue::Number {
            value,
            raw: token.to_owned(),
        },
    )
}

/// Whether a token is a wall-clock sample time in `HH:MM:SS` form.
#[must_use]
pub fn is_time_of_day(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() == 8
        && bytes[2] == b':'
        && bytes[5] == b':'
        && NaiveTime::parse_from_str(token, "%H:%M:%S").is_ok()
}
