//! Sort state and comparators.
//!
//! Numeric columns compare with `f64::total_cmp`, reading unparseable cells
//! as 0. Other columns compare lexicographically. Sorting is stable, so rows
//! with equal keys keep their input order.

use std::cmp::Ordering;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    #[must_use]
    pub const fn arrow(self) -> &'static str {
        match self {
            Self::Ascending => "▲",
            Self::Descending => "▼",
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// Column and direction of the current view's ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SortState {
    pub column: usize,
    pub direction: SortDirection,
}

impl SortState {
    /// State every render starts from: the metric column, descending.
    #[must_use]
    pub const fn metric(column: usize) -> Self {
        Self {
            column,
            direction: SortDirection::Descending,
        }
    }

    /// State after a sort request on `column`: the same column toggles,
    /// any other column starts ascending.
    #[must_use]
    pub const fn next(current: Option<Self>, column: usize) -> Self {
        match current {
            Some(state) if state.column == column => Self {
                column,
                direction: state.direction.toggled(),
            },
            _ => Self {
                column,
                direction: SortDirection::Ascending,
            },
        }
    }
}

/// Access to a row's sort keys by column index.
pub trait SortKeys {
    /// Numeric key; 0 for missing or unparseable cells.
    fn numeric_key(&self, column: usize) -> f64;
    /// Text key; empty for missing cells.
    fn text_key(&self, column: usize) -> &str;
}

impl<T: SortKeys + ?Sized> SortKeys for &T {
    fn numeric_key(&self, column: usize) -> f64 {
        (**self).numeric_key(column)
    }

    fn text_key(&self, column: usize) -> &str {
        (**self).text_key(column)
    }
}

/// Stable in-place sort of `rows` on `column`.
pub fn sort_rows<R: SortKeys>(rows: &mut [R], column: usize, numeric: bool, direction: SortDirection) {
    if numeric {
        rows.sort_by(|a, b| {
            direction.apply(a.numeric_key(column).total_cmp(&b.numeric_key(column)))
        });
    } else {
        rows.sort_by(|a, b| direction.apply(a.text_key(column).cmp(b.text_key(column))));
    }
}
