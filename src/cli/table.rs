//! Plain-text table layout for a [`ViewModel`], plus `colored` output.
//!
//! Layout is computed once as uncolored, padded strings so the same rows can
//! be painted by `colored` (one-shot output) or by `crossterm` (browser).

#![allow(missing_docs)]

use colored::Colorize;

use crate::view::{HighlightLevel, ViewModel};

const COLUMN_GAP: &str = "  ";

/// Padded header and rows, ready to paint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub widths: Vec<usize>,
    pub header: String,
    pub rows: Vec<LayoutRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutRow {
    pub text: String,
    pub level: HighlightLevel,
}

/// Header label with the sort arrow on the sorted column.
#[must_use]
pub fn header_label(view: &ViewModel, index: usize) -> String {
    let name = view.columns.get(index).map_or("", |c| c.name.as_str());
    match view.sort {
        Some(sort) if sort.column == index => format!("{name}{}", sort.direction.arrow()),
        _ => name.to_string(),
    }
}

/// Lay out `view`. Numeric columns are right-aligned; the last column is
/// never padded so long commands do not leave trailing blanks.
#[must_use]
pub fn layout(view: &ViewModel) -> TableLayout {
    let labels: Vec<String> = (0..view.columns.len())
        .map(|i| header_label(view, i))
        .collect();
    let mut widths: Vec<usize> = labels.iter().map(|l| l.chars().count()).collect();
    for row in &view.visible_rows {
        for (i, cell) in row.cells.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.text.chars().count());
            }
        }
    }

    let right_aligned: Vec<bool> = view.columns.iter().map(|c| c.numeric).collect();
    let header = join_padded(labels.iter().map(String::as_str), &widths, &right_aligned);
    let rows = view
        .visible_rows
        .iter()
        .map(|row| LayoutRow {
            text: join_padded(row.cells.iter().map(|c| c.text.as_str()), &widths, &right_aligned),
            level: row.level,
        })
        .collect();

    TableLayout {
        widths,
        header,
        rows,
    }
}

fn join_padded<'a>(
    cells: impl Iterator<Item = &'a str>,
    widths: &[usize],
    right_aligned: &[bool],
) -> String {
    let last = widths.len().saturating_sub(1);
    let parts: Vec<String> = cells
        .enumerate()
        .map(|(i, text)| {
            let width = widths.get(i).copied().unwrap_or(0);
            if right_aligned.get(i).copied().unwrap_or(false) {
                format!("{text:>width$}")
            } else if i == last {
                text.to_string()
            } else {
                format!("{text:<width$}")
            }
        })
        .collect();
    parts.join(COLUMN_GAP)
}

/// One-line description of what the table shows.
#[must_use]
pub fn summary_line(section: &str, timestamp: &str, view: &ViewModel) -> String {
    let mut line = format!(
        "{section} @ {timestamp}: {} of {} rows",
        view.visible_rows.len(),
        view.total_rows
    );
    if view.matched_rows != view.total_rows {
        line.push_str(&format!(" ({} matched)", view.matched_rows));
    }
    if let Some(sort) = view.sort
        && let Some(column) = view.columns.get(sort.column)
    {
        line.push_str(&format!(", sorted by {}{}", column.name, sort.direction.arrow()));
    }
    line
}

/// Render `view` with `colored`: crit rows red, warn rows yellow.
#[must_use]
pub fn render_colored(view: &ViewModel) -> String {
    let table = layout(view);
    let mut out = String::new();
    out.push_str(&table.header.bold().to_string());
    out.push('\n');
    for row in &table.rows {
        let painted = match row.level {
            HighlightLevel::Crit => row.text.red().bold().to_string(),
            HighlightLevel::Warn => row.text.yellow().to_string(),
            HighlightLevel::None => row.text.clone(),
        };
        out.push_str(&painted);
        out.push('\n');
    }
    out
}
