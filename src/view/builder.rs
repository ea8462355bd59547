//! View model builder.
//!
//! Every render runs the same fixed pipeline over a [`ParsedTable`]:
//! search filter on the command column, metric sort (descending), top-N
//! truncation, then per-cell annotation. The result replaces the previous
//! view wholesale. A later [`ViewModel::apply_sort_request`] reorders only
//! the rows that survived truncation.

#![allow(missing_docs)]

use serde::Serialize;

use crate::parse::columns::is_numeric_column;
use crate::parse::table::{CellValue, ParsedTable, Row};
use crate::parse::tokenize::parse_number;

use super::options::{HighlightLevel, RenderOptions};
use super::resolve::{Resolution, resolve};
use super::sort::{SortDirection, SortKeys, SortState, sort_rows};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewColumn {
    pub name: String,
    /// Comparator selection: numeric by name, or every non-blank cell is a number.
    pub numeric: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewCell {
    pub text: String,
    pub is_numeric: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    pub highlight: HighlightLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRow {
    pub cells: Vec<ViewCell>,
    /// Level of the highlight column cell, for whole-row styling.
    pub level: HighlightLevel,
}

/// Render-ready table.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ViewModel {
    pub columns: Vec<ViewColumn>,
    #[serde(rename = "rows")]
    pub visible_rows: Vec<ViewRow>,
    pub metric_index: Option<usize>,
    pub highlight_index: Option<usize>,
    pub sort: Option<SortState>,
    /// Rows in the parsed table.
    pub total_rows: usize,
    /// Rows left after the search filter, before truncation.
    pub matched_rows: usize,
}

impl ViewModel {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visible_rows.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Reorder the visible rows on `column`. Returns `false` (and leaves the
    /// view untouched) for an out-of-range column.
    pub fn apply_sort_request(&mut self, column: usize) -> bool {
        let Some(numeric) = self.columns.get(column).map(|c| c.numeric) else {
            return false;
        };
        let state = SortState::next(self.sort, column);
        sort_rows(&mut self.visible_rows, column, numeric, state.direction);
        self.sort = Some(state);
        true
    }
}

impl SortKeys for Row {
    fn numeric_key(&self, column: usize) -> f64 {
        self.get(column).map_or(0.0, CellValue::numeric_or_zero)
    }

    fn text_key(&self, column: usize) -> &str {
        self.get(column).map_or("", CellValue::text)
    }
}

impl SortKeys for ViewRow {
    fn numeric_key(&self, column: usize) -> f64 {
        self.cells.get(column).map_or(0.0, |cell| {
            cell.value
                .or_else(|| parse_number(&cell.text))
                .unwrap_or(0.0)
        })
    }

    fn text_key(&self, column: usize) -> &str {
        self.cells.get(column).map_or("", |cell| cell.text.as_str())
    }
}

/// Run the render pipeline.
#[must_use]
pub fn build_view(table: &ParsedTable, options: &RenderOptions) -> ViewModel {
    let total_rows = table.rows.len();
    let Some(resolution) = resolve(&table.columns, options) else {
        return ViewModel {
            total_rows,
            ..ViewModel::default()
        };
    };
    let columns = classify_columns(table);

    let mut rows: Vec<&Row> = match options.search_term() {
        Some(term) => {
            let needle = term.to_lowercase();
            table
                .rows
                .iter()
                .filter(|row| {
                    row.get(resolution.command)
                        .is_some_and(|cell| cell.text().to_lowercase().contains(&needle))
                })
                .collect()
        }
        None => table.rows.iter().collect(),
    };
    let matched_rows = rows.len();

    let sort = SortState::metric(resolution.metric);
    sort_rows(
        &mut rows,
        sort.column,
        columns[sort.column].numeric,
        SortDirection::Descending,
    );

    if options.top_n > 0 {
        rows.truncate(options.top_n);
    }

    let visible_rows = rows
        .into_iter()
        .map(|row| annotate(row, &resolution))
        .collect();

    ViewModel {
        columns,
        visible_rows,
        metric_index: Some(resolution.metric),
        highlight_index: Some(resolution.highlight),
        sort: Some(sort),
        total_rows,
        matched_rows,
    }
}

fn classify_columns(table: &ParsedTable) -> Vec<ViewColumn> {
    table
        .columns
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let mut cells = table
                .rows
                .iter()
                .filter_map(|row| row.get(index))
                .filter(|cell| !cell.is_blank())
                .peekable();
            let all_numbers = cells.peek().is_some() && cells.all(CellValue::is_number);
            ViewColumn {
                name: name.clone(),
                numeric: is_numeric_column(name) || all_numbers,
            }
        })
        .collect()
}

fn annotate(row: &Row, resolution: &Resolution) -> ViewRow {
    let mut level = HighlightLevel::None;
    let cells = row
        .values
        .iter()
        .enumerate()
        .map(|(index, cell)| {
            let value = cell.as_number();
            let highlight = match value {
                Some(v) if index == resolution.highlight => {
                    resolution.highlight_thresholds.classify(v)
                }
                _ => HighlightLevel::None,
            };
            if index == resolution.highlight {
                level = highlight;
            }
            ViewCell {
                text: cell.text().to_string(),
                is_numeric: cell.is_number(),
                value,
                highlight,
            }
        })
        .collect();
    ViewRow { cells, level }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::regular::parse_regular;
    use crate::view::options::Thresholds;
    use proptest::prelude::*;

    const HEADER: &str = "PID %CPU %MEM COMMAND";

    fn table(chunk: &str) -> ParsedTable {
        parse_regular(HEADER, chunk).into_table()
    }

    fn commands(view: &ViewModel) -> Vec<&str> {
        view.visible_rows
            .iter()
            .map(|row| row.cells[3].text.as_str())
            .collect()
    }

    fn sample() -> ParsedTable {
        table(
            "1 2.5 1.1 sleep\n\
             2 10.0 0.5 my program\n\
             3 85.0 3.0 Firefox web\n\
             4 61.0 9.0 firewalld\n\
             5 - 0.2 kworker/0:1",
        )
    }

    #[test]
    fn sorts_by_metric_descending_by_default() {
        let view = build_view(&sample(), &RenderOptions::default());
        assert_eq!(
            commands(&view),
            vec!["Firefox web", "firewalld", "my program", "sleep", "kworker/0:1"]
        );
        assert_eq!(view.metric_index, Some(1));
        assert_eq!(view.sort, Some(SortState::metric(1)));
        assert_eq!((view.total_rows, view.matched_rows), (5, 5));
    }

    #[test]
    fn unparseable_metric_cells_sort_as_zero() {
        let view = build_view(&sample(), &RenderOptions::default());
        let last = view.visible_rows.last().unwrap();
        assert_eq!(last.cells[1].text, "-");
        assert!(!last.cells[1].is_numeric);
    }

    #[test]
    fn search_is_case_insensitive_on_command_column() {
        let options = RenderOptions {
            search: Some("FIRE".into()),
            ..RenderOptions::default()
        };
        let view = build_view(&sample(), &options);
        assert_eq!(commands(&view), vec!["Firefox web", "firewalld"]);
        assert_eq!(view.matched_rows, 2);
        assert_eq!(view.total_rows, 5);
    }

    #[test]
    fn search_ignores_other_columns() {
        let options = RenderOptions {
            search: Some("85".into()),
            ..RenderOptions::default()
        };
        assert!(build_view(&sample(), &options).is_empty());
    }

    #[test]
    fn empty_search_keeps_rows_in_metric_order() {
        let options = RenderOptions {
            search: Some(String::new()),
            ..RenderOptions::default()
        };
        let view = build_view(&sample(), &options);
        assert_eq!(view.visible_rows.len(), 5);
        assert_eq!(view.matched_rows, 5);
    }

    #[test]
    fn truncates_after_sorting() {
        let options = RenderOptions {
            top_n: 2,
            ..RenderOptions::default()
        };
        let view = build_view(&sample(), &options);
        assert_eq!(commands(&view), vec!["Firefox web", "firewalld"]);
        assert_eq!(view.matched_rows, 5);
    }

    #[test]
    fn highlight_levels_on_metric_cells() {
        let view = build_view(&sample(), &RenderOptions::default());
        let levels: Vec<_> = view.visible_rows.iter().map(|r| r.level).collect();
        assert_eq!(
            levels,
            vec![
                HighlightLevel::Crit,
                HighlightLevel::Warn,
                HighlightLevel::None,
                HighlightLevel::None,
                HighlightLevel::None,
            ]
        );
        let first = &view.visible_rows[0];
        assert_eq!(first.cells[1].highlight, HighlightLevel::Crit);
        assert_eq!(first.cells[2].highlight, HighlightLevel::None);
    }

    #[test]
    fn highlight_threshold_boundaries() {
        let t = table("1 80 0 a\n2 60 0 b\n3 59.9 0 c");
        let view = build_view(&t, &RenderOptions::default());
        let levels: Vec<_> = view.visible_rows.iter().map(|r| r.level).collect();
        assert_eq!(
            levels,
            vec![HighlightLevel::Crit, HighlightLevel::Warn, HighlightLevel::None]
        );
    }

    #[test]
    fn highlight_column_override_uses_its_own_thresholds() {
        let options = RenderOptions {
            highlight_column: Some("%MEM".into()),
            highlight_thresholds: Some(Thresholds::new(3.0, 9.0)),
            ..RenderOptions::default()
        };
        let view = build_view(&sample(), &options);
        assert_eq!(view.highlight_index, Some(2));
        // Still sorted by %CPU.
        assert_eq!(view.visible_rows[0].cells[3].text, "Firefox web");
        assert_eq!(view.visible_rows[0].level, HighlightLevel::Warn);
        assert_eq!(view.visible_rows[1].level, HighlightLevel::Crit);
        assert_eq!(view.visible_rows[0].cells[1].highlight, HighlightLevel::None);
    }

    #[test]
    fn sort_request_reorders_visible_rows_only() {
        let options = RenderOptions {
            top_n: 3,
            ..RenderOptions::default()
        };
        let mut view = build_view(&sample(), &options);
        assert!(view.apply_sort_request(0));
        let pids: Vec<_> = view.visible_rows.iter().map(|r| r.cells[0].text.clone()).collect();
        assert_eq!(pids, vec!["2", "3", "4"]);
        assert_eq!(view.sort.unwrap().direction, SortDirection::Ascending);

        assert!(view.apply_sort_request(0));
        let pids: Vec<_> = view.visible_rows.iter().map(|r| r.cells[0].text.clone()).collect();
        assert_eq!(pids, vec!["4", "3", "2"]);
        assert!(!view.apply_sort_request(9));
    }

    #[test]
    fn text_column_sorts_lexicographically() {
        let mut view = build_view(&sample(), &RenderOptions::default());
        view.apply_sort_request(3);
        assert_eq!(commands(&view)[0], "Firefox web");
        assert_eq!(commands(&view)[4], "sleep");
    }

    #[test]
    fn all_number_columns_sort_numerically() {
        let t = parse_regular("SIZE NAME", "9 a\n10 b\n100 c").into_table();
        let mut view = build_view(
            &t,
            &RenderOptions {
                metric: "NAME".into(),
                ..RenderOptions::default()
            },
        );
        assert!(view.columns[0].numeric);
        view.apply_sort_request(0);
        let sizes: Vec<_> = view.visible_rows.iter().map(|r| r.cells[0].text.clone()).collect();
        assert_eq!(sizes, vec!["9", "10", "100"]);
    }

    #[test]
    fn one_text_cell_keeps_column_lexicographic() {
        let t = parse_regular("SIZE NAME", "9 a\n10 b\nn/a c").into_table();
        let mut view = build_view(
            &t,
            &RenderOptions {
                metric: "NAME".into(),
                ..RenderOptions::default()
            },
        );
        assert!(!view.columns[0].numeric);
        view.apply_sort_request(0);
        let sizes: Vec<_> = view.visible_rows.iter().map(|r| r.cells[0].text.clone()).collect();
        assert_eq!(sizes, vec!["10", "9", "n/a"]);
    }

    #[test]
    fn empty_table_builds_empty_view() {
        let view = build_view(&ParsedTable::default(), &RenderOptions::default());
        assert!(view.is_empty());
        assert!(view.columns.is_empty());
        assert_eq!(view.metric_index, None);
        assert_eq!(view.sort, None);
    }

    #[test]
    fn serializes_rows_under_rows_key() {
        let view = build_view(&table("1 90 1 x"), &RenderOptions::default());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["rows"][0]["level"], "crit");
        assert_eq!(json["sort"]["direction"], "descending");
        assert_eq!(json["rows"][0]["cells"][3]["is_numeric"], false);
        assert!(json["rows"][0]["cells"][3].get("value").is_none());
    }

    // ──────────────────── properties ────────────────────

    fn arb_table() -> impl Strategy<Value = ParsedTable> {
        prop::collection::vec((0u32..1000, prop::option::of(0.0f64..100.0), "[a-z]{1,6}"), 0..40)
            .prop_map(|rows| {
                let chunk = rows
                    .iter()
                    .map(|(pid, cpu, cmd)| {
                        let cpu = cpu.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"));
                        format!("{pid} {cpu} 0.0 {cmd}")
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                table(&chunk)
            })
    }

    fn key(row: &ViewRow, column: usize) -> f64 {
        row.numeric_key(column)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn visible_rows_respect_top_n(t in arb_table(), top_n in 0usize..50) {
            let options = RenderOptions { top_n, ..RenderOptions::default() };
            let view = build_view(&t, &options);
            let expected = if top_n == 0 { view.matched_rows } else { top_n.min(view.matched_rows) };
            prop_assert_eq!(view.visible_rows.len(), expected);
            prop_assert_eq!(view.matched_rows, t.rows.len());
        }

        #[test]
        fn default_render_is_descending_on_metric(t in arb_table()) {
            let view = build_view(&t, &RenderOptions { top_n: 0, ..RenderOptions::default() });
            for pair in view.visible_rows.windows(2) {
                prop_assert!(key(&pair[0], 1) >= key(&pair[1], 1));
            }
        }

        #[test]
        fn sort_requests_are_monotonic(t in arb_table(), column in 0usize..3, clicks in 1usize..4) {
            let mut view = build_view(&t, &RenderOptions::default());
            prop_assume!(!view.columns.is_empty());
            for _ in 0..clicks {
                view.apply_sort_request(column);
            }
            let direction = view.sort.map(|s| s.direction);
            for pair in view.visible_rows.windows(2) {
                let (a, b) = (key(&pair[0], column), key(&pair[1], column));
                match direction {
                    Some(SortDirection::Ascending) => prop_assert!(a <= b),
                    Some(SortDirection::Descending) => prop_assert!(a >= b),
                    None => prop_assert!(false, "sort state missing"),
                }
            }
        }
    }
}
