//! Table → view model: render options, column resolution, sorting, and the
//! filter/sort/truncate/annotate pipeline.

pub mod builder;
pub mod options;
pub mod resolve;
pub mod sort;

pub use builder::{ViewCell, ViewColumn, ViewModel, ViewRow, build_view};
pub use options::{DEFAULT_METRIC, DEFAULT_TOP_N, HighlightLevel, RenderOptions, Thresholds};
pub use resolve::{Resolution, command_column, resolve, resolve_highlight, resolve_metric};
pub use sort::{SortDirection, SortState};
