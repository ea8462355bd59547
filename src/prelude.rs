//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use procsnap::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{PsnError, Result};

// Parsing
pub use crate::parse::{
    Capture, CellValue, ChunkSet, ParseOutcome, ParsedTable, Row, TableFormat, Tool, coerce,
    is_numeric_column, parse_noisy, parse_regular, parse_variable, tokenize,
};

// View
pub use crate::view::{
    HighlightLevel, RenderOptions, SortDirection, SortState, Thresholds, ViewModel, build_view,
};

// Analysis
pub use crate::analysis::{ConsumerProfile, TopConsumers, top_consumers};

// Section controller
pub use crate::section::{SectionCmd, SectionModel, SectionMsg, SectionState, update};
