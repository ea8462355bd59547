//! Elm-style state for one capture section.
//!
//! A section owns its raw chunks, its render options and, once a timestamp
//! is selected, the parsed table and the view built from it. Controls arrive
//! as [`SectionMsg`] values; side-effects are returned as [`SectionCmd`]
//! values from [`super::update::update`].
//!
//! The model performs no I/O.

use serde::Serialize;

use crate::parse::capture::{Capture, ChunkSet, TableFormat};
use crate::parse::table::{ParseOutcome, ParsedTable};
use crate::view::{RenderOptions, ViewModel};

/// Timestamp label that deselects every sample.
pub const ALL_TIMESTAMPS: &str = "all";

/// Row caps offered by the top-N control, smallest first; 0 is unlimited.
pub const TOP_N_PRESETS: [usize; 5] = [10, 25, 50, 100, 0];

// ──────────────────── state ────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionState {
    /// No timestamp selected, nothing displayed.
    Idle,
    /// A timestamp selected, its table cached and a view displayed.
    Rendered,
}

/// Data-quality summary of the most recent parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub timestamp: String,
    pub rows: usize,
    pub dropped_lines: usize,
    pub header_found: bool,
}

impl ParseStats {
    #[must_use]
    pub fn from_outcome(timestamp: &str, outcome: &ParseOutcome) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            rows: outcome.table.rows.len(),
            dropped_lines: outcome.dropped_lines,
            header_found: outcome.header_found,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SectionModel {
    /// Section label; also the controls key of its render options.
    pub name: String,
    pub format: TableFormat,
    pub chunks: ChunkSet,
    pub options: RenderOptions,
    pub selected: Option<String>,
    pub table: Option<ParsedTable>,
    pub view: Option<ViewModel>,
    pub last_parse: Option<ParseStats>,
    /// Chunk parses performed.
    pub parses: u64,
    /// Views built.
    pub renders: u64,
}

impl SectionModel {
    #[must_use]
    pub fn new(name: impl Into<String>, format: TableFormat, chunks: ChunkSet, options: RenderOptions) -> Self {
        let name = name.into();
        let options = RenderOptions {
            controls_key: name.clone(),
            ..options
        };
        Self {
            name,
            format,
            chunks,
            options,
            selected: None,
            table: None,
            view: None,
            last_parse: None,
            parses: 0,
            renders: 0,
        }
    }

    /// Section over every sample of `capture`, named after its tool.
    #[must_use]
    pub fn from_capture(capture: Capture, options: RenderOptions) -> Self {
        Self::new(capture.tool.name(), capture.format, capture.chunks, options)
    }

    #[must_use]
    pub const fn state(&self) -> SectionState {
        if self.selected.is_some() && self.view.is_some() {
            SectionState::Rendered
        } else {
            SectionState::Idle
        }
    }

    /// Sample timestamps in order.
    pub fn timestamps(&self) -> impl Iterator<Item = &str> {
        self.chunks.labels()
    }

    /// Timestamp after the selection; the first one when idle. Stays on the
    /// last timestamp.
    #[must_use]
    pub fn next_timestamp(&self) -> Option<String> {
        let Some(current) = self.selected.as_deref() else {
            return self.chunks.labels().next().map(str::to_string);
        };
        self.chunks
            .after(current)
            .map(str::to_string)
            .or_else(|| self.selected.clone())
    }

    /// Timestamp before the selection; the last one when idle. Stays on the
    /// first timestamp.
    #[must_use]
    pub fn prev_timestamp(&self) -> Option<String> {
        let Some(current) = self.selected.as_deref() else {
            return self.chunks.labels().next_back().map(str::to_string);
        };
        self.chunks
            .before(current)
            .map(str::to_string)
            .or_else(|| self.selected.clone())
    }
}

/// Next larger preset (unlimited is largest). Unchanged at the top.
#[must_use]
pub fn larger_top_n(current: usize) -> usize {
    TOP_N_PRESETS
        .into_iter()
        .find(|&preset| rank(preset) > rank(current))
        .unwrap_or(current)
}

/// Next smaller preset. Unchanged at the bottom.
#[must_use]
pub fn smaller_top_n(current: usize) -> usize {
    TOP_N_PRESETS
        .into_iter()
        .rev()
        .find(|&preset| rank(preset) < rank(current))
        .unwrap_or(current)
}

const fn rank(top_n: usize) -> usize {
    if top_n == 0 { usize::MAX } else { top_n }
}

// ──────────────────── messages ────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionMsg {
    /// Select a sample by timestamp; [`ALL_TIMESTAMPS`] returns to idle.
    SelectTimestamp(String),
    SelectNext,
    SelectPrev,
    SetTopN(usize),
    /// Step the top-N control through [`TOP_N_PRESETS`].
    TopNUp,
    TopNDown,
    SetSearch(Option<String>),
    /// Sort the displayed rows by a column index.
    SortColumn(usize),
}

// ──────────────────── commands ────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionCmd {
    /// No side-effect.
    None,
    /// Draw the current view.
    Present,
    /// Remove the displayed table.
    Clear,
    /// Report a finished chunk parse.
    RecordParse(ParseStats),
    /// Execute multiple commands in order.
    Batch(Vec<Self>),
}

// ──────────────────── tests ────────────────────
