//! Render options: metric, thresholds, highlight overrides, top-N and search.

use serde::{Deserialize, Serialize};

/// Default metric column.
pub const DEFAULT_METRIC: &str = "%CPU";

/// Default row cap.
pub const DEFAULT_TOP_N: usize = 25;

/// Three-valued highlight classification of a numeric cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightLevel {
    #[default]
    None,
    Warn,
    Crit,
}

impl HighlightLevel {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Warn => "warn",
            Self::Crit => "crit",
        }
    }
}

/// Warn/crit boundaries. Both are inclusive lower bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub warn: f64,
    pub crit: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warn: 60.0,
            crit: 80.0,
        }
    }
}

impl Thresholds {
    #[must_use]
    pub const fn new(warn: f64, crit: f64) -> Self {
        Self { warn, crit }
    }

    /// `Crit` at or above `crit`, `Warn` at or above `warn`, else `None`.
    #[must_use]
    pub fn classify(&self, value: f64) -> HighlightLevel {
        if value >= self.crit {
            HighlightLevel::Crit
        } else if value >= self.warn {
            HighlightLevel::Warn
        } else {
            HighlightLevel::None
        }
    }
}

/// Everything a render pass needs besides the table itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Preferred sort/highlight column.
    pub metric: String,
    pub thresholds: Thresholds,
    /// Highlight a different column than the metric.
    pub highlight_column: Option<String>,
    /// Thresholds for the highlight column, when they differ from `thresholds`.
    pub highlight_thresholds: Option<Thresholds>,
    /// Row cap after filtering and sorting; 0 shows every row.
    pub top_n: usize,
    /// Case-insensitive command substring filter.
    pub search: Option<String>,
    /// Identifies the control group (section) these options belong to.
    pub controls_key: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            metric: DEFAULT_METRIC.to_string(),
            thresholds: Thresholds::default(),
            highlight_column: None,
            highlight_thresholds: None,
            top_n: DEFAULT_TOP_N,
            search: None,
            controls_key: String::new(),
        }
    }
}

impl RenderOptions {
    /// The search term, matched as given. Only the empty string disables
    /// filtering.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|term| !term.is_empty())
    }

    /// Thresholds applied to the highlight column.
    #[must_use]
    pub fn effective_highlight_thresholds(&self) -> Thresholds {
        self.highlight_thresholds.unwrap_or(self.thresholds)
    }
}
