//! Cross-sample top-consumer ranking for pidstat captures.
//!
//! Rows of every sample are grouped by command, since one program may run
//! under several PIDs over a capture. Per sample a command keeps the maximum
//! value of each metric across its PIDs. Commands are then ranked, one
//! independent list per metric, by the average of those per-sample maxima
//! over the samples they appeared in.

#![allow(missing_docs)]
#![allow(clippy::cast_precision_loss)]

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::core::errors::{PsnError, Result};
use crate::parse::capture::{Capture, Tool};
use crate::parse::table::ParsedTable;
use crate::view::resolve::command_column;

/// Default length of each ranking.
pub const DEFAULT_CONSUMERS: usize = 10;

// ──────────────────── profiles ────────────────────

/// Which pidstat report a capture holds, and so which metrics get ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumerProfile {
    /// `pidstat -u`.
    Cpu,
    /// `pidstat -d`.
    Io,
    /// `pidstat -r`.
    Memory,
}

impl ConsumerProfile {
    pub const ALL: [Self; 3] = [Self::Cpu, Self::Io, Self::Memory];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Io => "io",
            Self::Memory => "memory",
        }
    }

    /// Ranked columns, in report order.
    #[must_use]
    pub const fn metrics(self) -> &'static [&'static str] {
        match self {
            Self::Cpu => &["%usr", "%system", "%wait"],
            Self::Io => &["kB_rd/s", "kB_wr/s", "iodelay"],
            Self::Memory => &["%MEM", "RSS", "VSZ"],
        }
    }

    /// The first profile whose metrics all appear in `columns`.
    #[must_use]
    pub fn detect(columns: &[String]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|profile| profile.matches(columns))
    }

    fn matches(self, columns: &[String]) -> bool {
        self.metrics()
            .iter()
            .all(|metric| columns.iter().any(|c| c == metric))
    }
}

impl fmt::Display for ConsumerProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConsumerProfile {
    type Err = PsnError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PsnError::InvalidConfig {
                details: format!("unknown profile {s:?} (expected cpu, io or memory)"),
            })
    }
}

// ──────────────────── results ────────────────────

/// One ranked command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Consumer {
    pub command: String,
    /// Every PID the command ran under, sorted.
    pub pids: Vec<String>,
    /// Ranking value, rounded to two decimals.
    pub average: f64,
    /// Per-sample maxima aligned with [`TopConsumers::timestamps`]; 0 where
    /// the command was absent.
    pub values: Vec<f64>,
}

/// Ranking for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRanking {
    pub metric: String,
    pub consumers: Vec<Consumer>,
}

/// All rankings for one capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopConsumers {
    pub profile: ConsumerProfile,
    /// Samples that contributed rows, in chronological order.
    pub timestamps: Vec<String>,
    pub rankings: Vec<MetricRanking>,
}

impl TopConsumers {
    #[must_use]
    pub fn ranking(&self, metric: &str) -> Option<&MetricRanking> {
        self.rankings.iter().find(|r| r.metric == metric)
    }
}

// ──────────────────── accumulation ────────────────────

/// Everything seen for one command.
#[derive(Debug, Default)]
struct CommandSeries {
    pids: BTreeSet<String>,
    /// `per_sample[m]` maps a sample index to the maximum of metric `m`.
    per_sample: Vec<HashMap<usize, f64>>,
}

/// Column positions needed from each sample.
struct Columns {
    pid: Option<usize>,
    command: usize,
    metrics: Vec<usize>,
}

impl Columns {
    fn locate(table: &ParsedTable, profile: ConsumerProfile) -> Option<Self> {
        let metrics = profile
            .metrics()
            .iter()
            .map(|m| table.column_index(m))
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            pid: table.column_index("PID"),
            command: command_column(&table.columns)?,
            metrics,
        })
    }
}

/// Rank the commands of a pidstat `capture`.
///
/// `profile` is detected from the header when not given. Returns `None` for
/// captures of other tools and for headers lacking the profile's metrics.
/// Rows whose metric cells are not numbers are skipped. `top_n == 0` keeps
/// every command.
#[must_use]
pub fn top_consumers(
    capture: &Capture,
    profile: Option<ConsumerProfile>,
    top_n: usize,
) -> Option<TopConsumers> {
    if capture.tool != Tool::Pidstat {
        return None;
    }

    let mut profile = profile;
    let mut timestamps: Vec<String> = Vec::new();
    let mut order: Vec<String> = Vec::new();
    let mut series: HashMap<String, CommandSeries> = HashMap::new();

    for (label, chunk) in capture.chunks.iter() {
        let table = capture.format.parse(chunk).table;
        let chosen = match profile {
            Some(p) => p,
            None => {
                let detected = ConsumerProfile::detect(&table.columns)?;
                profile = Some(detected);
                detected
            }
        };
        let Some(columns) = Columns::locate(&table, chosen) else {
            continue;
        };

        let sample = timestamps.len();
        let mut contributed = false;
        for row in &table.rows {
            let Some(values) = columns
                .metrics
                .iter()
                .map(|&i| row.get(i).and_then(|cell| cell.as_number()))
                .collect::<Option<Vec<f64>>>()
            else {
                continue;
            };
            let command = row.get(columns.command).map_or("", |c| c.text()).to_string();
            let entry = series.entry(command.clone()).or_insert_with(|| {
                order.push(command);
                CommandSeries {
                    per_sample: vec![HashMap::new(); values.len()],
                    ..CommandSeries::default()
                }
            });
            if let Some(pid) = columns.pid.and_then(|i| row.get(i)) {
                entry.pids.insert(pid.text().to_string());
            }
            for (slot, value) in entry.per_sample.iter_mut().zip(values) {
                slot.entry(sample)
                    .and_modify(|max| *max = max.max(value))
                    .or_insert(value);
            }
            contributed = true;
        }
        if contributed {
            timestamps.push(label.to_string());
        }
    }

    let profile = profile?;
    let rankings = profile
        .metrics()
        .iter()
        .enumerate()
        .map(|(m, metric)| MetricRanking {
            metric: (*metric).to_string(),
            consumers: rank(&order, &series, m, timestamps.len(), top_n),
        })
        .collect();

    Some(TopConsumers {
        profile,
        timestamps,
        rankings,
    })
}

fn rank(
    order: &[String],
    series: &HashMap<String, CommandSeries>,
    metric: usize,
    samples: usize,
    top_n: usize,
) -> Vec<Consumer> {
    let mut consumers: Vec<Consumer> = order
        .iter()
        .filter_map(|command| {
            let data = series.get(command)?;
            let per_sample = data.per_sample.get(metric)?;
            let average = if per_sample.is_empty() {
                0.0
            } else {
                per_sample.values().sum::<f64>() / per_sample.len() as f64
            };
            Some(Consumer {
                command: command.clone(),
                pids: data.pids.iter().cloned().collect(),
                average,
                values: (0..samples)
                    .map(|i| per_sample.get(&i).copied().unwrap_or(0.0))
                    .collect(),
            })
        })
        .collect();

    // Ties break on command name for deterministic output.
    consumers.sort_by(|left, right| {
        right
            .average
            .partial_cmp(&left.average)
            .unwrap_or(Ordering::Equal)
            .then_with(|| left.command.cmp(&right.command))
    });
    if top_n > 0 {
        consumers.truncate(top_n);
    }
    for consumer in &mut consumers {
        consumer.average = round2(consumer.average);
    }
    consumers
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
