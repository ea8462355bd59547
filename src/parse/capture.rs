//! Whole-file intake: detect which tool produced a capture and split it into
//! per-sample chunks keyed by their timestamp label.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::ops::Bound;
use std::path::Path;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use super::header::{is_disk_summary, is_header_line};
use super::noisy::parse_noisy;
use super::regular::parse_regular;
use super::table::ParseOutcome;
use super::tokenize::{is_time_of_day, tokenize};
use super::variable::parse_variable;
use crate::core::errors::{PsnError, Result};

// ──────────────────── sample labels ────────────────────

/// Seconds since midnight for a clock label (`13:36:32` or `01:36:32 PM`).
fn clock_seconds(label: &str) -> Option<u32> {
    NaiveTime::parse_from_str(label, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(label, "%I:%M:%S %p"))
        .ok()
        .map(|time| time.num_seconds_from_midnight())
}

/// Ordering key of a sample: clock labels by time of day, anything else
/// (iotop date lines) by its text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct SampleKey {
    clock: Option<u32>,
    label: String,
}

impl SampleKey {
    fn new(label: &str) -> Self {
        Self {
            clock: clock_seconds(label),
            label: label.to_string(),
        }
    }
}

/// Timestamp label → raw chunk text, iterated in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkSet {
    samples: BTreeMap<SampleKey, String>,
}

impl ChunkSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `chunk` under `label`, replacing an earlier chunk with that label.
    pub fn insert(&mut self, label: impl Into<String>, chunk: impl Into<String>) {
        let label = label.into();
        self.samples.insert(SampleKey::new(&label), chunk.into());
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<&str> {
        self.samples.get(&SampleKey::new(label)).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.samples.contains_key(&SampleKey::new(label))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Labels in chronological order.
    pub fn labels(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.samples.keys().map(|key| key.label.as_str())
    }

    /// `(label, chunk)` pairs in chronological order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &str)> {
        self.samples
            .iter()
            .map(|(key, chunk)| (key.label.as_str(), chunk.as_str()))
    }

    /// The first label after `label`.
    #[must_use]
    pub fn after(&self, label: &str) -> Option<&str> {
        self.samples
            .range((Bound::Excluded(SampleKey::new(label)), Bound::Unbounded))
            .next()
            .map(|(key, _)| key.label.as_str())
    }

    /// The last label before `label`.
    #[must_use]
    pub fn before(&self, label: &str) -> Option<&str> {
        self.samples
            .range((Bound::Unbounded, Bound::Excluded(SampleKey::new(label))))
            .next_back()
            .map(|(key, _)| key.label.as_str())
    }
}

impl<L: Into<String>, C: Into<String>> FromIterator<(L, C)> for ChunkSet {
    fn from_iter<I: IntoIterator<Item = (L, C)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (label, chunk) in iter {
            set.insert(label, chunk);
        }
        set
    }
}

// ──────────────────── tools ────────────────────

/// Monitoring tool that produced a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Pidstat,
    Top,
    Iotop,
}

impl Tool {
    pub const ALL: [Self; 3] = [Self::Pidstat, Self::Top, Self::Iotop];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pidstat => "pidstat",
            Self::Top => "top",
            Self::Iotop => "iotop",
        }
    }

    /// Guess the tool from file contents.
    #[must_use]
    pub fn detect(text: &str) -> Option<Self> {
        let mut saw_uid_header = false;
        let mut saw_disk_summary = false;
        for line in text.lines() {
            if line.trim_start().starts_with("top - ") {
                return Some(Self::Top);
            }
            if is_disk_summary(line) || (is_header_line(line) && line.contains("DISK")) {
                saw_disk_summary = true;
            }
            if tokenize(line).contains(&"UID") {
                saw_uid_header = true;
            }
        }
        if saw_disk_summary {
            Some(Self::Iotop)
        } else if saw_uid_header {
            Some(Self::Pidstat)
        } else {
            None
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tool {
    type Err = PsnError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PsnError::InvalidConfig {
                details: format!("unknown tool {s:?} (expected pidstat, top or iotop)"),
            })
    }
}

/// Which chunk parser a capture's samples need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableFormat {
    /// Known header, free-text last column.
    Regular { header: String },
    /// Header located inside banner/summary noise.
    Noisy,
    /// Header located, rows read with the iotop field grammar.
    Variable,
}

impl TableFormat {
    #[must_use]
    pub fn parse(&self, chunk: &str) -> ParseOutcome {
        match self {
            Self::Regular { header } => parse_regular(header, chunk),
            Self::Noisy => parse_noisy(chunk),
            Self::Variable => parse_variable(chunk),
        }
    }
}

/// A whole tool output split into samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub tool: Tool,
    pub format: TableFormat,
    pub chunks: ChunkSet,
}

impl Capture {
    /// Split `text` as output of `tool`.
    #[must_use]
    pub fn from_text(tool: Tool, text: &str) -> Self {
        match tool {
            Tool::Pidstat => {
                let header = pidstat_header(text).unwrap_or_default();
                Self {
                    tool,
                    format: TableFormat::Regular { header },
                    chunks: split_pidstat(text),
                }
            }
            Tool::Top => Self {
                tool,
                format: TableFormat::Noisy,
                chunks: split_top(text),
            },
            Tool::Iotop => Self {
                tool,
                format: TableFormat::Variable,
                chunks: split_iotop(text),
            },
        }
    }

    /// Split `text`, detecting the tool when not given.
    pub fn detect(text: &str, tool: Option<Tool>) -> Option<Self> {
        tool.or_else(|| Tool::detect(text))
            .map(|tool| Self::from_text(tool, text))
    }

    /// Read and split a capture file.
    pub fn load(path: &Path, tool: Option<Tool>) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| PsnError::io(path, source))?;
        Self::detect(&text, tool).ok_or_else(|| PsnError::UnknownCapture {
            path: path.to_path_buf(),
            details: "no top banner, iotop disk summary or pidstat UID header found".to_string(),
        })
    }

    pub fn timestamps(&self) -> impl Iterator<Item = &str> {
        self.chunks.labels()
    }

    /// Parse the sample at `timestamp`, if the capture has one.
    #[must_use]
    pub fn parse_sample(&self, timestamp: &str) -> Option<ParseOutcome> {
        self.chunks.get(timestamp).map(|chunk| self.format.parse(chunk))
    }
}

/// Whether `token` is the `AM`/`PM` marker of a 12-hour clock.
fn is_meridiem(token: &str) -> bool {
    token == "AM" || token == "PM"
}

/// pidstat's column header: the first line with a `UID` column, with its
/// leading time column renamed to `Timestamp`. 12-hour captures keep their
/// `AM`/`PM` marker in a `Period` column.
#[must_use]
pub fn pidstat_header(text: &str) -> Option<String> {
    text.lines().find(|line| line.contains("UID")).map(|line| {
        let mut columns = tokenize(line);
        if let Some(first) = columns.first_mut() {
            *first = "Timestamp";
        }
        if let Some(second) = columns.get_mut(1)
            && is_meridiem(second)
        {
            *second = "Period";
        }
        columns.join(" ")
    })
}

/// Sample label of a pidstat data line: its time, plus the `AM`/`PM`
/// marker on 12-hour captures.
fn pidstat_label(tokens: &[&str]) -> Option<String> {
    let (&time, rest) = tokens.split_first()?;
    if !is_time_of_day(time) {
        return None;
    }
    Some(match rest.first() {
        Some(&period) if is_meridiem(period) => format!("{time} {period}"),
        _ => time.to_string(),
    })
}

/// Accumulates lines into the chunk for the current timestamp.
#[derive(Debug, Default)]
struct ChunkBuilder {
    chunks: ChunkSet,
    current: Option<String>,
    text: String,
}

impl ChunkBuilder {
    /// Close the current chunk (if any) and start one for `timestamp`.
    fn start(&mut self, timestamp: String) {
        self.flush();
        self.current = Some(timestamp);
    }

    fn push(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
    }

    fn flush(&mut self) {
        if let Some(ts) = self.current.take() {
            self.chunks.insert(ts, self.text.trim().to_string());
        }
        self.text.clear();
    }

    fn finish(mut self) -> ChunkSet {
        self.flush();
        self.chunks
    }
}

/// Split pidstat output. Every data line starts with its sample time;
/// banners, blank lines, repeated headers and `Average:` summaries are
/// skipped.
#[must_use]
pub fn split_pidstat(text: &str) -> ChunkSet {
    let mut builder = ChunkBuilder::default();
    for line in text.lines() {
        let tokens = tokenize(line);
        let Some(first) = tokens.first() else {
            continue;
        };
        if line.starts_with("Linux") || tokens.contains(&"UID") || first.starts_with("Average") {
            continue;
        }
        if let Some(label) = pidstat_label(&tokens)
            && builder.current.as_deref() != Some(label.as_str())
        {
            builder.start(label);
        }
        builder.push(line);
    }
    builder.finish()
}

/// Split top batch output on its `top - HH:MM:SS up ...` banners. The banner
/// stays in the chunk.
#[must_use]
pub fn split_top(text: &str) -> ChunkSet {
    let mut builder = ChunkBuilder::default();
    for line in text.lines() {
        if let Some(idx) = line.find("top - ") {
            let stamp = line[idx + "top - ".len()..].split_whitespace().next();
            if let Some(stamp) = stamp
                && builder.current.as_deref() != Some(stamp)
            {
                builder.start(stamp.to_string());
            }
        }
        builder.push(line);
    }
    builder.finish()
}

/// Weekday prefixes that mark iotop's legacy `date` separated format.
const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Split iotop batch output.
///
/// Legacy captures interleave a `date` line before each `Total DISK READ`
/// summary; that line labels the sample. Captures taken with `-t` prefix
/// every line with `HH:MM:SS`, which labels the sample directly.
#[must_use]
pub fn split_iotop(text: &str) -> ChunkSet {
    let legacy = text
        .lines()
        .next()
        .is_some_and(|first| WEEKDAYS.iter().any(|d| first.starts_with(d)));
    if legacy {
        split_iotop_legacy(text)
    } else {
        split_iotop_timestamped(text)
    }
}

fn split_iotop_legacy(text: &str) -> ChunkSet {
    let mut builder = ChunkBuilder::default();
    let mut previous: Option<&str> = None;
    for line in text.lines() {
        if line.contains("Total DISK READ") {
            let label = previous.map_or_else(String::new, |p| p.trim().to_string());
            builder.start(label);
        } else if let Some(prev) = previous {
            builder.push(prev);
        }
        previous = Some(line);
    }
    if builder.current.is_some()
        && let Some(last) = previous
    {
        builder.push(last);
    }
    builder.finish()
}

fn split_iotop_timestamped(text: &str) -> ChunkSet {
    let mut builder = ChunkBuilder::default();
    for line in text.lines() {
        let stamp = line.get(..8).filter(|s| is_time_of_day(s));
        if let Some(stamp) = stamp
            && line.trim().len() > 8
            && builder.current.as_deref() != Some(stamp)
        {
            if builder.current.is_some() {
                builder.start(stamp.to_string());
            } else {
                // Lines seen before the first sample (the header) belong to it.
                builder.current = Some(stamp.to_string());
            }
        }
        builder.push(line);
    }
    builder.finish()
}
