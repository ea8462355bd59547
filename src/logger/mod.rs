//! Activity logging: optional JSONL event stream.

pub mod jsonl;

use crate::core::config::LoggingConfig;

use self::jsonl::{JsonlConfig, JsonlWriter, LogEntry};

/// Activity sink: a JSONL writer when logging is enabled, otherwise a no-op.
pub enum ActivityLog {
    /// Logging is off; every entry is dropped.
    Disabled,
    /// Entries are appended to a rotating JSONL file.
    Jsonl(JsonlWriter),
}

impl ActivityLog {
    /// Open the sink described by `[logging]`. A file that cannot be opened
    /// degrades inside the writer rather than failing here.
    #[must_use]
    pub fn from_config(logging: &LoggingConfig) -> Self {
        if logging.enabled {
            Self::Jsonl(JsonlWriter::open(JsonlConfig::from(logging)))
        } else {
            Self::Disabled
        }
    }

    /// Record one event; a no-op when disabled.
    pub fn record(&mut self, entry: &LogEntry) {
        if let Self::Jsonl(writer) = self {
            writer.write_entry(entry);
        }
    }

    /// Whether entries reach a writer.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        matches!(self, Self::Jsonl(_))
    }
}
