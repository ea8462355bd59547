//! PSN-prefixed error types with structured error codes.
//!
//! Only the outer layer (file intake, configuration, logging) fails. The
//! parsing and view engine absorbs degraded input silently and never returns
//! one of these.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, PsnError>;

/// Top-level error type for procsnap.
#[derive(Debug, Error)]
pub enum PsnError {
    #[error("[PSN-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[PSN-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[PSN-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[PSN-2001] unrecognized capture in {path}: {details}")]
    UnknownCapture { path: PathBuf, details: String },

    #[error("[PSN-2002] no sample at timestamp {timestamp}")]
    UnknownTimestamp { timestamp: String },

    #[error("[PSN-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[PSN-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PsnError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "PSN-1001",
            Self::MissingConfig { .. } => "PSN-1002",
            Self::ConfigParse { .. } => "PSN-1003",
            Self::UnknownCapture { .. } => "PSN-2001",
            Self::UnknownTimestamp { .. } => "PSN-2002",
            Self::Serialization { .. } => "PSN-2101",
            Self::Io { .. } => "PSN-3002",
        }
    }

    /// Whether the failure came from user-supplied input rather than the
    /// environment.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. }
                | Self::MissingConfig { .. }
                | Self::ConfigParse { .. }
                | Self::UnknownCapture { .. }
                | Self::UnknownTimestamp { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for PsnError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for PsnError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<toml::ser::Error> for PsnError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Serialization {
            context: "toml",
            details: value.to_string(),
        }
    }
}
