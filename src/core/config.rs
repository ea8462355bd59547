//! Configuration system: TOML file + env var overrides + defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{PsnError, Result};
use crate::parse::capture::Tool;
use crate::view::options::{RenderOptions, Thresholds};

/// Full procsnap configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Render options shared by every section.
    pub render: RenderOptions,
    pub tools: ToolsConfig,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

/// Per-tool render overrides, layered over `[render]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ToolsConfig {
    pub pidstat: ToolOverrides,
    pub top: ToolOverrides,
    pub iotop: ToolOverrides,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ToolOverrides {
    pub metric: Option<String>,
    pub thresholds: Option<Thresholds>,
    pub highlight_column: Option<String>,
    pub highlight_thresholds: Option<Thresholds>,
    pub top_n: Option<usize>,
}

/// JSONL activity log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub jsonl_path: PathBuf,
    /// Rotate the log once it grows past this size.
    pub max_bytes: u64,
    /// Rotated files kept next to the active log.
    pub max_rotated_files: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
}

fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[PSN-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            jsonl_path: home_dir()
                .join(".local")
                .join("share")
                .join("procsnap")
                .join("activity.jsonl"),
            max_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_file: home_dir()
                .join(".config")
                .join("procsnap")
                .join("config.toml"),
        }
    }
}

impl ToolsConfig {
    #[must_use]
    pub const fn get(&self, tool: Tool) -> &ToolOverrides {
        match tool {
            Tool::Pidstat => &self.pidstat,
            Tool::Top => &self.top,
            Tool::Iotop => &self.iotop,
        }
    }
}

impl ToolOverrides {
    /// Layer these overrides over `base`.
    #[must_use]
    pub fn apply(&self, base: &RenderOptions) -> RenderOptions {
        let mut options = base.clone();
        if let Some(metric) = &self.metric {
            options.metric.clone_from(metric);
        }
        if let Some(thresholds) = self.thresholds {
            options.thresholds = thresholds;
        }
        if self.highlight_column.is_some() {
            options.highlight_column.clone_from(&self.highlight_column);
        }
        if self.highlight_thresholds.is_some() {
            options.highlight_thresholds = self.highlight_thresholds;
        }
        if let Some(top_n) = self.top_n {
            options.top_n = top_n;
        }
        options
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// A missing file at the default path is not an error; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, env_var)
    }

    /// [`Config::load`] with an explicit environment lookup.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| PsnError::io(&path_buf, source))?;
            toml::from_str::<Self>(&raw)?
        } else if path.is_some() {
            return Err(PsnError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(lookup)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic FNV-1a hash of the effective config, for the activity log.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    /// Effective render options for a capture of `tool`.
    #[must_use]
    pub fn render_options_for(&self, tool: Tool) -> RenderOptions {
        let mut options = self.tools.get(tool).apply(&self.render);
        options.controls_key = tool.name().to_string();
        options
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("PSN_METRIC") {
            self.render.metric = raw.trim().to_string();
        }
        if let Some(raw) = lookup("PSN_WARN") {
            self.render.thresholds.warn = parse_env("PSN_WARN", &raw)?;
        }
        if let Some(raw) = lookup("PSN_CRIT") {
            self.render.thresholds.crit = parse_env("PSN_CRIT", &raw)?;
        }
        if let Some(raw) = lookup("PSN_TOP_N") {
            self.render.top_n = parse_env("PSN_TOP_N", &raw)?;
        }
        if let Some(raw) = lookup("PSN_LOG_ENABLED") {
            self.logging.enabled = parse_env("PSN_LOG_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("PSN_LOG_PATH") {
            self.logging.jsonl_path = PathBuf::from(raw);
        }
        Ok(())
    }

    /// Reject configurations no render could honor.
    pub fn validate(&self) -> Result<()> {
        validate_metric("render.metric", &self.render.metric)?;
        validate_thresholds("render.thresholds", self.render.thresholds)?;
        if let Some(t) = self.render.highlight_thresholds {
            validate_thresholds("render.highlight_thresholds", t)?;
        }

        for tool in Tool::ALL {
            let overrides = self.tools.get(tool);
            let name = tool.name();
            if let Some(metric) = &overrides.metric {
                validate_metric(&format!("tools.{name}.metric"), metric)?;
            }
            if let Some(t) = overrides.thresholds {
                validate_thresholds(&format!("tools.{name}.thresholds"), t)?;
            }
            if let Some(t) = overrides.highlight_thresholds {
                validate_thresholds(&format!("tools.{name}.highlight_thresholds"), t)?;
            }
        }

        if self.logging.enabled && self.logging.jsonl_path.as_os_str().is_empty() {
            return Err(PsnError::InvalidConfig {
                details: "logging.jsonl_path must be set when logging is enabled".to_string(),
            });
        }
        Ok(())
    }
}

fn validate_metric(name: &str, metric: &str) -> Result<()> {
    if metric.trim().is_empty() {
        return Err(PsnError::InvalidConfig {
            details: format!("{name} must not be empty"),
        });
    }
    Ok(())
}

fn validate_thresholds(name: &str, t: Thresholds) -> Result<()> {
    if !t.warn.is_finite() || !t.crit.is_finite() {
        return Err(PsnError::InvalidConfig {
            details: format!("{name} must be finite, got warn={} crit={}", t.warn, t.crit),
        });
    }
    if t.warn > t.crit {
        return Err(PsnError::InvalidConfig {
            details: format!("{name}.warn ({}) must not exceed crit ({})", t.warn, t.crit),
        });
    }
    Ok(())
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|error| PsnError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}
