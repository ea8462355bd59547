//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::control;
use serde_json::{Value, json};
use thiserror::Error;

use procsnap::analysis::{ConsumerProfile, DEFAULT_CONSUMERS, top_consumers};
use procsnap::cli::apply_effects;
use procsnap::cli::report::render_consumers;
use procsnap::cli::table::{render_colored, summary_line};
use procsnap::core::config::Config;
use procsnap::core::errors::PsnError;
use procsnap::logger::ActivityLog;
use procsnap::logger::jsonl::{EventType, LogEntry, Severity};
use procsnap::parse::{Capture, Tool};
use procsnap::section::{SectionModel, SectionMsg, update};
use procsnap::view::resolve::find_column;
use procsnap::view::{RenderOptions, Thresholds};

/// procsnap: browse pidstat, top and iotop captures as sortable tables.
#[derive(Debug, Parser)]
#[command(
    name = "psn",
    author,
    version,
    about = "Process snapshot browser for pidstat/top/iotop captures",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Report parse statistics on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// List the sample timestamps in a capture.
    Timestamps(CaptureArgs),
    /// Render one sample as a table.
    Show(ShowArgs),
    /// Browse a capture interactively.
    Browse(BrowseArgs),
    /// Rank the heaviest commands of a pidstat capture across all samples.
    Top(TopArgs),
    /// View and validate configuration.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
struct CaptureArgs {
    /// Capture file (pidstat, top -b or iotop -b output).
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// Tool that produced the capture; detected from the contents when omitted.
    #[arg(long, value_name = "TOOL")]
    tool: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct ShowArgs {
    #[command(flatten)]
    capture: CaptureArgs,
    /// Sample timestamp to render.
    #[arg(long, value_name = "TIMESTAMP")]
    at: String,
    #[command(flatten)]
    render: RenderArgs,
    /// Re-sort the displayed rows by this column (ascending).
    #[arg(long, value_name = "COLUMN")]
    sort: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct BrowseArgs {
    #[command(flatten)]
    capture: CaptureArgs,
    /// Sample to open first.
    #[arg(long, value_name = "TIMESTAMP")]
    at: Option<String>,
    #[command(flatten)]
    render: RenderArgs,
}

/// Command-line overrides of the configured render options.
#[derive(Debug, Clone, Default, Args)]
struct RenderArgs {
    /// Metric column to sort and highlight by.
    #[arg(long, value_name = "COLUMN")]
    metric: Option<String>,
    /// Highlight a different column than the metric.
    #[arg(long, value_name = "COLUMN")]
    highlight: Option<String>,
    /// Warn threshold.
    #[arg(long, value_name = "VALUE")]
    warn: Option<f64>,
    /// Critical threshold.
    #[arg(long, value_name = "VALUE")]
    crit: Option<f64>,
    /// Rows to show (0 = all).
    #[arg(long, value_name = "N")]
    top: Option<usize>,
    /// Keep only rows whose command contains this text (case-insensitive).
    #[arg(long, value_name = "TEXT")]
    search: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct TopArgs {
    #[command(flatten)]
    capture: CaptureArgs,
    /// Metrics to rank: cpu, io or memory; detected from the header when omitted.
    #[arg(long, value_name = "PROFILE")]
    profile: Option<String>,
    /// Commands per ranking (0 = all).
    #[arg(long, value_name = "N", default_value_t = DEFAULT_CONSUMERS)]
    top: usize,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print the config file path.
    Path,
    /// Print the effective configuration.
    Show,
    /// Validate the configuration.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
        }
    }
}

impl From<PsnError> for CliError {
    fn from(err: PsnError) -> Self {
        if err.is_user_error() {
            Self::User(err.to_string())
        } else if matches!(err, PsnError::Serialization { .. }) {
            Self::Internal(err.to_string())
        } else {
            Self::Runtime(err.to_string())
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Timestamps(args) => run_timestamps(cli, args),
        Command::Show(args) => run_show(cli, args),
        Command::Browse(args) => run_browse(cli, args),
        Command::Top(args) => run_top(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

// ──────────────────── session setup ────────────────────

/// Loaded config, activity log and capture for one command.
struct Session {
    config: Config,
    log: ActivityLog,
    capture: Capture,
}

fn open_session(cli: &Cli, args: &CaptureArgs) -> Result<Session, CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let mut log = ActivityLog::from_config(&config.logging);
    log.record(&LogEntry {
        path: Some(config.paths.config_file.display().to_string()),
        details: config.stable_hash().ok(),
        ..LogEntry::new(EventType::ConfigLoaded, Severity::Info)
    });

    let tool = args.tool.as_deref().map(Tool::from_str).transpose()?;
    let capture = match Capture::load(&args.file, tool) {
        Ok(capture) => capture,
        Err(err) => {
            log.record(&LogEntry {
                path: Some(args.file.display().to_string()),
                ..LogEntry::error(&err)
            });
            return Err(err.into());
        }
    };
    log.record(&LogEntry {
        path: Some(args.file.display().to_string()),
        tool: Some(capture.tool.name().to_string()),
        samples: Some(capture.chunks.len()),
        ..LogEntry::new(EventType::CaptureLoaded, Severity::Info)
    });

    Ok(Session {
        config,
        log,
        capture,
    })
}

fn render_options(config: &Config, tool: Tool, args: &RenderArgs) -> Result<RenderOptions, CliError> {
    let mut options = config.render_options_for(tool);
    if let Some(metric) = &args.metric {
        options.metric.clone_from(metric);
    }
    if args.highlight.is_some() {
        options.highlight_column.clone_from(&args.highlight);
    }
    if args.warn.is_some() || args.crit.is_some() {
        let thresholds = Thresholds::new(
            args.warn.unwrap_or(options.thresholds.warn),
            args.crit.unwrap_or(options.thresholds.crit),
        );
        if !thresholds.warn.is_finite() || !thresholds.crit.is_finite() || thresholds.warn > thresholds.crit {
            return Err(CliError::User(format!(
                "--warn ({}) must be finite and not exceed --crit ({})",
                thresholds.warn, thresholds.crit
            )));
        }
        options.thresholds = thresholds;
    }
    if let Some(top) = args.top {
        options.top_n = top;
    }
    if args.search.is_some() {
        options.search.clone_from(&args.search);
    }
    Ok(options)
}

fn check_timestamp(capture: &Capture, timestamp: &str) -> Result<(), CliError> {
    if capture.chunks.contains(timestamp) {
        Ok(())
    } else {
        Err(PsnError::UnknownTimestamp {
            timestamp: timestamp.to_string(),
        }
        .into())
    }
}

fn report_parse(cli: &Cli, model: &SectionModel) {
    if !cli.verbose {
        return;
    }
    if let Some(stats) = &model.last_parse {
        eprintln!(
            "[PSN] {} {}: {} rows, {} lines dropped{}",
            model.name,
            stats.timestamp,
            stats.rows,
            stats.dropped_lines,
            if stats.header_found { "" } else { ", no header found" }
        );
    }
}

// ──────────────────── commands ────────────────────

fn run_timestamps(cli: &Cli, args: &CaptureArgs) -> Result<(), CliError> {
    let session = open_session(cli, args)?;
    let timestamps: Vec<&str> = session.capture.timestamps().collect();

    match output_mode(cli) {
        OutputMode::Human => {
            let mut stdout = io::stdout().lock();
            for ts in &timestamps {
                writeln!(stdout, "{ts}")?;
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "timestamps",
                "tool": session.capture.tool.name(),
                "timestamps": timestamps,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn run_show(cli: &Cli, args: &ShowArgs) -> Result<(), CliError> {
    let Session {
        config,
        mut log,
        capture,
    } = open_session(cli, &args.capture)?;
    check_timestamp(&capture, &args.at)?;

    let options = render_options(&config, capture.tool, &args.render)?;
    let mut model = SectionModel::from_capture(capture, options);
    let cmd = update(&mut model, SectionMsg::SelectTimestamp(args.at.clone()));
    apply_effects(cmd, &model.name, model.view.as_ref(), &mut log);
    report_parse(cli, &model);

    if let Some(column) = &args.sort {
        let index = model
            .view
            .as_ref()
            .and_then(|view| {
                let names: Vec<String> = view.columns.iter().map(|c| c.name.clone()).collect();
                find_column(&names, column)
            })
            .ok_or_else(|| CliError::User(format!("no column named {column:?} in this sample")))?;
        let cmd = update(&mut model, SectionMsg::SortColumn(index));
        apply_effects(cmd, &model.name, model.view.as_ref(), &mut log);
    }

    let Some(view) = model.view.as_ref() else {
        return Err(CliError::Internal("selected sample produced no view".to_string()));
    };

    match output_mode(cli) {
        OutputMode::Human => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", summary_line(&model.name, &args.at, view))?;
            write!(stdout, "{}", render_colored(view))?;
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "show",
                "tool": model.name,
                "timestamp": args.at,
                "parse": model.last_parse,
                "view": view,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn run_top(cli: &Cli, args: &TopArgs) -> Result<(), CliError> {
    let profile = args
        .profile
        .as_deref()
        .map(ConsumerProfile::from_str)
        .transpose()?;
    let Session {
        mut log, capture, ..
    } = open_session(cli, &args.capture)?;

    let Some(report) = top_consumers(&capture, profile, args.top) else {
        return Err(CliError::User(format!(
            "{} capture has no cpu, io or memory pidstat columns to rank",
            capture.tool
        )));
    };
    log.record(&LogEntry {
        path: Some(args.capture.file.display().to_string()),
        tool: Some(capture.tool.name().to_string()),
        samples: Some(report.timestamps.len()),
        details: Some(report.profile.name().to_string()),
        ..LogEntry::new(EventType::ConsumersRanked, Severity::Info)
    });

    match output_mode(cli) {
        OutputMode::Human => {
            write!(io::stdout().lock(), "{}", render_consumers(&report))?;
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "top",
                "tool": capture.tool.name(),
                "report": report,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

#[cfg(feature = "browse")]
fn run_browse(cli: &Cli, args: &BrowseArgs) -> Result<(), CliError> {
    if !io::stdout().is_terminal() {
        return Err(CliError::User("browse needs an interactive terminal".to_string()));
    }
    let Session {
        config,
        mut log,
        capture,
    } = open_session(cli, &args.capture)?;
    if let Some(at) = &args.at {
        check_timestamp(&capture, at)?;
    }

    let options = render_options(&config, capture.tool, &args.render)?;
    let mut model = SectionModel::from_capture(capture, options);
    if let Some(at) = &args.at {
        let cmd = update(&mut model, SectionMsg::SelectTimestamp(at.clone()));
        apply_effects(cmd, &model.name, model.view.as_ref(), &mut log);
    }

    procsnap::cli::browse::run(&mut model, &mut log)
        .map_err(|e| CliError::Runtime(format!("terminal failure: {e}")))?;
    report_parse(cli, &model);
    Ok(())
}

#[cfg(not(feature = "browse"))]
fn run_browse(_cli: &Cli, _args: &BrowseArgs) -> Result<(), CliError> {
    Err(CliError::User(
        "psn was built without the `browse` feature".to_string(),
    ))
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = Config::load(cli.config.as_deref())?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config).map_err(PsnError::from)?;
                    println!("{toml_str}");
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config show",
                        "config": serde_json::to_value(&config)?,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let hash = config.stable_hash()?;
                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("Configuration is valid.");
                        println!("  Source: {}", config.paths.config_file.display());
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": true,
                            "path": config.paths.config_file.to_string_lossy(),
                            "hash": hash,
                        });
                        write_json_line(&payload)?;
                    }
                }
                Ok(())
            }
            Err(e) => {
                match output_mode(cli) {
                    OutputMode::Human => eprintln!("Configuration is INVALID: {e}"),
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": false,
                            "code": e.code(),
                            "error": e.to_string(),
                        });
                        write_json_line(&payload)?;
                    }
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

// ──────────────────── output helpers ────────────────────

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("PSN_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
