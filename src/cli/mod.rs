//! Presentation adapters: table layout and coloring, consumer reports, the
//! interactive browser, and the runtime that executes section commands.
#![allow(missing_docs)]

#[cfg(feature = "browse")]
pub mod browse;
pub mod report;
pub mod table;

use crate::logger::ActivityLog;
use crate::logger::jsonl::{EventType, LogEntry, Severity};
use crate::section::SectionCmd;
use crate::view::ViewModel;

/// Execute the side-effects of a section update. Returns whether the
/// displayed view changed and needs drawing.
pub fn apply_effects(
    cmd: SectionCmd,
    section: &str,
    view: Option<&ViewModel>,
    log: &mut ActivityLog,
) -> bool {
    match cmd {
        SectionCmd::None => false,
        SectionCmd::Present => {
            if let Some(view) = view {
                log.record(&rendered_entry(section, view));
            }
            true
        }
        SectionCmd::Clear => true,
        SectionCmd::RecordParse(stats) => {
            log.record(&LogEntry::chunk_parsed(section, &stats));
            false
        }
        SectionCmd::Batch(cmds) => cmds
            .into_iter()
            .fold(false, |redraw, cmd| apply_effects(cmd, section, view, log) | redraw),
    }
}

fn rendered_entry(section: &str, view: &ViewModel) -> LogEntry {
    LogEntry {
        tool: Some(section.to_string()),
        rows: Some(view.total_rows),
        visible_rows: Some(view.visible_rows.len()),
        ..LogEntry::new(EventType::SectionRendered, Severity::Info)
    }
}
