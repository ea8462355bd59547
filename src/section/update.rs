//! Pure update function for a capture section.
//!
//! `update()` applies a message to the model and returns the side-effects
//! the runtime should execute. Selecting a timestamp is the only transition
//! that parses; control changes rebuild the view from the cached table and
//! sort requests reorder the current view in place.
//!
//! This module performs zero I/O.

use crate::view::build_view;

use super::model::{
    ALL_TIMESTAMPS, ParseStats, SectionCmd, SectionModel, SectionMsg, larger_top_n, smaller_top_n,
};

/// Apply a message to the model and return the next command for the runtime.
pub fn update(model: &mut SectionModel, msg: SectionMsg) -> SectionCmd {
    match msg {
        SectionMsg::SelectTimestamp(timestamp) => select(model, timestamp),

        SectionMsg::SelectNext => match model.next_timestamp() {
            Some(ts) if model.selected.as_ref() != Some(&ts) => select(model, ts),
            _ => SectionCmd::None,
        },

        SectionMsg::SelectPrev => match model.prev_timestamp() {
            Some(ts) if model.selected.as_ref() != Some(&ts) => select(model, ts),
            _ => SectionCmd::None,
        },

        SectionMsg::SetTopN(top_n) => {
            model.options.top_n = top_n;
            rerender(model)
        }

        SectionMsg::TopNUp => {
            model.options.top_n = larger_top_n(model.options.top_n);
            rerender(model)
        }

        SectionMsg::TopNDown => {
            model.options.top_n = smaller_top_n(model.options.top_n);
            rerender(model)
        }

        SectionMsg::SetSearch(search) => {
            model.options.search = search;
            rerender(model)
        }

        SectionMsg::SortColumn(column) => match model.view.as_mut() {
            Some(view) => {
                if view.apply_sort_request(column) {
                    SectionCmd::Present
                } else {
                    SectionCmd::None
                }
            }
            None => SectionCmd::None,
        },
    }
}

/// Select `timestamp`: parse its chunk and render, or return to idle for
/// the sentinel. A timestamp with no chunk renders an empty table.
fn select(model: &mut SectionModel, timestamp: String) -> SectionCmd {
    if timestamp == ALL_TIMESTAMPS {
        let was_rendered = model.view.is_some();
        model.selected = None;
        model.table = None;
        model.view = None;
        return if was_rendered {
            SectionCmd::Clear
        } else {
            SectionCmd::None
        };
    }

    let chunk = model.chunks.get(&timestamp).unwrap_or("");
    let outcome = model.format.parse(chunk);
    model.parses += 1;
    let stats = ParseStats::from_outcome(&timestamp, &outcome);

    let view = build_view(&outcome.table, &model.options);
    model.renders += 1;
    model.table = Some(outcome.table);
    model.view = Some(view);
    model.selected = Some(timestamp);
    model.last_parse = Some(stats.clone());

    SectionCmd::Batch(vec![SectionCmd::RecordParse(stats), SectionCmd::Present])
}

/// Rebuild the view from the cached table. Idle sections only keep the new
/// options for the next selection.
fn rerender(model: &mut SectionModel) -> SectionCmd {
    let Some(table) = model.table.as_ref() else {
        return SectionCmd::None;
    };
    model.view = Some(build_view(table, &model.options));
    model.renders += 1;
    SectionCmd::Present
}
