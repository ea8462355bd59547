//! Section controller: timestamp selection, top-N and search controls, and
//! sort requests as an Elm-style state machine (Idle → Rendered).

pub mod model;
pub mod update;

pub use model::{
    ALL_TIMESTAMPS, ParseStats, SectionCmd, SectionModel, SectionMsg, SectionState, TOP_N_PRESETS,
};
pub use update::update;
