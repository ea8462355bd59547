#![forbid(unsafe_code)]

//! procsnap: turns pidstat, top and iotop text snapshots into sortable,
//! filterable, highlighted process tables.
//!
//! The pipeline is pure and synchronous:
//! 1. **Capture splitting**: a whole tool output becomes one raw chunk per
//!    sample timestamp ([`parse::Capture`])
//! 2. **Chunk parsing**: regular, noisy and fixed-grammar parsers turn a
//!    chunk into a [`parse::ParsedTable`]
//! 3. **View building**: search filter, metric sort, top-N truncation and
//!    threshold highlighting produce a [`view::ViewModel`]
//! 4. **Section control**: an Elm-style state machine ([`section`]) ties
//!    timestamp selection and controls to re-parsing and re-rendering
//!
//! [`analysis`] ranks the heaviest commands of a pidstat capture across all
//! of its samples.
//!
//! # Library usage
//!
//! ```rust,no_run
//! use procsnap::prelude::*;
//!
//! let table = parse_regular("PID %CPU %MEM COMMAND", "1 2.5 1.1 sleep\n2 10.0 0.5 my program")
//!     .into_table();
//! let view = build_view(&table, &RenderOptions::default());
//! assert_eq!(view.visible_rows.len(), 2);
//! ```

pub mod prelude;

pub mod analysis;
#[cfg(feature = "cli")]
pub mod cli;
pub mod core;
pub mod logger;
pub mod parse;
pub mod section;
pub mod view;
