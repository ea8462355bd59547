//! Text → table parsing: tokenizer, value coercion, column heuristics, the
//! three chunk parsers, and whole-capture splitting.
//!
//! Every function here is pure and infallible on its input text. Degraded
//! input is absorbed: short lines are dropped (and counted in
//! [`ParseOutcome::dropped_lines`]), a missing header yields an empty table,
//! and unparseable numbers stay text.

pub mod capture;
pub mod columns;
pub mod header;
pub mod noisy;
pub mod regular;
pub mod table;
pub mod tokenize;
pub mod variable;

pub use capture::{Capture, ChunkSet, TableFormat, Tool};
pub use columns::is_numeric_column;
pub use noisy::parse_noisy;
pub use regular::parse_regular;
pub use table::{CellValue, ParseOutcome, ParsedTable, Row};
pub use tokenize::{coerce, tokenize};
pub use variable::parse_variable;
