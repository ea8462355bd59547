//! Interactive capture browser.
//!
//! Drives a [`SectionModel`] from the keyboard: arrows walk timestamps, `+`
//! and `-` step the row cap, `/` edits the command search, digits sort by
//! column, `a` returns to the idle state and `q` quits. Uses `crossterm` for
//! raw mode, the alternate screen and colors; the frame is redrawn only
//! after an update asks for it.

#![allow(missing_docs)]
#![allow(clippy::cast_possible_truncation)]

use std::io::{self, Write};
use std::time::Duration;

use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Attribute, Color, SetAttribute, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};

use crate::logger::ActivityLog;
use crate::section::{ALL_TIMESTAMPS, SectionModel, SectionMsg, SectionState, update};
use crate::view::HighlightLevel;

use super::table::{layout, summary_line};
use super::apply_effects;

// ──────────────────── input ────────────────────

/// Keyboard focus.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Editing the search term; holds the text typed so far.
    Search(String),
}

/// What a key press asks the browser to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseAction {
    Send(SectionMsg),
    EnterSearch,
    EditSearch(String),
    CancelSearch,
    Quit,
    Ignore,
}

/// Map a key press to an action in the current input mode.
#[must_use]
pub fn map_key(mode: &InputMode, key: KeyEvent) -> BrowseAction {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return BrowseAction::Quit;
    }
    match mode {
        InputMode::Search(buffer) => match key.code {
            KeyCode::Enter => {
                let term = buffer.trim();
                BrowseAction::Send(SectionMsg::SetSearch(
                    (!term.is_empty()).then(|| term.to_string()),
                ))
            }
            KeyCode::Esc => BrowseAction::CancelSearch,
            KeyCode::Backspace => {
                let mut next = buffer.clone();
                next.pop();
                BrowseAction::EditSearch(next)
            }
            KeyCode::Char(c) => BrowseAction::EditSearch(format!("{buffer}{c}")),
            _ => BrowseAction::Ignore,
        },
        InputMode::Normal => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => BrowseAction::Quit,
            KeyCode::Right | KeyCode::Down | KeyCode::Char('n') => {
                BrowseAction::Send(SectionMsg::SelectNext)
            }
            KeyCode::Left | KeyCode::Up | KeyCode::Char('p') => {
                BrowseAction::Send(SectionMsg::SelectPrev)
            }
            KeyCode::Char('+' | '=') => BrowseAction::Send(SectionMsg::TopNUp),
            KeyCode::Char('-') => BrowseAction::Send(SectionMsg::TopNDown),
            KeyCode::Char('a') => {
                BrowseAction::Send(SectionMsg::SelectTimestamp(ALL_TIMESTAMPS.to_string()))
            }
            KeyCode::Char('/') => BrowseAction::EnterSearch,
            KeyCode::Char(c) => c.to_digit(10).map_or(BrowseAction::Ignore, |d| {
                // 1..9 → columns 0..8, 0 → column 9.
                let column = if d == 0 { 9 } else { d as usize - 1 };
                BrowseAction::Send(SectionMsg::SortColumn(column))
            }),
            _ => BrowseAction::Ignore,
        },
    }
}

// ──────────────────── main loop ────────────────────

/// Run the browser until the user quits.
pub fn run(model: &mut SectionModel, log: &mut ActivityLog) -> io::Result<()> {
    let mut stdout = io::stdout();

    terminal::enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;

    let result = run_inner(&mut stdout, model, log);

    // Always restore terminal state.
    let _ = execute!(stdout, LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

fn run_inner(stdout: &mut io::Stdout, model: &mut SectionModel, log: &mut ActivityLog) -> io::Result<()> {
    let mut mode = InputMode::Normal;
    let mut dirty = true;

    loop {
        if dirty {
            let (cols, rows) = terminal::size()?;
            render_frame(stdout, model, &mode, cols as usize, rows as usize)?;
            dirty = false;
        }

        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                match map_key(&mode, key) {
                    BrowseAction::Quit => return Ok(()),
                    BrowseAction::Send(msg) => {
                        if matches!(msg, SectionMsg::SetSearch(_)) {
                            mode = InputMode::Normal;
                            dirty = true;
                        }
                        let cmd = update(model, msg);
                        dirty |= apply_effects(cmd, &model.name, model.view.as_ref(), log);
                    }
                    BrowseAction::EnterSearch => {
                        mode = InputMode::Search(model.options.search.clone().unwrap_or_default());
                        dirty = true;
                    }
                    BrowseAction::EditSearch(text) => {
                        mode = InputMode::Search(text);
                        dirty = true;
                    }
                    BrowseAction::CancelSearch => {
                        mode = InputMode::Normal;
                        dirty = true;
                    }
                    BrowseAction::Ignore => {}
                }
            }
            Event::Resize(..) => dirty = true,
            _ => {}
        }
    }
}

// ──────────────────── frame rendering ────────────────────

fn level_color(level: HighlightLevel) -> Color {
    match level {
        HighlightLevel::Crit => Color::Red,
        HighlightLevel::Warn => Color::Yellow,
        HighlightLevel::None => Color::Reset,
    }
}

fn clip(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

fn render_frame(
    stdout: &mut io::Stdout,
    model: &SectionModel,
    mode: &InputMode,
    width: usize,
    height: usize,
) -> io::Result<()> {
    queue!(stdout, MoveTo(0, 0), Clear(ClearType::All))?;

    // ── Header ──
    let title = match (&model.selected, &model.view) {
        (Some(ts), Some(view)) => summary_line(&model.name, ts, view),
        _ => format!("{}: {} samples, none selected", model.name, model.chunks.len()),
    };
    queue!(
        stdout,
        MoveTo(0, 0),
        SetForegroundColor(Color::Cyan),
        SetAttribute(Attribute::Bold)
    )?;
    write!(stdout, "{}", clip(&title, width))?;
    queue!(stdout, SetAttribute(Attribute::Reset))?;

    let top_n = if model.options.top_n == 0 {
        "all".to_string()
    } else {
        model.options.top_n.to_string()
    };
    let search = model.options.search_term().unwrap_or("-");
    queue!(stdout, MoveTo(0, 1), SetForegroundColor(Color::DarkGrey))?;
    write!(
        stdout,
        "{}",
        clip(&format!("metric {}  top {top_n}  search {search}", model.options.metric), width)
    )?;
    if let Some(stats) = &model.last_parse
        && stats.dropped_lines > 0
    {
        write!(stdout, "  ({} lines dropped)", stats.dropped_lines)?;
    }
    queue!(stdout, SetAttribute(Attribute::Reset), SetForegroundColor(Color::Reset))?;

    // ── Table ──
    let body_rows = height.saturating_sub(5);
    match (model.state(), &model.view) {
        (SectionState::Rendered, Some(view)) => {
            let table = layout(view);
            queue!(stdout, MoveTo(0, 3), SetAttribute(Attribute::Bold))?;
            write!(stdout, "{}", clip(&table.header, width))?;
            queue!(stdout, SetAttribute(Attribute::Reset))?;
            for (i, row) in table.rows.iter().take(body_rows).enumerate() {
                queue!(
                    stdout,
                    MoveTo(0, (4 + i) as u16),
                    SetForegroundColor(level_color(row.level))
                )?;
                write!(stdout, "{}", clip(&row.text, width))?;
            }
            queue!(stdout, SetForegroundColor(Color::Reset))?;
        }
        _ => {
            queue!(stdout, MoveTo(0, 3), SetForegroundColor(Color::DarkGrey))?;
            write!(stdout, "Press → to select the first sample.")?;
            queue!(stdout, SetForegroundColor(Color::Reset))?;
        }
    }

    // ── Footer ──
    let footer = match mode {
        InputMode::Search(buffer) => format!("search: {buffer}_   (Enter apply, Esc cancel)"),
        InputMode::Normal => {
            "←/→ sample  +/- top-N  / search  1-9 sort  a all  q quit".to_string()
        }
    };
    queue!(
        stdout,
        MoveTo(0, height.saturating_sub(1) as u16),
        SetForegroundColor(Color::Cyan)
    )?;
    write!(stdout, "{}", clip(&footer, width))?;
    queue!(stdout, SetForegroundColor(Color::Reset))?;

    stdout.flush()
}

// ──────────────────── tests ────────────────────
