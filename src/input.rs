//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] actions.  In normal mode keys are
//! commands; in search mode printable keys edit the query.
//!
//! ## For contributors
//!
//! To add a new keybinding:
//!
//! 1. Add a method on [`App`] for the action (if one doesn't exist).
//! 2. Add a `KeyCode` match arm in [`handle_normal`] that calls it.
//! 3. Update the help text in the status bar (`ui.rs`).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{App, InputMode};
use crate::viewed::Storage;

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event<S: Storage>(app: &mut App<S>, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    match app.mode {
        InputMode::Normal => handle_normal(app, key),
        InputMode::Search => handle_search(app, key),
    }
}

fn handle_normal<S: Storage>(app: &mut App<S>, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        KeyCode::Char('/') => app.enter_search(),
        KeyCode::Tab => app.next_tab(),
        KeyCode::Char(' ') | KeyCode::Enter => app.toggle_selected_viewed(),
        KeyCode::Char('m') => app.mark_all_visible(true),
        KeyCode::Char('u') => app.mark_all_visible(false),
        KeyCode::Char('C') => app.clear_viewed(),
        KeyCode::Char('r') => app.reload_requested = true,
        KeyCode::Char(c @ '1'..='9') => app.toggle_source(c as usize - '1' as usize),
        KeyCode::F(n @ 1..=12) => app.toggle_tag(usize::from(n - 1)),
        _ => {}
    }
}

fn handle_search<S: Storage>(app: &mut App<S>, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Esc => app.leave_search(),
        KeyCode::Backspace => app.pop_query_char(),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => app.clear_query(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => app.push_query_char(c),
        _ => {}
    }
}
