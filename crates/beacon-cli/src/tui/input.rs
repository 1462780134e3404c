//! Keyboard input handling for the dashboard.
//!
//! | Key           | Action     |
//! |---------------|------------|
//! | `c` / `Enter` | Connect    |
//! | `d`           | Disconnect |
//! | `q` / `Esc`   | Quit       |

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// User actions that can be triggered by keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Connect to a beacon.
    Connect,
    /// Disconnect from the current beacon.
    Disconnect,
    /// Quit the application.
    Quit,
    /// Key with no binding.
    None,
}

/// Map a key code to an action.
pub fn handle_key(code: KeyCode) -> Action {
    match code {
        KeyCode::Char('c') | KeyCode::Enter => Action::Connect,
        KeyCode::Char('d') => Action::Disconnect,
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        _ => Action::None,
    }
}

/// Map a full key event, treating Ctrl+C as quit.
pub fn handle_key_event(key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Action::Quit;
    }
    handle_key(key.code)
}
