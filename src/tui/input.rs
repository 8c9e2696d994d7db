//! Keyboard handling for the chat screen

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

const PAGE: u16 = 10;

/// What the event loop should do after a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Redraw,
    Submit(String),
    RetryProbe,
    Quit,
}

/// Text being composed plus the transcript scroll position
#[derive(Debug, Default)]
pub struct InputState {
    buffer: String,
    /// Lines scrolled up from the bottom of the transcript
    scroll_back: u16,
}

impl InputState {
    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn scroll_back(&self) -> u16 {
        self.scroll_back
    }

    /// Called once the session accepted the submitted text
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scroll_back = 0;
    }

    /// Map a key to an action. Editing keys are ignored unless `editable`.
    pub fn handle_key(&mut self, key: KeyEvent, editable: bool) -> Action {
        if key.kind == KeyEventKind::Release {
            return Action::None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return Action::Quit,
            KeyCode::Char('c') if ctrl => return Action::Quit,
            KeyCode::Char('r') if ctrl => return Action::RetryProbe,
            KeyCode::PageUp => {
                self.scroll_back = self.scroll_back.saturating_add(PAGE);
                return Action::Redraw;
            }
            KeyCode::PageDown => {
                self.scroll_back = self.scroll_back.saturating_sub(PAGE);
                return Action::Redraw;
            }
            _ => {}
        }

        if !editable {
            return Action::None;
        }

        match key.code {
            KeyCode::Enter if self.buffer.trim().is_empty() => Action::None,
            KeyCode::Enter => Action::Submit(self.buffer.clone()),
            KeyCode::Backspace => {
                self.buffer.pop();
                Action::Redraw
            }
            KeyCode::Char(c) if !ctrl => {
                self.buffer.push(c);
                Action::Redraw
            }
            _ => Action::None,
        }
    }
}
