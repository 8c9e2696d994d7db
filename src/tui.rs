//! Terminal front-end
//!
//! Renders the latest session snapshot and turns key presses into session
//! commands. Holds no conversation state of its own.

mod input;
mod view;

use crate::runtime::SessionHandle;
use crossterm::event::{Event as TermEvent, EventStream};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use futures::StreamExt;
use input::{Action, InputState};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};

pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    restored: bool,
}

impl Tui {
    pub fn init() -> io::Result<Self> {
        enable_raw_mode()?;
        let terminal = undo_on_error(
            || {
                let mut stdout = io::stdout();
                stdout.execute(EnterAlternateScreen)?;
                Terminal::new(CrosstermBackend::new(stdout))
            },
            || {
                let _ = io::stdout().execute(LeaveAlternateScreen);
                let _ = disable_raw_mode();
            },
        )?;
        Ok(Self {
            terminal,
            restored: false,
        })
    }

    /// Leave the alternate screen and give the terminal back
    pub fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        self.terminal.backend_mut().execute(LeaveAlternateScreen)?;
        self.terminal.show_cursor()
    }

    /// Run until the user quits or the session goes away
    pub async fn run(&mut self, session: &SessionHandle) -> io::Result<()> {
        let mut snapshots = session.subscribe();
        let mut events = EventStream::new();
        let mut input = InputState::default();

        loop {
            let snapshot = snapshots.borrow_and_update().clone();
            self.terminal
                .draw(|frame| view::draw(frame, &snapshot, &input))?;

            tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        tracing::info!("Session closed, leaving UI");
                        break;
                    }
                }

                event = events.next() => {
                    let key = match event {
                        Some(Ok(TermEvent::Key(key))) => key,
                        // Resize and friends only need a redraw
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => return Err(e),
                        None => break,
                    };

                    match input.handle_key(key, snapshot.can_submit()) {
                        Action::Quit => break,
                        Action::Submit(text) => match session.submit(text).await {
                            Ok(()) => input.clear(),
                            Err(e) => tracing::debug!(error = %e, "Submit not accepted"),
                        },
                        Action::RetryProbe => {
                            if session.retry_probe().await.is_err() {
                                break;
                            }
                        }
                        Action::Redraw | Action::None => {}
                    }
                }
            }
        }

        Ok(())
    }
}

/// Run `setup`, calling `undo` if it fails partway
fn undo_on_error<T>(setup: impl FnOnce() -> io::Result<T>, undo: impl FnOnce()) -> io::Result<T> {
    setup().inspect_err(|_| undo())
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}
