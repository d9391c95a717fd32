//! Terminal lifecycle with RAII cleanup.
//!
//! ```no_run
//! use devdash::terminal::{setup_panic_hook, TerminalManager};
//!
//! fn main() -> Result<(), devdash::error::UiError> {
//!     setup_panic_hook();
//!     let mut terminal = TerminalManager::new()?;
//!     // ... run the dashboard ...
//!     terminal.restore()
//! }
//! ```

mod panic;
mod setup;

pub use panic::setup_panic_hook;
pub use setup::{emergency_restore, enter_tui_mode, leave_tui_mode};

use ratatui::layout::Rect;
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use std::io::{self, Stdout};

use crate::error::UiError;
use crate::traits::RenderTarget;

fn init_error(err: io::Error) -> UiError {
    UiError::TerminalInit {
        message: err.to_string(),
    }
}

/// Owns the crossterm terminal. Dropping it leaves TUI mode.
pub struct TerminalManager {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    restored: bool,
}

impl TerminalManager {
    pub fn new() -> Result<Self, UiError> {
        let mut stdout = io::stdout();
        if let Err(err) = enter_tui_mode(&mut stdout) {
            leave_tui_mode(&mut stdout);
            return Err(init_error(err));
        }

        let mut terminal = Terminal::new(CrosstermBackend::new(stdout)).map_err(init_error)?;
        terminal.clear().map_err(init_error)?;

        Ok(Self {
            terminal,
            restored: false,
        })
    }

    pub fn terminal(&mut self) -> &mut Terminal<CrosstermBackend<Stdout>> {
        &mut self.terminal
    }

    /// Leave TUI mode now rather than on drop.
    pub fn restore(&mut self) -> Result<(), UiError> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        leave_tui_mode(self.terminal.backend_mut());
        self.terminal
            .show_cursor()
            .map_err(|err| UiError::TerminalRestore {
                message: err.to_string(),
            })
    }
}

impl RenderTarget for TerminalManager {
    fn draw<F>(&mut self, render: F) -> Result<(), UiError>
    where
        F: FnOnce(&mut Frame),
    {
        self.terminal
            .draw(render)
            .map(|_| ())
            .map_err(|err| UiError::Render {
                component: "frame".to_string(),
                message: err.to_string(),
            })
    }

    fn reinit(&mut self) -> Result<(), UiError> {
        tracing::warn!("re-initialising terminal after a failed draw");
        leave_tui_mode(self.terminal.backend_mut());
        enter_tui_mode(self.terminal.backend_mut()).map_err(init_error)?;
        self.terminal.clear().map_err(init_error)?;
        self.restored = false;
        Ok(())
    }

    fn size(&self) -> Result<Rect, UiError> {
        self.terminal
            .size()
            .map(Into::into)
            .map_err(|err| UiError::Render {
                component: "terminal size".to_string(),
                message: err.to_string(),
            })
    }
}

impl Drop for TerminalManager {
    fn drop(&mut self) {
        if !self.restored {
            leave_tui_mode(self.terminal.backend_mut());
        }
    }
}
