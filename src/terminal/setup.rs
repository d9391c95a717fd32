//! Entering and leaving TUI mode.

use crossterm::{
    cursor::{Hide, Show},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, Write};

/// Raw mode, alternate screen and mouse capture. Mouse capture is what
/// turns touch-panel presses into pointer events.
pub fn enter_tui_mode<W: Write>(writer: &mut W) -> io::Result<()> {
    enable_raw_mode()?;
    execute!(writer, EnterAlternateScreen, EnableMouseCapture, Hide)
}

/// Undo [`enter_tui_mode`]. Safe to call more than once; errors are ignored.
pub fn leave_tui_mode<W: Write>(writer: &mut W) {
    let _ = disable_raw_mode();
    let _ = execute!(writer, DisableMouseCapture, LeaveAlternateScreen, Show);
    let _ = writer.flush();
}

/// Restore stdout from a panic or a failed init.
pub fn emergency_restore() {
    leave_tui_mode(&mut io::stdout());
}
