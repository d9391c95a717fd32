//! Render target abstraction.
//!
//! The run loop draws through this trait so it can be driven against a
//! real terminal or ratatui's `TestBackend`.

use ratatui::layout::Rect;
use ratatui::Frame;

use crate::error::UiError;

pub trait RenderTarget {
    /// Draw and present one frame.
    fn draw<F>(&mut self, render: F) -> Result<(), UiError>
    where
        F: FnOnce(&mut Frame);

    /// Tear down and re-enter TUI mode after a failed draw.
    fn reinit(&mut self) -> Result<(), UiError>;

    fn size(&self) -> Result<Rect, UiError>;
}
