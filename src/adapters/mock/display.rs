//! [`RenderTarget`] over ratatui's `TestBackend`, with failure injection.

use ratatui::backend::TestBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::{Frame, Terminal};

use crate::error::UiError;
use crate::traits::RenderTarget;

pub struct TestDisplay {
    terminal: Terminal<TestBackend>,
    fail_draws: usize,
    fail_reinit: bool,
    draws: usize,
    reinits: usize,
}

impl TestDisplay {
    pub fn new(width: u16, height: u16) -> Result<Self, UiError> {
        let terminal =
            Terminal::new(TestBackend::new(width, height)).map_err(|err| UiError::TerminalInit {
                message: err.to_string(),
            })?;
        Ok(Self {
            terminal,
            fail_draws: 0,
            fail_reinit: false,
            draws: 0,
            reinits: 0,
        })
    }

    /// The next `count` draws fail.
    pub fn fail_next_draws(&mut self, count: usize) {
        self.fail_draws = count;
    }

    pub fn fail_reinit(&mut self, fail: bool) {
        self.fail_reinit = fail;
    }

    /// Successful draws so far.
    pub fn draws(&self) -> usize {
        self.draws
    }

    pub fn reinits(&self) -> usize {
        self.reinits
    }

    pub fn buffer(&self) -> &Buffer {
        self.terminal.backend().buffer()
    }

    /// Rendered cells as text, one line per row.
    pub fn contents(&self) -> String {
        let buffer = self.buffer();
        let area = buffer.area;
        let mut out = String::new();
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }
}

impl RenderTarget for TestDisplay {
    fn draw<F>(&mut self, render: F) -> Result<(), UiError>
    where
        F: FnOnce(&mut Frame),
    {
        if self.fail_draws > 0 {
            self.fail_draws -= 1;
            return Err(UiError::Render {
                component: "frame".to_string(),
                message: "injected failure".to_string(),
            });
        }
        self.terminal
            .draw(render)
            .map_err(|err| UiError::Render {
                component: "frame".to_string(),
                message: err.to_string(),
            })?;
        self.draws += 1;
        Ok(())
    }

    fn reinit(&mut self) -> Result<(), UiError> {
        self.reinits += 1;
        if self.fail_reinit {
            return Err(UiError::TerminalInit {
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn size(&self) -> Result<Rect, UiError> {
        Ok(self.buffer().area)
    }
}
