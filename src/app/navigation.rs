//! Navigation methods for the App.
//!
//! Navigation is linear and does not wrap. Every transition runs the old
//! screen's `leave` before the new screen's `enter`, and misses are no-ops
//! that fire no hooks.

use super::App;

impl App {
    /// Move by `direction` (`+1` or `-1`). Returns whether the screen changed.
    pub fn navigate(&mut self, direction: isize) -> bool {
        let Some(target) = self.current.checked_add_signed(direction) else {
            return false;
        };
        if target >= self.pages.len() || target == self.current {
            return false;
        }
        self.switch_to(target);
        true
    }

    /// Switch to the screen called `name`. Unknown names and the current
    /// screen are no-ops.
    pub fn navigate_to(&mut self, name: &str) -> bool {
        let Some(target) = self.pages.iter().position(|p| p.id().name() == name) else {
            tracing::debug!(screen = name, "navigate_to unknown screen");
            return false;
        };
        if target == self.current {
            return false;
        }
        self.switch_to(target);
        true
    }

    fn switch_to(&mut self, target: usize) {
        let from = self.pages[self.current].id();
        self.pages[self.current].leave();
        self.current = target;
        self.pages[self.current].enter();
        tracing::info!(from = %from, to = %self.pages[self.current].id(), "navigate");
    }
}
