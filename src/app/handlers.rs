//! Gesture and message dispatch.

use crate::input::{Gesture, GestureKind};

use super::{App, AppMessage};

impl App {
    /// Route one gesture to the current screen. Horizontal swipes the screen
    /// does not consume navigate: left goes forward, right goes back.
    pub fn dispatch(&mut self, gesture: &Gesture) {
        let consumed = self.pages[self.current].gesture(gesture);
        if consumed {
            return;
        }
        match gesture.kind {
            GestureKind::SwipeLeft => {
                self.navigate(1);
            }
            GestureKind::SwipeRight => {
                self.navigate(-1);
            }
            _ => {}
        }
    }

    pub fn handle_message(&mut self, message: AppMessage) {
        match message {
            AppMessage::Screen {
                screen,
                generation,
                event,
            } => {
                let Some(page) = self.page_mut(screen) else {
                    return;
                };
                if let Some(generation) = generation {
                    if generation != page.generation() {
                        tracing::debug!(
                            screen = %screen,
                            stale = generation,
                            current = page.generation(),
                            "dropping stale result"
                        );
                        return;
                    }
                }
                page.apply(event);
            }
            AppMessage::NavigateTo(screen) => {
                self.navigate_to(screen.name());
            }
            AppMessage::ButtonPressed { screen } => {
                if screen == self.current_id() {
                    self.pages[self.current].hardware_button();
                } else {
                    tracing::debug!(screen = %screen, "button press for inactive screen dropped");
                }
            }
            AppMessage::SystemStats(snapshot) => self.stats = snapshot,
            AppMessage::RefreshNow => self.last_refresh = None,
            AppMessage::Shutdown => self.quit(),
        }
    }
}
