//! Recording [`Peripherals`].

use std::sync::Mutex;

use crate::hardware::{pattern_frame, LedPattern, Melody, Rgb};
use crate::traits::{ButtonListener, Peripherals};

#[derive(Default)]
pub struct MockPeripherals {
    patterns: Mutex<Vec<LedPattern>>,
    melodies: Mutex<Vec<Melody>>,
    listener: Mutex<Option<ButtonListener>>,
    shut_down: Mutex<bool>,
}

impl std::fmt::Debug for MockPeripherals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPeripherals")
            .field("patterns", &self.patterns())
            .field("melodies", &self.melodies())
            .field("has_listener", &self.has_listener())
            .finish()
    }
}

impl MockPeripherals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every pattern set, in order.
    pub fn patterns(&self) -> Vec<LedPattern> {
        self.patterns
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn melodies(&self) -> Vec<Melody> {
        self.melodies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn has_listener(&self) -> bool {
        self.listener
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    pub fn was_shut_down(&self) -> bool {
        *self.shut_down.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Peripherals for MockPeripherals {
    fn set_led_pattern(&self, pattern: LedPattern) {
        self.patterns
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(pattern);
    }

    fn led_pattern(&self) -> LedPattern {
        self.patterns()
            .last()
            .copied()
            .unwrap_or_default()
    }

    fn led_color(&self) -> Rgb {
        pattern_frame(self.led_pattern(), 0.0, 1)
            .first()
            .copied()
            .unwrap_or(Rgb::BLACK)
    }

    fn play_sound(&self, melody: Melody) {
        self.melodies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(melody);
    }

    fn set_button_listener(&self, listener: Option<ButtonListener>) {
        *self.listener.lock().unwrap_or_else(|e| e.into_inner()) = listener;
    }

    /// Invokes the listener immediately, without debounce.
    fn press_button(&self) {
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(listener) = listener {
            listener();
        }
    }

    fn shutdown(&self) {
        *self.shut_down.lock().unwrap_or_else(|e| e.into_inner()) = true;
    }
}
