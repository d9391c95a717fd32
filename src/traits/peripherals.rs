//! Feedback hardware abstraction: LED strip, buzzer and push button.
//!
//! Calls are fire-and-forget and never fail. Implementations animate and
//! play on their own threads and must never touch screen state.

use std::sync::Arc;

use crate::hardware::{LedPattern, Melody, Rgb};

/// Invoked from the button thread on a debounced press.
pub type ButtonListener = Arc<dyn Fn() + Send + Sync>;

pub trait Peripherals: Send + Sync {
    fn set_led_pattern(&self, pattern: LedPattern);

    fn led_pattern(&self) -> LedPattern;

    /// Colour of the first LED in the current animation frame.
    fn led_color(&self) -> Rgb;

    fn play_sound(&self, melody: Melody);

    /// Replace the button listener. `None` detaches it.
    fn set_button_listener(&self, listener: Option<ButtonListener>);

    /// Simulate a physical press (keyboard `d`).
    fn press_button(&self);

    /// Stop animation threads and turn the strip off.
    fn shutdown(&self) {}
}
