//! Simulated device peripherals.
//!
//! The board drives an LED strip, a buzzer and one push button. On a
//! desktop they are simulated: patterns animate in memory (the status bar
//! shows the lead LED), melodies are traced, and `d` presses the button.

pub mod button;
pub mod buzzer;
pub mod leds;

pub use button::Button;
pub use buzzer::{Buzzer, Melody, Note};
pub use leds::{pattern_frame, LedPattern, LedStrip, Rgb};

use crate::config::GpioConfig;
use crate::traits::{ButtonListener, Peripherals};

pub struct Board {
    leds: LedStrip,
    buzzer: Buzzer,
    button: Button,
}

impl Board {
    pub fn from_config(gpio: &GpioConfig) -> Self {
        tracing::info!(
            led_pin = gpio.led_pin,
            led_count = gpio.led_count,
            led_brightness = gpio.led_brightness,
            button_pin = gpio.button_pin,
            buzzer_pin = gpio.buzzer_pin,
            "Peripherals running in simulation mode; press 'd' for the button"
        );
        Self {
            leds: LedStrip::start(gpio.led_count),
            buzzer: Buzzer::new(gpio.buzzer_pin),
            button: Button::new(),
        }
    }
}

impl Peripherals for Board {
    fn set_led_pattern(&self, pattern: LedPattern) {
        self.leds.set_pattern(pattern);
    }

    fn led_pattern(&self) -> LedPattern {
        self.leds.pattern()
    }

    fn led_color(&self) -> Rgb {
        self.leds.lead_color()
    }

    fn play_sound(&self, melody: Melody) {
        self.buzzer.play(melody);
    }

    fn set_button_listener(&self, listener: Option<ButtonListener>) {
        self.button.set_listener(listener);
    }

    fn press_button(&self) {
        self.button.press();
    }

    fn shutdown(&self) {
        self.buzzer.stop();
        self.leds.stop();
    }
}
