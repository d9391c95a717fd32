//! LED strip patterns and the animation thread.
//!
//! Frames are computed by [`pattern_frame`] from the pattern and an
//! animation clock `t` (seconds) that advances by 0.05 every 50ms.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const FRAME_STEP: Duration = Duration::from_millis(50);
const CLOCK_STEP: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    fn scaled(self, factor: f32) -> Rgb {
        let f = factor.clamp(0.0, 1.0);
        Rgb(
            (self.0 as f32 * f) as u8,
            (self.1 as f32 * f) as u8,
            (self.2 as f32 * f) as u8,
        )
    }
}

const RED: Rgb = Rgb(255, 0, 0);
const GREEN: Rgb = Rgb(0, 255, 0);
const YELLOW: Rgb = Rgb(255, 200, 0);
const BLUE: Rgb = Rgb(0, 100, 255);
const RAINBOW: [Rgb; 6] = [
    Rgb(255, 0, 0),
    Rgb(255, 127, 0),
    Rgb(255, 255, 0),
    Rgb(0, 255, 0),
    Rgb(0, 0, 255),
    Rgb(148, 0, 211),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LedPattern {
    SolidGreen,
    SolidRed,
    SolidYellow,
    BreatheGreen,
    BreatheBlue,
    BreatheYellow,
    BreatheRed,
    FlashRed,
    Celebration,
    #[default]
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Solid,
    Breathe,
    Flash,
    Rainbow,
}

impl LedPattern {
    pub const ALL: [LedPattern; 10] = [
        LedPattern::SolidGreen,
        LedPattern::SolidRed,
        LedPattern::SolidYellow,
        LedPattern::BreatheGreen,
        LedPattern::BreatheBlue,
        LedPattern::BreatheYellow,
        LedPattern::BreatheRed,
        LedPattern::FlashRed,
        LedPattern::Celebration,
        LedPattern::Off,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LedPattern::SolidGreen => "solid_green",
            LedPattern::SolidRed => "solid_red",
            LedPattern::SolidYellow => "solid_yellow",
            LedPattern::BreatheGreen => "breathe_green",
            LedPattern::BreatheBlue => "breathe_blue",
            LedPattern::BreatheYellow => "breathe_yellow",
            LedPattern::BreatheRed => "breathe_red",
            LedPattern::FlashRed => "flash_red",
            LedPattern::Celebration => "celebration",
            LedPattern::Off => "off",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    fn mode(&self) -> Mode {
        match self {
            LedPattern::SolidGreen
            | LedPattern::SolidRed
            | LedPattern::SolidYellow
            | LedPattern::Off => Mode::Solid,
            LedPattern::BreatheGreen
            | LedPattern::BreatheBlue
            | LedPattern::BreatheYellow
            | LedPattern::BreatheRed => Mode::Breathe,
            LedPattern::FlashRed => Mode::Flash,
            LedPattern::Celebration => Mode::Rainbow,
        }
    }

    fn base_color(&self) -> Rgb {
        match self {
            LedPattern::SolidGreen | LedPattern::BreatheGreen => GREEN,
            LedPattern::SolidRed | LedPattern::BreatheRed | LedPattern::FlashRed => RED,
            LedPattern::SolidYellow | LedPattern::BreatheYellow => YELLOW,
            LedPattern::BreatheBlue => BLUE,
            LedPattern::Celebration => RAINBOW[0],
            LedPattern::Off => Rgb::BLACK,
        }
    }
}

/// Colours of all `count` LEDs at animation time `t`.
pub fn pattern_frame(pattern: LedPattern, t: f32, count: usize) -> Vec<Rgb> {
    let base = pattern.base_color();
    match pattern.mode() {
        Mode::Solid => vec![base; count],
        Mode::Breathe => {
            let level = ((t * 2.0).sin() + 1.0) / 2.0;
            vec![base.scaled(level); count]
        }
        Mode::Flash => {
            let on = ((t * 4.0) as i64) % 2 == 0;
            vec![if on { base } else { Rgb::BLACK }; count]
        }
        Mode::Rainbow => {
            let shift = (t * 5.0) as usize;
            (0..count)
                .map(|i| RAINBOW[(i + shift) % RAINBOW.len()])
                .collect()
        }
    }
}

struct StripState {
    pattern: Mutex<LedPattern>,
    lead: Mutex<Rgb>,
    running: AtomicBool,
}

/// Simulated NeoPixel strip animated on its own thread.
pub struct LedStrip {
    state: Arc<StripState>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl LedStrip {
    pub fn start(count: usize) -> Self {
        let state = Arc::new(StripState {
            pattern: Mutex::new(LedPattern::Off),
            lead: Mutex::new(Rgb::BLACK),
            running: AtomicBool::new(true),
        });

        let thread_state = Arc::clone(&state);
        let handle = thread::Builder::new()
            .name("devdash-leds".to_string())
            .spawn(move || animate(thread_state, count.max(1)))
            .map_err(|e| tracing::warn!(error = %e, "LED animation thread failed to start"))
            .ok();

        Self {
            state,
            handle: Mutex::new(handle),
        }
    }

    pub fn set_pattern(&self, pattern: LedPattern) {
        let mut current = self.state.pattern.lock().unwrap_or_else(|e| e.into_inner());
        if *current != pattern {
            tracing::debug!(pattern = pattern.name(), "LED pattern");
            *current = pattern;
        }
    }

    pub fn pattern(&self) -> LedPattern {
        *self.state.pattern.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn lead_color(&self) -> Rgb {
        *self.state.lead.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stop animating and turn the strip off. Idempotent.
    pub fn stop(&self) {
        self.set_pattern(LedPattern::Off);
        self.state.running.store(false, Ordering::SeqCst);
        let handle = self.handle.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
        *self.state.lead.lock().unwrap_or_else(|e| e.into_inner()) = Rgb::BLACK;
    }
}

impl Drop for LedStrip {
    fn drop(&mut self) {
        self.stop();
    }
}

fn animate(state: Arc<StripState>, count: usize) {
    let mut t = 0.0f32;
    while state.running.load(Ordering::SeqCst) {
        let pattern = *state.pattern.lock().unwrap_or_else(|e| e.into_inner());
        let frame = pattern_frame(pattern, t, count);
        *state.lead.lock().unwrap_or_else(|e| e.into_inner()) =
            frame.first().copied().unwrap_or(Rgb::BLACK);

        t += CLOCK_STEP;
        thread::sleep(FRAME_STEP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        for pattern in LedPattern::ALL {
            assert_eq!(LedPattern::parse(pattern.name()), Some(pattern));
        }
        assert_eq!(LedPattern::parse("disco"), None);
    }

    #[test]
    fn test_solid_and_off() {
        assert_eq!(pattern_frame(LedPattern::SolidYellow, 3.0, 2), vec![YELLOW; 2]);
        assert_eq!(pattern_frame(LedPattern::Off, 0.0, 3), vec![Rgb::BLACK; 3]);
    }

    #[test]
    fn test_breathe_follows_sine() {
        // sin(0) = 0 -> half brightness.
        assert_eq!(pattern_frame(LedPattern::BreatheGreen, 0.0, 1)[0], Rgb(0, 127, 0));
        // sin(pi/2) = 1 -> full brightness at t = pi/4.
        let peak = pattern_frame(LedPattern::BreatheBlue, std::f32::consts::FRAC_PI_4, 1)[0];
        assert!(peak.2 >= 254);
    }

    #[test]
    fn test_flash_toggles_at_4hz() {
        assert_eq!(pattern_frame(LedPattern::FlashRed, 0.1, 1)[0], RED);
        assert_eq!(pattern_frame(LedPattern::FlashRed, 0.3, 1)[0], Rgb::BLACK);
        assert_eq!(pattern_frame(LedPattern::FlashRed, 0.5, 1)[0], RED);
    }

    #[test]
    fn test_rainbow_rotates() {
        let frame = pattern_frame(LedPattern::Celebration, 0.0, 8);
        assert_eq!(frame[0], RAINBOW[0]);
        assert_eq!(frame[6], RAINBOW[0]);
        // t = 0.2 -> shift by one.
        assert_eq!(pattern_frame(LedPattern::Celebration, 0.2, 1)[0], RAINBOW[1]);
    }

    #[test]
    fn test_strip_stop_is_idempotent() {
        let strip = LedStrip::start(4);
        strip.set_pattern(LedPattern::SolidRed);
        assert_eq!(strip.pattern(), LedPattern::SolidRed);
        strip.stop();
        strip.stop();
        assert_eq!(strip.pattern(), LedPattern::Off);
        assert_eq!(strip.lead_color(), Rgb::BLACK);
    }
}
