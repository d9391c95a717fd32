//! Animated octocat avatar.
//!
//! The avatar is a small mood state machine driven by wall-clock time:
//! - idle blinks for [`BLINK_DURATION`] every [`BLINK_PERIOD`]
//! - thinking makes the pupils wander
//! - speaking opens and closes the mouth
//! - happy fades back to idle after [`HAPPY_DECAY`]

use std::time::{Duration, Instant};

use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Paragraph, Widget};

use super::theme::Palette;

pub const BLINK_PERIOD: Duration = Duration::from_millis(3600);
pub const BLINK_DURATION: Duration = Duration::from_millis(130);
pub const HAPPY_DECAY: Duration = Duration::from_millis(2500);

/// Height of the rendered avatar in rows.
pub const AVATAR_HEIGHT: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mood {
    #[default]
    Idle,
    Listening,
    Thinking,
    Speaking,
    Happy,
}

impl Mood {
    pub fn label(&self) -> &'static str {
        match self {
            Mood::Idle => "idle",
            Mood::Listening => "listening",
            Mood::Thinking => "thinking",
            Mood::Speaking => "speaking",
            Mood::Happy => "happy",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Avatar {
    mood: Mood,
    mood_since: Instant,
    born: Instant,
}

impl Avatar {
    pub fn new(now: Instant) -> Self {
        Self {
            mood: Mood::Idle,
            mood_since: now,
            born: now,
        }
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    /// Time in the current mood resets only when the mood changes.
    pub fn set_mood(&mut self, mood: Mood, now: Instant) {
        if mood != self.mood {
            self.mood = mood;
            self.mood_since = now;
        }
    }

    /// Advance time-based transitions. Call once per frame.
    pub fn update(&mut self, now: Instant) {
        if self.mood == Mood::Happy && self.mood_elapsed(now) >= HAPPY_DECAY {
            self.set_mood(Mood::Idle, now);
        }
    }

    fn mood_elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.mood_since)
    }

    pub fn is_blinking(&self, now: Instant) -> bool {
        if self.mood != Mood::Idle {
            return false;
        }
        let t = now.saturating_duration_since(self.born).as_secs_f32();
        t % BLINK_PERIOD.as_secs_f32() > (BLINK_PERIOD - BLINK_DURATION).as_secs_f32()
    }

    /// Horizontal pupil shift in cells, -1..=1. Non-zero only while thinking.
    pub fn pupil_offset(&self, now: Instant) -> i16 {
        if self.mood != Mood::Thinking {
            return 0;
        }
        let t = self.mood_elapsed(now).as_secs_f32();
        (t * 1.5).sin().round() as i16
    }

    pub fn mouth_open(&self, now: Instant) -> bool {
        self.mood == Mood::Speaking && (self.mood_elapsed(now).as_secs_f32() * 8.0).sin() > 0.0
    }

    /// The face as text rows.
    pub fn lines(&self, now: Instant) -> Vec<String> {
        let eye = if self.is_blinking(now) {
            '-'
        } else {
            match self.mood {
                Mood::Listening => 'O',
                Mood::Thinking => '°',
                Mood::Happy => '^',
                _ => 'o',
            }
        };
        let eyes = match self.pupil_offset(now) {
            -1 => format!("({0} {0}  )", eye),
            1 => format!("(  {0} {0})", eye),
            _ => format!("( {0} {0} )", eye),
        };
        let mouth = match self.mood {
            Mood::Speaking if self.mouth_open(now) => "o",
            Mood::Speaking => "-",
            Mood::Happy => "▽",
            Mood::Listening => "○",
            Mood::Thinking => "~",
            Mood::Idle => "‿",
        };
        let wave = (now.saturating_duration_since(self.born).as_secs_f32() * 2.5) as usize % 2;
        vec![
            " /\\_/\\ ".to_string(),
            eyes,
            format!("(  {}  )", mouth),
            if wave == 0 { " ~~~~~ " } else { " ~ ~ ~ " }.to_string(),
        ]
    }

    pub fn glow(&self, palette: &Palette) -> Color {
        match self.mood {
            Mood::Idle => palette.text_dim,
            Mood::Listening => palette.info,
            Mood::Thinking => palette.warning,
            Mood::Speaking => palette.success,
            Mood::Happy => palette.accent,
        }
    }
}

/// Draws an [`Avatar`] centred in its area.
pub struct AvatarWidget<'a> {
    avatar: &'a Avatar,
    now: Instant,
    palette: &'a Palette,
}

impl<'a> AvatarWidget<'a> {
    pub fn new(avatar: &'a Avatar, now: Instant, palette: &'a Palette) -> Self {
        Self {
            avatar,
            now,
            palette,
        }
    }
}

impl Widget for AvatarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().fg(self.avatar.glow(self.palette));
        let lines: Vec<Line> = self
            .avatar
            .lines(self.now)
            .into_iter()
            .map(|l| Line::styled(l, style))
            .collect();
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}
