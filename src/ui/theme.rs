//! Colour palette built from the `theme` config section.

use ratatui::style::{Color, Modifier, Style};

use crate::config::ThemeConfig;
use crate::hardware::Rgb;
use crate::models::RiskLevel;
use crate::screens::ScreenStatus;

/// Resolved theme colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub surface: Color,
    pub primary: Color,
    pub accent: Color,
    pub text: Color,
    pub text_dim: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self::from_config(&ThemeConfig::default())
    }
}

impl Palette {
    /// Unparseable entries fall back to a terminal colour and are logged.
    pub fn from_config(theme: &ThemeConfig) -> Self {
        let pick = |name: &str, hex: &str, fallback: Color| {
            parse_hex(hex).unwrap_or_else(|| {
                tracing::warn!(key = name, value = hex, "invalid theme colour, using fallback");
                fallback
            })
        };
        Self {
            background: pick("background", &theme.background, Color::Black),
            surface: pick("surface", &theme.surface, Color::DarkGray),
            primary: pick("primary", &theme.primary, Color::Blue),
            accent: pick("accent", &theme.accent, Color::Magenta),
            text: pick("text", &theme.text, Color::White),
            text_dim: pick("text_dim", &theme.text_dim, Color::Gray),
            success: pick("success", &theme.success, Color::Green),
            warning: pick("warning", &theme.warning, Color::Yellow),
            error: pick("error", &theme.error, Color::Red),
            info: pick("info", &theme.info, Color::LightBlue),
        }
    }

    pub fn status(&self, status: ScreenStatus) -> Color {
        match status {
            ScreenStatus::Success => self.success,
            ScreenStatus::Warning => self.warning,
            ScreenStatus::Error => self.error,
        }
    }

    pub fn risk(&self, risk: RiskLevel) -> Color {
        match risk {
            RiskLevel::Low => self.success,
            RiskLevel::Medium => self.warning,
            RiskLevel::High => self.error,
            RiskLevel::Unknown => self.text_dim,
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.text).bg(self.background)
    }

    pub fn dim(&self) -> Style {
        Style::default().fg(self.text_dim)
    }

    pub fn title(&self) -> Style {
        Style::default().fg(self.text).add_modifier(Modifier::BOLD)
    }
}

/// `#rrggbb` (leading `#` optional).
pub fn parse_hex(hex: &str) -> Option<Color> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

pub fn led_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}
