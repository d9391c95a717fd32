use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::screens::ScreenId;

use super::theme::Palette;
use super::widgets::columns;

/// One tab per screen. The current tab is bold on the primary colour.
pub fn render_nav_bar(frame: &mut Frame, area: Rect, screens: &[ScreenId], current: usize, palette: &Palette) {
    for (index, (cell, id)) in columns(area, screens.len()).into_iter().zip(screens).enumerate() {
        let style = if index == current {
            Style::default()
                .bg(palette.primary)
                .fg(palette.text)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().bg(palette.surface).fg(palette.text_dim)
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::raw(id.title())))
                .style(style)
                .alignment(ratatui::layout::Alignment::Center),
            cell,
        );
    }
}
