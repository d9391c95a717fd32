use chrono::Local;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::App;
use crate::hardware::Rgb;
use crate::screens::{RenderContext, ScreenStatus};

use super::theme::{led_color, Palette};

pub const CLOCK_FORMAT: &str = "%H:%M  %a %b %d";

pub fn status_dot(status: ScreenStatus, palette: &Palette) -> Span<'static> {
    Span::styled("●", Style::default().fg(palette.status(status)))
}

/// Clock on the left; temperature, overall status and LED on the right.
pub fn render_status_bar(frame: &mut Frame, area: Rect, app: &App, ctx: &RenderContext) {
    let palette = &ctx.palette;
    let style = Style::default().bg(palette.surface).fg(palette.text);

    let led = app.services().peripherals.led_color();
    let led_fg = if led == Rgb::BLACK {
        palette.text_dim
    } else {
        led_color(led)
    };
    let mut right = Vec::new();
    let temp = app.stats().temp_label();
    if !temp.is_empty() {
        right.push(Span::styled(temp, palette.dim()));
        right.push(Span::raw(" "));
    }
    right.push(status_dot(app.overall_status(), palette));
    right.push(Span::raw(" "));
    right.push(Span::styled("■", Style::default().fg(led_fg)));
    right.push(Span::raw(" "));

    let [left_area, right_area] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(14)]).areas(area);
    frame.render_widget(
        Paragraph::new(Line::from(format!(" {}", Local::now().format(CLOCK_FORMAT)))).style(style),
        left_area,
    );
    frame.render_widget(
        Paragraph::new(Line::from(right))
            .alignment(Alignment::Right)
            .style(style),
        right_area,
    );
}
