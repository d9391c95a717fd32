//! Small drawing helpers shared by the screens.

use std::time::Instant;

use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Gauge, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthChar;

use super::theme::Palette;

const SPINNER_FRAMES: [char; 4] = ['◐', '◓', '◑', '◒'];

pub fn spinner(now: Instant, epoch: Instant) -> char {
    let ticks = now.saturating_duration_since(epoch).as_millis() / 120;
    SPINNER_FRAMES[(ticks % SPINNER_FRAMES.len() as u128) as usize]
}

pub fn card<'a>(title: impl Into<Line<'a>>, border: Color, palette: &Palette) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border))
        .title(title)
        .style(Style::default().bg(palette.surface).fg(palette.text))
}

/// A bordered, centred label. Callers register `area` as the tap region.
pub fn button(frame: &mut Frame, area: Rect, label: &str, color: Color, palette: &Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new(Line::styled(
            label.to_string(),
            Style::default().fg(palette.text).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        vertical_center(inner, 1),
    );
}

/// Big number over a caption, used on the home screen.
pub fn count_card(
    frame: &mut Frame,
    area: Rect,
    caption: &str,
    count: Option<usize>,
    color: Color,
    palette: &Palette,
) {
    let block = card(Line::default(), color, palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let value = count.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string());
    let lines = vec![
        Line::styled(value, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Line::styled(caption.to_string(), palette.dim()),
    ];
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        vertical_center(inner, 2),
    );
}

pub fn confidence_meter(frame: &mut Frame, area: Rect, confidence: u8, color: Color, palette: &Palette) {
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(color).bg(palette.surface))
        .percent(u16::from(confidence.min(100)))
        .label(Span::styled(
            format!("{}% confidence", confidence),
            Style::default().fg(palette.text).add_modifier(Modifier::BOLD),
        ));
    frame.render_widget(gauge, area);
}

pub fn message(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    frame.render_widget(
        Paragraph::new(text.to_string())
            .style(style)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        vertical_center(area, 1),
    );
}

/// Split `area` into `count` equal columns.
pub fn columns(area: Rect, count: usize) -> Vec<Rect> {
    if count == 0 {
        return Vec::new();
    }
    Layout::horizontal(vec![Constraint::Ratio(1, count as u32); count])
        .split(area)
        .to_vec()
}

/// A `height`-row strip centred vertically in `area`.
pub fn vertical_center(area: Rect, height: u16) -> Rect {
    let height = height.min(area.height);
    Rect {
        y: area.y + (area.height - height) / 2,
        height,
        ..area
    }
}

/// Hard-wrap `text` to `width` display columns, keeping words together
/// where possible. Blank source lines are preserved.
pub fn wrap_text(text: &str, width: u16) -> Vec<String> {
    let width = usize::from(width.max(1));
    let mut out = Vec::new();
    for source in text.lines() {
        if source.trim().is_empty() {
            out.push(String::new());
            continue;
        }
        let mut line = String::new();
        let mut line_width = 0;
        for word in source.split_whitespace() {
            let word_width: usize = word.chars().map(|c| c.width().unwrap_or(0)).sum();
            let sep = usize::from(!line.is_empty());
            if line_width + sep + word_width > width && !line.is_empty() {
                out.push(std::mem::take(&mut line));
                line_width = 0;
            }
            if word_width > width {
                for c in word.chars() {
                    let w = c.width().unwrap_or(0);
                    if line_width + w > width {
                        out.push(std::mem::take(&mut line));
                        line_width = 0;
                    }
                    line.push(c);
                    line_width += w;
                }
                continue;
            }
            if !line.is_empty() {
                line.push(' ');
                line_width += 1;
            }
            line.push_str(word);
            line_width += word_width;
        }
        if !line.is_empty() {
            out.push(line);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text_breaks_on_words() {
        let lines = wrap_text("fix flaky auth test\n\nship it", 10);
        assert_eq!(lines, vec!["fix flaky", "auth test", "", "ship it"]);
    }

    #[test]
    fn test_wrap_text_splits_long_words() {
        let lines = wrap_text("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_columns_cover_area() {
        let cols = columns(Rect::new(0, 0, 30, 3), 3);
        assert_eq!(cols.len(), 3);
        assert_eq!(cols.iter().map(|r| r.width).sum::<u16>(), 30);
        assert!(columns(Rect::new(0, 0, 30, 3), 0).is_empty());
    }

    #[test]
    fn test_vertical_center() {
        let r = vertical_center(Rect::new(0, 0, 10, 5), 1);
        assert_eq!(r, Rect::new(0, 2, 10, 1));
        let r = vertical_center(Rect::new(0, 0, 10, 1), 3);
        assert_eq!(r.height, 1);
    }
}
