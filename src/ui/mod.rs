//! UI rendering for the DevDash touch screen.
//!
//! Every frame has the same chrome:
//! - status bar: clock, CPU temperature, overall status and lead LED colour
//! - the current screen's content
//! - nav bar: one tab per screen, current highlighted
//!
//! Screens draw into the content area and register tap regions there.

pub mod avatar;
pub mod interaction;
mod nav_bar;
mod status_bar;
pub mod theme;
pub mod widgets;

pub use nav_bar::render_nav_bar;
pub use status_bar::{render_status_bar, status_dot};

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::widgets::Block;
use ratatui::Frame;

use crate::app::App;
use crate::screens::RenderContext;

pub const STATUS_BAR_HEIGHT: u16 = 1;
pub const NAV_BAR_HEIGHT: u16 = 1;

// ============================================================================
// Main UI Rendering
// ============================================================================

/// Split a frame into status bar, content and nav bar.
pub fn layout(area: Rect) -> (Rect, Rect, Rect) {
    let [status, content, nav] = Layout::vertical([
        Constraint::Length(STATUS_BAR_HEIGHT),
        Constraint::Min(0),
        Constraint::Length(NAV_BAR_HEIGHT),
    ])
    .areas(area);
    (status, content, nav)
}

/// Paint the background and both bars. Returns the content area.
pub fn render_chrome(frame: &mut Frame, app: &App, ctx: &RenderContext) -> Rect {
    let area = frame.area();
    frame.render_widget(Block::default().style(ctx.palette.base()), area);

    let (status, content, nav) = layout(area);
    render_status_bar(frame, status, app, ctx);
    render_nav_bar(frame, nav, &app.screen_ids(), app.current_index(), &ctx.palette);
    content
}
