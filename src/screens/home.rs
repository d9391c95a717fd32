//! Glanceable overview: pending reviews, failing CI and unread notifications.

use std::time::Instant;

use futures::FutureExt;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::error::DashError;
use crate::input::Gesture;
use crate::ui::avatar::{Avatar, AvatarWidget, Mood, AVATAR_HEIGHT};
use crate::ui::interaction::HitRegions;
use crate::ui::widgets;

use super::{
    RefreshJob, RenderContext, Screen, ScreenEvent, ScreenId, ScreenStatus, ScreenTasks, Services,
};

/// Pending pulls above this count turn the status yellow.
const PULL_WARNING: usize = 3;

pub const REFRESH_FAILED: &str = "Refresh failed. Tap to retry.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeButton {
    Pulls,
    Failing,
    Notifications,
    /// Run the failed refresh again.
    Retry,
}

impl HomeButton {
    fn target(&self) -> Option<ScreenId> {
        match self {
            HomeButton::Pulls => Some(ScreenId::PrTriage),
            HomeButton::Failing => Some(ScreenId::CiDiagnosis),
            HomeButton::Notifications => Some(ScreenId::Standup),
            HomeButton::Retry => None,
        }
    }
}

pub struct HomeScreen {
    services: Services,
    tasks: ScreenTasks,
    pulls: Option<usize>,
    failing: Option<usize>,
    notifications: Option<usize>,
    /// Set when the last refresh could not read the cache.
    error: Option<String>,
    avatar: Avatar,
}

impl HomeScreen {
    pub fn new(services: Services, tasks: ScreenTasks, now: Instant) -> Self {
        Self {
            services,
            tasks,
            pulls: None,
            failing: None,
            notifications: None,
            error: None,
            avatar: Avatar::new(now),
        }
    }

    pub fn counts(&self) -> (Option<usize>, Option<usize>, Option<usize>) {
        (self.pulls, self.failing, self.notifications)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn mood(&self) -> Mood {
        self.avatar.mood()
    }

    fn refresh_now(&mut self) {
        self.avatar.set_mood(Mood::Thinking, Instant::now());
        self.tasks.request_refresh();
    }

    fn all_clear(&self) -> bool {
        self.pulls == Some(0) && self.failing == Some(0)
    }

    fn apply_counts(&mut self, pulls: usize, failing: usize, notifications: Option<usize>) {
        self.error = None;
        self.pulls = Some(pulls);
        self.failing = Some(failing);
        if notifications.is_some() {
            self.notifications = notifications;
        }
        let now = Instant::now();
        if self.all_clear() {
            self.avatar.set_mood(Mood::Happy, now);
        } else if self.avatar.mood() == Mood::Thinking {
            self.avatar.set_mood(Mood::Idle, now);
        }
    }
}

impl Screen for HomeScreen {
    type Button = HomeButton;

    fn id(&self) -> ScreenId {
        ScreenId::Home
    }

    fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        regions: &mut HitRegions<HomeButton>,
        ctx: &RenderContext,
    ) {
        let palette = &ctx.palette;
        self.avatar.update(ctx.now);

        let [title_area, avatar_area, cards_area, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(AVATAR_HEIGHT),
            Constraint::Min(4),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(Line::styled("DevDash", palette.title().fg(palette.accent))),
            title_area,
        );
        frame.render_widget(AvatarWidget::new(&self.avatar, ctx.now, palette), avatar_area);

        let cards = widgets::columns(cards_area, 3);
        let specs = [
            (HomeButton::Pulls, "PRs pending", self.pulls, palette.warning),
            (HomeButton::Failing, "CI failing", self.failing, palette.error),
            (HomeButton::Notifications, "unread", self.notifications, palette.info),
        ];
        for (rect, (button, caption, count, color)) in cards.iter().zip(specs) {
            widgets::count_card(frame, *rect, caption, count, color, palette);
            regions.register(*rect, button);
        }

        if self.error.is_some() {
            frame.render_widget(
                Paragraph::new(Line::styled(REFRESH_FAILED, palette.dim().fg(palette.error)))
                    .alignment(Alignment::Center),
                footer_area,
            );
            regions.register(footer_area, HomeButton::Retry);
            return;
        }

        let footer = if self.all_clear() {
            Line::styled("All clear. Nice work.", palette.dim().fg(palette.success))
        } else {
            Line::styled("Swipe to browse, hold to refresh", palette.dim())
        };
        frame.render_widget(Paragraph::new(footer).alignment(Alignment::Center), footer_area);
    }

    fn refresh(&mut self) -> Option<RefreshJob> {
        let cache = self.services.cache.clone();
        let code_host = self.services.code_host.clone();
        let repos = self.services.config.github.repos.clone();
        Some(
            async move {
                let counts = async {
                    let pulls = cache.pending_pulls(&repos).await?.len();
                    let failing = cache.failed_runs(None).await?.len();
                    Ok::<_, DashError>((pulls, failing))
                }
                .await;
                let (pulls, failing) = match counts {
                    Ok(counts) => counts,
                    Err(err) => {
                        tracing::error!(error = %err, "home counts unavailable");
                        return Ok(ScreenEvent::HomeRefreshFailed(err.user_message()));
                    }
                };
                let notifications = match code_host.unread_notifications().await {
                    Ok(count) => Some(count),
                    Err(err) => {
                        tracing::warn!(error = %err, "notification count unavailable");
                        None
                    }
                };
                Ok::<_, DashError>(ScreenEvent::HomeCounts {
                    pulls,
                    failing,
                    notifications,
                })
            }
            .boxed(),
        )
    }

    fn on_button(&mut self, button: HomeButton) {
        tracing::info!(card = ?button, "home card tapped");
        match button.target() {
            Some(target) => self.tasks.navigate_to(target),
            None => self.refresh_now(),
        }
    }

    fn on_long_press(&mut self, _gesture: &Gesture) {
        self.refresh_now();
    }

    fn apply(&mut self, event: ScreenEvent) {
        match event {
            ScreenEvent::HomeCounts {
                pulls,
                failing,
                notifications,
            } => self.apply_counts(pulls, failing, notifications),
            ScreenEvent::HomeRefreshFailed(message) => {
                self.error = Some(message);
                self.avatar.set_mood(Mood::Idle, Instant::now());
            }
            _ => {}
        }
    }

    fn status(&self) -> ScreenStatus {
        if self.failing.unwrap_or(0) > 0 {
            ScreenStatus::Error
        } else if self.error.is_some() || self.pulls.unwrap_or(0) > PULL_WARNING {
            ScreenStatus::Warning
        } else {
            ScreenStatus::Success
        }
    }
}
