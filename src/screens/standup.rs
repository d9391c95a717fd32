//! Daily standup generated from recent repository activity.

use chrono::{DateTime, Local, NaiveDate, Timelike, Utc};
use futures::future::join_all;
use futures::FutureExt;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::error::{DashError, DashResult};
use crate::input::Gesture;
use crate::models::{truncate_chars, RepoActivity, StandupRecord};
use crate::system::copy_to_clipboard;
use crate::traits::AssistantRequest;
use crate::ui::interaction::HitRegions;
use crate::ui::widgets;

use super::{RefreshJob, RenderContext, Screen, ScreenEvent, ScreenId, ScreenTasks, Services};

pub const VISIBLE_LINES: usize = 8;
const SCROLL_STEP: usize = 3;
/// Lines kept in view when scrolled to the end.
const SCROLL_TAIL: usize = 6;
const STREAM_LINES: usize = 6;

pub const GENERATION_FAILED: &str = "Standup generation failed. Tap to retry.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandupButton {
    Generate,
    Copy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StandupState {
    Empty,
    Generating(String),
    Ready,
    Failed,
}

pub struct StandupScreen {
    services: Services,
    tasks: ScreenTasks,
    state: StandupState,
    content: String,
    lines: Vec<String>,
    scroll: usize,
    generated_for: Option<NaiveDate>,
    auto_attempted: Option<NaiveDate>,
    notice: Option<String>,
    stream: u64,
}

impl StandupScreen {
    pub fn new(services: Services, tasks: ScreenTasks) -> Self {
        Self {
            services,
            tasks,
            state: StandupState::Empty,
            content: String::new(),
            lines: Vec::new(),
            scroll: 0,
            generated_for: None,
            auto_attempted: None,
            notice: None,
            stream: 0,
        }
    }

    pub fn state(&self) -> &StandupState {
        &self.state
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    fn set_content(&mut self, content: String, date: NaiveDate) {
        self.lines = content.lines().map(str::to_string).collect();
        self.content = content;
        self.scroll = 0;
        self.generated_for = Some(date);
        self.state = StandupState::Ready;
    }

    /// Whether a refresh at `now` should generate a missing standup.
    pub fn should_auto_generate(&self, now: DateTime<Local>) -> bool {
        let today = now.date_naive();
        now.hour() >= self.services.config.standup.schedule_hour
            && self.generated_for != Some(today)
            && self.auto_attempted != Some(today)
            && !matches!(self.state, StandupState::Generating(_))
    }

    fn load_cached(&mut self) {
        let cache = self.services.cache.clone();
        self.tasks.spawn("load_standup", async move {
            let record = cache.latest_standup().await.unwrap_or_else(|err| {
                tracing::warn!(error = %err, "cached standup unavailable");
                None
            });
            ScreenEvent::StandupLoaded(record)
        });
    }

    fn generate(&mut self) {
        if matches!(self.state, StandupState::Generating(_)) {
            return;
        }
        self.state = StandupState::Generating(String::new());
        self.notice = None;
        self.stream += 1;

        let services = self.services.clone();
        self.tasks.spawn_streaming("generate_standup", self.stream, move |deltas| async move {
            let result = generate_standup(&services, deltas).await.map_err(|err| {
                tracing::error!(error = %err, "standup generation failed");
                err.user_message()
            });
            ScreenEvent::StandupGenerated(result)
        });
    }

    fn copy(&mut self) {
        let content = self.content.clone();
        self.tasks.spawn("copy_standup", async move {
            let result = copy_to_clipboard(content).await.map_err(|err| {
                tracing::warn!(error = %err, "clipboard copy failed");
                err.user_message()
            });
            ScreenEvent::StandupCopied(result)
        });
    }
}

/// Gather activity, ask for the standup and cache it under today's date.
async fn generate_standup(
    services: &Services,
    deltas: tokio::sync::mpsc::UnboundedSender<String>,
) -> DashResult<String> {
    let config = &services.config;
    let lookback = config.standup.lookback_hours;

    let activity: Vec<RepoActivity> = join_all(config.github.repos.iter().map(|repo| {
        let code_host = services.code_host.clone();
        async move {
            code_host
                .recent_activity(repo, lookback)
                .await
                .unwrap_or_else(|err| {
                    tracing::warn!(repo = %repo, error = %err, "activity unavailable");
                    RepoActivity {
                        repo: repo.clone(),
                        ..Default::default()
                    }
                })
        }
    }))
    .await;

    let open_pulls = services.cache.pending_pulls(&config.github.repos).await?.len();
    let failing_runs = services.cache.failed_runs(None).await?.len();
    let date = Local::now().date_naive();

    let reply = services
        .assistant
        .send(
            AssistantRequest::Standup {
                date,
                activity,
                open_pulls,
                failing_runs,
            },
            deltas,
        )
        .await?;
    let content = reply.text.trim().to_string();

    let record = StandupRecord {
        date,
        content: content.clone(),
        created_at: Utc::now(),
    };
    if let Err(err) = services.cache.save_standup(&record).await {
        tracing::warn!(error = %err, "standup not cached");
    }
    Ok(content)
}

impl Screen for StandupScreen {
    type Button = StandupButton;

    fn id(&self) -> ScreenId {
        ScreenId::Standup
    }

    fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        regions: &mut HitRegions<StandupButton>,
        ctx: &RenderContext,
    ) {
        let palette = &ctx.palette;
        let [header, body, footer, buttons] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .areas(area);

        let [title_area, date_area] =
            Layout::horizontal([Constraint::Min(10), Constraint::Length(12)]).areas(header);
        frame.render_widget(Paragraph::new(Line::styled("Morning Standup", palette.title())), title_area);
        frame.render_widget(
            Paragraph::new(Line::styled(Local::now().format("%a %b %d").to_string(), palette.dim()))
                .alignment(Alignment::Right),
            date_area,
        );

        let width = body.width.saturating_sub(1) as usize;
        match &self.state {
            StandupState::Generating(streamed) => {
                let mut lines = vec![Line::styled(
                    format!("{} Generating standup...", widgets::spinner(ctx.now, ctx.epoch)),
                    palette.dim().fg(palette.info),
                )];
                let streamed: Vec<&str> = streamed.lines().collect();
                let skip = streamed.len().saturating_sub(STREAM_LINES);
                lines.extend(
                    streamed[skip..]
                        .iter()
                        .map(|l| Line::styled(truncate_chars(l, width), palette.base())),
                );
                frame.render_widget(Paragraph::new(lines), body);
            }
            StandupState::Empty | StandupState::Failed => {
                let (text, style) = if self.state == StandupState::Failed {
                    (GENERATION_FAILED, palette.base().fg(palette.error))
                } else {
                    ("Tap to generate today's standup", palette.dim())
                };
                widgets::message(frame, body, text, style);
                regions.register(body, StandupButton::Generate);
                widgets::button(frame, buttons, "Generate Standup", palette.primary, palette);
                regions.register(buttons, StandupButton::Generate);
            }
            StandupState::Ready => {
                let end = (self.scroll + VISIBLE_LINES).min(self.lines.len());
                let lines: Vec<Line> = self.lines[self.scroll.min(end)..end]
                    .iter()
                    .map(|l| {
                        let style = if l.trim_end().ends_with(':') {
                            palette.base().fg(palette.accent)
                        } else {
                            palette.base()
                        };
                        Line::styled(truncate_chars(l, width), style)
                    })
                    .collect();
                frame.render_widget(Paragraph::new(lines), body);

                let hint = match &self.notice {
                    Some(notice) => Line::styled(notice.clone(), palette.dim()),
                    None if end < self.lines.len() => Line::styled("↓ swipe up for more", palette.dim()),
                    None => Line::default(),
                };
                frame.render_widget(Paragraph::new(hint).alignment(Alignment::Center), footer);

                widgets::button(frame, buttons, "Copy to Clipboard", palette.primary, palette);
                regions.register(buttons, StandupButton::Copy);
            }
        }
    }

    /// Picks up a standup generated elsewhere today. Auto-generation
    /// happens when the result is applied.
    fn refresh(&mut self) -> Option<RefreshJob> {
        let cache = self.services.cache.clone();
        Some(async move { Ok::<_, DashError>(ScreenEvent::StandupLoaded(cache.latest_standup().await?)) }.boxed())
    }

    fn on_enter(&mut self) {
        if self.generated_for != Some(Local::now().date_naive()) {
            self.load_cached();
        }
    }

    fn on_leave(&mut self) {
        if matches!(self.state, StandupState::Generating(_)) {
            self.state = if self.lines.is_empty() {
                StandupState::Empty
            } else {
                StandupState::Ready
            };
        }
    }

    fn on_button(&mut self, button: StandupButton) {
        match button {
            StandupButton::Generate => self.generate(),
            StandupButton::Copy => self.copy(),
        }
    }

    fn on_swipe_up(&mut self, _gesture: &Gesture) {
        if !self.lines.is_empty() {
            let max = self.lines.len().saturating_sub(SCROLL_TAIL);
            self.scroll = (self.scroll + SCROLL_STEP).min(max);
        }
    }

    fn on_swipe_down(&mut self, _gesture: &Gesture) {
        self.scroll = self.scroll.saturating_sub(SCROLL_STEP);
    }

    fn apply(&mut self, event: ScreenEvent) {
        match event {
            ScreenEvent::StandupLoaded(record) => {
                let now = Local::now();
                let today = now.date_naive();
                match record {
                    Some(record) if record.date == today => {
                        if self.generated_for != Some(today)
                            && !matches!(self.state, StandupState::Generating(_))
                        {
                            self.set_content(record.content, record.date);
                        }
                    }
                    _ if self.should_auto_generate(now) => {
                        tracing::info!("generating scheduled standup");
                        self.auto_attempted = Some(today);
                        self.generate();
                    }
                    _ => {}
                }
            }
            ScreenEvent::Delta { stream, text } => {
                if stream != self.stream {
                    return;
                }
                if let StandupState::Generating(buffer) = &mut self.state {
                    buffer.push_str(&text);
                }
            }
            ScreenEvent::StandupGenerated(result) => match result {
                Ok(content) => self.set_content(content, Local::now().date_naive()),
                Err(_) => self.state = StandupState::Failed,
            },
            ScreenEvent::StandupCopied(result) => {
                self.notice = Some(match result {
                    Ok(()) => "Copied to clipboard".to_string(),
                    Err(message) => message,
                });
            }
            _ => {}
        }
    }
}
