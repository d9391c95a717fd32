//! Swipe-to-review pull request triage.
//!
//! Swipe right approves, swipe left requests changes and swipe up skips.
//! Each pull is analysed by the assistant when it comes into view.

use futures::FutureExt;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use crate::error::DashError;
use crate::input::Gesture;
use crate::models::{truncate_chars, CiState, PullInsight, PullRequest, ReviewVerdict, RiskLevel};
use crate::traits::AssistantRequest;
use crate::ui::interaction::HitRegions;
use crate::ui::widgets;

use super::{
    RefreshJob, RenderContext, Screen, ScreenEvent, ScreenId, ScreenStatus, ScreenTasks, Services,
};

const PULL_WARNING: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriageButton {
    Reject,
    Skip,
    Approve,
    RetryAnalysis,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Analysis {
    None,
    Loading,
    Ready(PullInsight),
    Failed,
}

pub struct PrTriageScreen {
    services: Services,
    tasks: ScreenTasks,
    pulls: Vec<PullRequest>,
    index: usize,
    analysis: Analysis,
    /// Pull number the current analysis belongs to.
    analysed: Option<u64>,
    notice: Option<String>,
}

impl PrTriageScreen {
    pub fn new(services: Services, tasks: ScreenTasks) -> Self {
        Self {
            services,
            tasks,
            pulls: Vec::new(),
            index: 0,
            analysis: Analysis::None,
            analysed: None,
            notice: None,
        }
    }

    pub fn current(&self) -> Option<&PullRequest> {
        self.pulls.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    fn analyse_current(&mut self) {
        let Some(pull) = self.current().cloned() else {
            return;
        };
        self.analysis = Analysis::Loading;
        self.analysed = Some(pull.number);

        let code_host = self.services.code_host.clone();
        let assistant = self.services.assistant.clone();
        self.tasks.spawn_streaming("analyze_pull", pull.number, move |deltas| async move {
            let number = pull.number;
            let result = async {
                let diff = code_host.pull_diff(&pull.repo, pull.number).await?;
                let reply = assistant
                    .send(AssistantRequest::AnalyzePull { pull, diff }, deltas)
                    .await?;
                Ok::<_, DashError>(reply.pull_insight())
            }
            .await
            .map_err(|err| {
                tracing::error!(pull = number, error = %err, "pull analysis failed");
                err.user_message()
            });
            ScreenEvent::PullInsight { number, result }
        });
    }

    /// Move to the next pull (wrapping) and analyse it.
    fn advance(&mut self) {
        if self.pulls.is_empty() {
            return;
        }
        self.index = (self.index + 1) % self.pulls.len();
        self.analysis = Analysis::None;
        self.analysed = None;
        self.analyse_current();
    }

    fn review(&mut self, verdict: ReviewVerdict) {
        let Some(pull) = self.current().cloned() else {
            return;
        };
        let body = match (&verdict, &self.analysis) {
            (ReviewVerdict::RequestChanges, Analysis::Ready(PullInsight {
                concern: Some(concern),
                ..
            })) => format!("Changes requested from DevDash: {}", concern),
            (ReviewVerdict::RequestChanges, _) => "Changes requested from DevDash.".to_string(),
            (ReviewVerdict::Approve, _) => "Approved from DevDash.".to_string(),
        };
        tracing::info!(pull = %pull.reference(), verdict = verdict.api_event(), "submitting review");

        let code_host = self.services.code_host.clone();
        self.tasks.spawn("submit_review", async move {
            let result = code_host
                .submit_review(&pull.repo, pull.number, verdict, &body)
                .await
                .map_err(|err| {
                    tracing::error!(pull = %pull.reference(), error = %err, "review failed");
                    err.user_message()
                });
            ScreenEvent::ReviewSubmitted {
                number: pull.number,
                verdict,
                result,
            }
        });
        self.advance();
    }

    fn render_pull(
        &self,
        frame: &mut Frame,
        area: Rect,
        pull: &PullRequest,
        regions: &mut HitRegions<TriageButton>,
        ctx: &RenderContext,
    ) {
        let palette = &ctx.palette;
        let border = match &self.analysis {
            Analysis::Ready(insight) => palette.risk(insight.risk),
            Analysis::Failed => palette.error,
            _ => palette.primary,
        };
        let block = widgets::card(
            Line::styled(
                truncate_chars(&format!(" #{} {} ", pull.number, pull.title), area.width as usize),
                palette.title(),
            ),
            border,
            palette,
        );
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let ci = match pull.ci_status {
            CiState::Success => Span::styled("CI ok", palette.dim().fg(palette.success)),
            CiState::Failure => Span::styled("CI failing", palette.dim().fg(palette.error)),
            CiState::Pending => Span::styled("CI pending", palette.dim().fg(palette.warning)),
            CiState::Unknown => Span::styled("CI ?", palette.dim()),
        };
        let mut lines = vec![
            Line::from(vec![
                Span::styled(
                    format!("@{} · {} files · ", pull.author, pull.files_changed),
                    palette.dim(),
                ),
                ci,
            ]),
            Line::styled(pull.repo.clone(), palette.dim()),
        ];

        match &self.analysis {
            Analysis::None => {}
            Analysis::Loading => lines.push(Line::styled(
                format!("{} Analyzing...", widgets::spinner(ctx.now, ctx.epoch)),
                palette.dim().fg(palette.info),
            )),
            Analysis::Ready(insight) => {
                lines.push(Line::styled(insight.summary.clone(), palette.base()));
                if insight.risk != RiskLevel::Unknown {
                    lines.push(Line::styled(
                        format!("RISK: {}", insight.risk),
                        palette
                            .base()
                            .fg(palette.risk(insight.risk))
                            .add_modifier(Modifier::BOLD),
                    ));
                }
                if let Some(concern) = &insight.concern {
                    lines.push(Line::styled(
                        format!("CONCERN: {}", concern),
                        palette.dim().fg(palette.warning),
                    ));
                }
            }
            Analysis::Failed => {
                lines.push(Line::styled(
                    "Analysis unavailable. Tap to retry.",
                    palette.dim().fg(palette.error),
                ));
                regions.register(inner, TriageButton::RetryAnalysis);
            }
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
    }
}

impl Screen for PrTriageScreen {
    type Button = TriageButton;

    fn id(&self) -> ScreenId {
        ScreenId::PrTriage
    }

    fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        regions: &mut HitRegions<TriageButton>,
        ctx: &RenderContext,
    ) {
        let palette = &ctx.palette;
        let [header, body, notice, buttons] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .areas(area);

        let total = self.pulls.len();
        let position = if total == 0 { 0 } else { self.index + 1 };
        let [title_area, count_area] =
            Layout::horizontal([Constraint::Min(10), Constraint::Length(12)]).areas(header);
        frame.render_widget(Paragraph::new(Line::styled("PR Triage", palette.title())), title_area);
        frame.render_widget(
            Paragraph::new(Line::styled(format!("{} of {}", position, total), palette.dim()))
                .alignment(Alignment::Right),
            count_area,
        );

        let Some(pull) = self.current().cloned() else {
            widgets::message(
                frame,
                body,
                "No pending PRs. You're all caught up!",
                palette.base().fg(palette.success),
            );
            return;
        };

        self.render_pull(frame, body, &pull, regions, ctx);

        if let Some(text) = &self.notice {
            frame.render_widget(
                Paragraph::new(Line::styled(text.clone(), palette.dim())).alignment(Alignment::Center),
                notice,
            );
        }

        let cols = widgets::columns(buttons, 3);
        let specs = [
            (TriageButton::Reject, "◀ Reject", palette.error),
            (TriageButton::Skip, "▲ Skip", palette.primary),
            (TriageButton::Approve, "Approve ▶", palette.success),
        ];
        for (rect, (button, label, color)) in cols.iter().zip(specs) {
            widgets::button(frame, *rect, label, color, palette);
            regions.register(*rect, button);
        }
    }

    fn refresh(&mut self) -> Option<RefreshJob> {
        let cache = self.services.cache.clone();
        let repos = self.services.config.github.repos.clone();
        Some(async move { Ok::<_, DashError>(ScreenEvent::Pulls(cache.pending_pulls(&repos).await?)) }.boxed())
    }

    fn on_enter(&mut self) {
        if !self.pulls.is_empty() && self.analysis == Analysis::None {
            self.analyse_current();
        }
    }

    fn on_leave(&mut self) {
        // Results of the in-flight analysis will be dropped.
        if self.analysis == Analysis::Loading {
            self.analysis = Analysis::None;
            self.analysed = None;
        }
    }

    fn on_button(&mut self, button: TriageButton) {
        match button {
            TriageButton::Approve => self.review(ReviewVerdict::Approve),
            TriageButton::Reject => self.review(ReviewVerdict::RequestChanges),
            TriageButton::Skip => self.advance(),
            TriageButton::RetryAnalysis => self.analyse_current(),
        }
    }

    fn on_swipe_right(&mut self, _gesture: &Gesture) -> bool {
        if self.pulls.is_empty() {
            return false;
        }
        self.review(ReviewVerdict::Approve);
        true
    }

    fn on_swipe_left(&mut self, _gesture: &Gesture) -> bool {
        if self.pulls.is_empty() {
            return false;
        }
        self.review(ReviewVerdict::RequestChanges);
        true
    }

    fn on_swipe_up(&mut self, _gesture: &Gesture) {
        self.advance();
    }

    fn apply(&mut self, event: ScreenEvent) {
        match event {
            ScreenEvent::Pulls(pulls) => {
                let previous = self.current().map(|p| p.number);
                self.pulls = pulls;
                if self.index >= self.pulls.len() {
                    self.index = 0;
                }
                if self.current().map(|p| p.number) != previous {
                    self.analysis = Analysis::None;
                    self.analysed = None;
                }
            }
            ScreenEvent::PullInsight { number, result } => {
                if self.analysed != Some(number) {
                    return;
                }
                self.analysis = match result {
                    Ok(insight) => Analysis::Ready(insight),
                    Err(_) => Analysis::Failed,
                };
            }
            ScreenEvent::ReviewSubmitted {
                number,
                verdict,
                result,
            } => {
                self.notice = Some(match (verdict, result) {
                    (ReviewVerdict::Approve, Ok(())) => format!("Approved #{}", number),
                    (ReviewVerdict::RequestChanges, Ok(())) => {
                        format!("Requested changes on #{}", number)
                    }
                    (_, Err(message)) => format!("Review of #{} failed: {}", number, message),
                });
            }
            _ => {}
        }
    }

    fn status(&self) -> ScreenStatus {
        if self.pulls.len() > PULL_WARNING {
            ScreenStatus::Warning
        } else {
            ScreenStatus::Success
        }
    }
}
