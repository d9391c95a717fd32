//! Assessed deploys triggered from the touch screen or the physical button.
//!
//! ```text
//! idle -> analyzing -> ready -> deploying -> success
//!   ^         |          |           \----> failed -> (diagnose | back)
//!   \---------+----------/
//! ```

use chrono::Utc;
use futures::FutureExt;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::text::Line;
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use crate::error::{ConfigError, DashError, DashResult};
use crate::hardware::{LedPattern, Melody};
use crate::models::{truncate_chars, DeployAssessment, DeployOutcome, DeployRecord, RiskLevel};
use crate::traits::AssistantRequest;
use crate::ui::interaction::HitRegions;
use crate::ui::widgets;

use super::{
    RefreshJob, RenderContext, Screen, ScreenEvent, ScreenId, ScreenStatus, ScreenTasks, Services,
};

/// Confidence at or above which the strip breathes green.
pub const HIGH_CONFIDENCE: u8 = 80;
/// Confidence at or above which the strip breathes yellow.
pub const MEDIUM_CONFIDENCE: u8 = 50;

const STREAM_LINES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployButton {
    Analyze,
    Confirm,
    Cancel,
    Diagnose,
    Back,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeployState {
    Idle,
    Analyzing(String),
    Ready(DeployAssessment),
    Deploying(DeployAssessment),
    Success,
    Failed(String),
}

impl DeployState {
    pub fn name(&self) -> &'static str {
        match self {
            DeployState::Idle => "idle",
            DeployState::Analyzing(_) => "analyzing",
            DeployState::Ready(_) => "ready",
            DeployState::Deploying(_) => "deploying",
            DeployState::Success => "success",
            DeployState::Failed(_) => "failed",
        }
    }
}

/// LED pattern reflecting an assessment's confidence.
pub fn confidence_pattern(confidence: u8) -> LedPattern {
    if confidence >= HIGH_CONFIDENCE {
        LedPattern::BreatheGreen
    } else if confidence >= MEDIUM_CONFIDENCE {
        LedPattern::BreatheYellow
    } else {
        LedPattern::BreatheRed
    }
}

pub struct DeployScreen {
    services: Services,
    tasks: ScreenTasks,
    state: DeployState,
    last_deploy: Option<DeployRecord>,
    /// Set when the last analysis failed; shown in the idle state.
    analysis_error: Option<String>,
    /// Key of the latest analysis stream.
    stream: u64,
}

impl DeployScreen {
    pub fn new(services: Services, tasks: ScreenTasks) -> Self {
        Self {
            services,
            tasks,
            state: DeployState::Idle,
            last_deploy: None,
            analysis_error: None,
            stream: 0,
        }
    }

    pub fn state(&self) -> &DeployState {
        &self.state
    }

    pub fn last_deploy(&self) -> Option<&DeployRecord> {
        self.last_deploy.as_ref()
    }

    fn min_confidence(&self) -> u8 {
        self.services.config.deploy.min_confidence
    }

    fn can_deploy(&self, assessment: &DeployAssessment) -> bool {
        assessment.confidence >= self.min_confidence()
    }

    fn start_analysis(&mut self) {
        if !matches!(self.state, DeployState::Idle) {
            return;
        }
        self.state = DeployState::Analyzing(String::new());
        self.analysis_error = None;
        self.stream += 1;

        let services = self.services.clone();
        self.tasks.spawn_streaming("assess_deploy", self.stream, move |deltas| async move {
            let result = async {
                let deploy = &services.config.deploy;
                let open_pulls = services
                    .cache
                    .pending_pulls(&services.config.github.repos)
                    .await?
                    .len();
                let failing_runs = services
                    .cache
                    .failed_runs((!deploy.repo.is_empty()).then_some(deploy.repo.as_str()))
                    .await?
                    .len();
                let reply = services
                    .assistant
                    .send(
                        AssistantRequest::AssessDeploy {
                            repo: deploy.repo.clone(),
                            environment: deploy.environment.clone(),
                            git_ref: deploy.git_ref.clone(),
                            open_pulls,
                            failing_runs,
                        },
                        deltas,
                    )
                    .await?;
                Ok::<_, DashError>(reply.deploy_assessment())
            }
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "deploy assessment failed");
                err.user_message()
            });
            ScreenEvent::DeployAssessed(result)
        });
    }

    fn confirm(&mut self) {
        let DeployState::Ready(assessment) = &self.state else {
            return;
        };
        if !self.can_deploy(assessment) {
            tracing::warn!(
                confidence = assessment.confidence,
                min = self.min_confidence(),
                "deploy blocked below threshold"
            );
            return;
        }
        let assessment = assessment.clone();
        self.state = DeployState::Deploying(assessment.clone());
        self.services.peripherals.set_led_pattern(LedPattern::BreatheBlue);
        self.services.peripherals.play_sound(Melody::Deploy);

        let services = self.services.clone();
        self.tasks.spawn("deploy", async move {
            let deploy = &services.config.deploy;
            let result = dispatch(&services).await;
            let record = DeployRecord {
                repo: deploy.repo.clone(),
                git_ref: deploy.git_ref.clone(),
                confidence: assessment.confidence,
                risk: assessment.risk,
                outcome: if result.is_ok() {
                    DeployOutcome::Success
                } else {
                    DeployOutcome::Failed
                },
                created_at: Utc::now(),
            };
            if let Err(err) = services.cache.save_deploy(&record).await {
                tracing::warn!(error = %err, "deploy record not saved");
            }
            ScreenEvent::DeployFinished(result.map_err(|err| {
                tracing::error!(repo = %deploy.repo, error = %err, "deploy failed");
                err.user_message()
            }))
        });
    }

    fn reset(&mut self) {
        self.state = DeployState::Idle;
        self.services.peripherals.set_led_pattern(LedPattern::Off);
    }

    fn render_ready(
        &self,
        frame: &mut Frame,
        area: Rect,
        assessment: &DeployAssessment,
        regions: &mut HitRegions<DeployButton>,
        ctx: &RenderContext,
    ) {
        let palette = &ctx.palette;
        let [meter, summary, analysis, buttons] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .areas(area);

        let color = palette.risk(assessment.risk);
        widgets::confidence_meter(frame, meter, assessment.confidence, color, palette);
        frame.render_widget(
            Paragraph::new(Line::styled(
                format!(
                    "CONFIDENCE: {}%  |  RISK: {}",
                    assessment.confidence, assessment.risk
                ),
                palette.title().fg(color),
            ))
            .alignment(Alignment::Center),
            summary,
        );
        frame.render_widget(
            Paragraph::new(assessment.analysis.clone())
                .style(palette.dim())
                .wrap(Wrap { trim: true }),
            analysis,
        );

        if self.can_deploy(assessment) {
            let [confirm, cancel] =
                Layout::horizontal([Constraint::Percentage(65), Constraint::Percentage(35)])
                    .areas(buttons);
            widgets::button(frame, confirm, "Confirm Deploy", palette.success, palette);
            regions.register(confirm, DeployButton::Confirm);
            widgets::button(frame, cancel, "Cancel", palette.text_dim, palette);
            regions.register(cancel, DeployButton::Cancel);
        } else {
            let [warning, cancel] =
                Layout::horizontal([Constraint::Percentage(65), Constraint::Percentage(35)])
                    .areas(buttons);
            widgets::message(
                frame,
                warning,
                &format!("Below {}% threshold. Deploy blocked.", self.min_confidence()),
                palette.base().fg(palette.error),
            );
            widgets::button(frame, cancel, "Back", palette.text_dim, palette);
            regions.register(cancel, DeployButton::Cancel);
        }
    }
}

async fn dispatch(services: &Services) -> DashResult<()> {
    let deploy = &services.config.deploy;
    if deploy.repo.is_empty() {
        return Err(ConfigError::MissingValue {
            key: "deploy.repo".to_string(),
        }
        .into());
    }
    services
        .code_host
        .dispatch_workflow(
            &deploy.repo,
            &deploy.workflow,
            &deploy.git_ref,
            serde_json::json!({ "environment": deploy.environment }),
        )
        .await
}

impl Screen for DeployScreen {
    type Button = DeployButton;

    fn id(&self) -> ScreenId {
        ScreenId::Deploy
    }

    fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        regions: &mut HitRegions<DeployButton>,
        ctx: &RenderContext,
    ) {
        let palette = &ctx.palette;
        let [header, target, body, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(4),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(Paragraph::new(Line::styled("Smart Deploy", palette.title())), header);
        let deploy = &self.services.config.deploy;
        let target_text = if deploy.repo.is_empty() {
            "Target: no repo configured".to_string()
        } else {
            format!("Target: {}@{} → {}", deploy.repo, deploy.git_ref, deploy.environment)
        };
        frame.render_widget(
            Paragraph::new(Line::styled(
                truncate_chars(&target_text, target.width as usize),
                palette.dim(),
            )),
            target,
        );

        let state = self.state.clone();
        match &state {
            DeployState::Idle => {
                let [text, button] =
                    Layout::vertical([Constraint::Min(1), Constraint::Length(3)]).areas(body);
                let (message, style) = match &self.analysis_error {
                    Some(_) => ("Analysis failed. Tap to retry.", palette.base().fg(palette.error)),
                    None => ("Press the button to start deploy analysis", palette.dim()),
                };
                widgets::message(frame, text, message, style);
                widgets::button(frame, button, "Start Analysis", palette.primary, palette);
                regions.register(button, DeployButton::Analyze);
            }
            DeployState::Analyzing(streamed) => {
                let mut lines = vec![Line::styled(
                    format!(
                        "{} Analyzing deploy safety...",
                        widgets::spinner(ctx.now, ctx.epoch)
                    ),
                    palette.dim().fg(palette.info),
                )];
                let streamed: Vec<&str> = streamed.lines().collect();
                let skip = streamed.len().saturating_sub(STREAM_LINES);
                lines.extend(
                    streamed[skip..]
                        .iter()
                        .map(|l| Line::styled(l.to_string(), palette.dim())),
                );
                frame.render_widget(Paragraph::new(lines), body);
            }
            DeployState::Ready(assessment) => {
                self.render_ready(frame, body, assessment, regions, ctx);
            }
            DeployState::Deploying(_) => widgets::message(
                frame,
                body,
                "Deploying...",
                palette.title().fg(palette.info),
            ),
            DeployState::Success => {
                let [text, button] =
                    Layout::vertical([Constraint::Min(1), Constraint::Length(3)]).areas(body);
                widgets::message(frame, text, "Deploy Successful!", palette.title().fg(palette.success));
                widgets::button(frame, button, "Done", palette.success, palette);
                regions.register(button, DeployButton::Back);
            }
            DeployState::Failed(message) => {
                let [text, buttons] =
                    Layout::vertical([Constraint::Min(1), Constraint::Length(3)]).areas(body);
                widgets::message(
                    frame,
                    text,
                    &format!("Deploy Failed: {}", message),
                    palette.title().fg(palette.error),
                );
                let [diagnose, back] =
                    Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                        .areas(buttons);
                widgets::button(frame, diagnose, "Diagnose", palette.error, palette);
                regions.register(diagnose, DeployButton::Diagnose);
                widgets::button(frame, back, "Back", palette.text_dim, palette);
                regions.register(back, DeployButton::Back);
            }
        }

        if let Some(last) = &self.last_deploy {
            let color = match last.outcome {
                DeployOutcome::Success => palette.success,
                DeployOutcome::Failed => palette.error,
            };
            frame.render_widget(
                Paragraph::new(Line::styled(
                    format!(
                        "Last: {} {} ({}%) {}",
                        last.git_ref,
                        last.outcome.as_str(),
                        last.confidence,
                        last.created_at.format("%b %d %H:%M")
                    ),
                    palette.dim().fg(color),
                ))
                .alignment(Alignment::Center),
                footer,
            );
        }
    }

    fn refresh(&mut self) -> Option<RefreshJob> {
        let cache = self.services.cache.clone();
        Some(async move { Ok::<_, DashError>(ScreenEvent::DeployHistory(cache.recent_deploys(1).await?)) }.boxed())
    }

    fn on_enter(&mut self) {
        self.services
            .peripherals
            .set_button_listener(Some(self.tasks.button_listener()));
    }

    fn on_leave(&mut self) {
        self.services.peripherals.set_button_listener(None);
        if matches!(self.state, DeployState::Analyzing(_)) {
            self.state = DeployState::Idle;
        }
    }

    fn on_button(&mut self, button: DeployButton) {
        match button {
            DeployButton::Analyze => self.start_analysis(),
            DeployButton::Confirm => self.confirm(),
            DeployButton::Cancel | DeployButton::Back => self.reset(),
            DeployButton::Diagnose => {
                self.reset();
                self.tasks.navigate_to(ScreenId::CiDiagnosis);
            }
        }
    }

    fn on_hardware_button(&mut self) {
        tracing::info!(state = self.state.name(), "deploy button pressed");
        match self.state {
            DeployState::Idle => self.start_analysis(),
            DeployState::Ready(_) => self.confirm(),
            _ => {}
        }
    }

    fn apply(&mut self, event: ScreenEvent) {
        match event {
            ScreenEvent::Delta { stream, text } => {
                if stream != self.stream {
                    return;
                }
                if let DeployState::Analyzing(buffer) = &mut self.state {
                    buffer.push_str(&text);
                }
            }
            ScreenEvent::DeployAssessed(result) => {
                if !matches!(self.state, DeployState::Analyzing(_)) {
                    return;
                }
                match result {
                    Ok(assessment) => {
                        tracing::info!(
                            confidence = assessment.confidence,
                            risk = %assessment.risk,
                            "deploy assessed"
                        );
                        self.services
                            .peripherals
                            .set_led_pattern(confidence_pattern(assessment.confidence));
                        self.state = DeployState::Ready(assessment);
                    }
                    Err(message) => {
                        self.analysis_error = Some(message);
                        self.state = DeployState::Idle;
                    }
                }
            }
            ScreenEvent::DeployFinished(result) => {
                let DeployState::Deploying(assessment) = &self.state else {
                    return;
                };
                let outcome = if result.is_ok() {
                    DeployOutcome::Success
                } else {
                    DeployOutcome::Failed
                };
                let deploy = &self.services.config.deploy;
                self.last_deploy = Some(DeployRecord {
                    repo: deploy.repo.clone(),
                    git_ref: deploy.git_ref.clone(),
                    confidence: assessment.confidence,
                    risk: assessment.risk,
                    outcome,
                    created_at: Utc::now(),
                });
                match result {
                    Ok(()) => {
                        self.state = DeployState::Success;
                        self.services.peripherals.set_led_pattern(LedPattern::Celebration);
                        self.services.peripherals.play_sound(Melody::Success);
                    }
                    Err(message) => {
                        self.state = DeployState::Failed(message);
                        self.services.peripherals.set_led_pattern(LedPattern::FlashRed);
                        self.services.peripherals.play_sound(Melody::Error);
                    }
                }
            }
            ScreenEvent::DeployHistory(records) => {
                if let Some(latest) = records.into_iter().next() {
                    self.last_deploy = Some(latest);
                }
            }
            _ => {}
        }
    }

    fn status(&self) -> ScreenStatus {
        match &self.state {
            DeployState::Failed(_) => ScreenStatus::Error,
            DeployState::Ready(a) if a.risk == RiskLevel::High => ScreenStatus::Warning,
            _ => ScreenStatus::Success,
        }
    }
}
