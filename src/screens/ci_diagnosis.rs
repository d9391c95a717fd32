//! Failed workflow runs, diagnosed by the assistant as they arrive.

use futures::FutureExt;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::text::Line;
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use crate::error::DashError;
use crate::models::{truncate_chars, CiRun, RunDiagnosis};
use crate::traits::AssistantRequest;
use crate::ui::interaction::HitRegions;
use crate::ui::widgets;

use super::{
    RefreshJob, RenderContext, Screen, ScreenEvent, ScreenId, ScreenStatus, ScreenTasks, Services,
};

/// Streamed lines shown while a diagnosis is in flight.
const STREAM_LINES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiButton {
    Fix,
    Dismiss,
    Retry,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnosis {
    None,
    Streaming(String),
    Ready(RunDiagnosis),
    Failed,
}

pub struct CiDiagnosisScreen {
    services: Services,
    tasks: ScreenTasks,
    failures: Vec<CiRun>,
    index: usize,
    diagnosis: Diagnosis,
    diagnosed: Option<u64>,
    filing_issue: bool,
    notice: Option<String>,
}

impl CiDiagnosisScreen {
    pub fn new(services: Services, tasks: ScreenTasks) -> Self {
        Self {
            services,
            tasks,
            failures: Vec::new(),
            index: 0,
            diagnosis: Diagnosis::None,
            diagnosed: None,
            filing_issue: false,
            notice: None,
        }
    }

    pub fn current(&self) -> Option<&CiRun> {
        self.failures.get(self.index)
    }

    pub fn diagnosis(&self) -> &Diagnosis {
        &self.diagnosis
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    fn diagnose_current(&mut self) {
        let Some(run) = self.current().cloned() else {
            return;
        };
        self.diagnosis = Diagnosis::Streaming(String::new());
        self.diagnosed = Some(run.run_id);

        let code_host = self.services.code_host.clone();
        let assistant = self.services.assistant.clone();
        self.tasks.spawn_streaming("diagnose_run", run.run_id, move |deltas| async move {
            let run_id = run.run_id;
            let result = async {
                let log = code_host.run_log_summary(&run.repo, run.run_id).await?;
                let reply = assistant
                    .send(AssistantRequest::DiagnoseRun { run, log }, deltas)
                    .await?;
                Ok::<_, DashError>(reply.run_diagnosis())
            }
            .await
            .map_err(|err| {
                tracing::error!(run_id, error = %err, "run diagnosis failed");
                err.user_message()
            });
            ScreenEvent::Diagnosis { run_id, result }
        });
    }

    fn next_failure(&mut self) {
        self.diagnosis = Diagnosis::None;
        self.diagnosed = None;
        if self.failures.is_empty() {
            return;
        }
        self.index = (self.index + 1) % self.failures.len();
        self.diagnose_current();
    }

    /// File an issue carrying the diagnosis against the run's repository.
    fn open_fix_issue(&mut self) {
        let (Some(run), Diagnosis::Ready(diagnosis)) = (self.current().cloned(), &self.diagnosis)
        else {
            return;
        };
        if self.filing_issue {
            return;
        }
        self.filing_issue = true;

        let title = truncate_chars(
            &format!("CI failure in {} (run #{})", run.workflow, run.run_id),
            120,
        );
        let mut body = format!(
            "Workflow **{}** failed on `{}`.\n\n**Diagnosis:** {}\n",
            run.workflow, run.branch, diagnosis.diagnosis
        );
        if !diagnosis.fix.is_empty() {
            body.push_str(&format!("\n**Suggested fix:** {}\n", diagnosis.fix));
        }
        if !diagnosis.caused_by.is_empty() {
            body.push_str(&format!("\n**Likely cause:** {}\n", diagnosis.caused_by));
        }
        body.push_str(&format!("\nRun: {}\n\n_Filed from DevDash._", run.url));

        let code_host = self.services.code_host.clone();
        self.tasks.spawn("open_issue", async move {
            let result = code_host
                .open_issue(&run.repo, &title, &body)
                .await
                .map_err(|err| {
                    tracing::error!(run_id = run.run_id, error = %err, "issue creation failed");
                    err.user_message()
                });
            ScreenEvent::IssueOpened(result)
        });
    }

    fn render_run(&self, frame: &mut Frame, area: Rect, run: &CiRun, ctx: &RenderContext) {
        let palette = &ctx.palette;
        let block = widgets::card(
            Line::styled(format!(" Run #{} ", run.run_id), palette.title()),
            palette.error,
            palette,
        );
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = vec![Line::styled(
            format!("{} · {} · {}", run.repo, run.workflow, run.branch),
            palette.dim(),
        )];
        match &self.diagnosis {
            Diagnosis::None => {}
            Diagnosis::Streaming(text) => {
                lines.push(Line::styled(
                    format!("{} Diagnosing...", widgets::spinner(ctx.now, ctx.epoch)),
                    palette.dim().fg(palette.info),
                ));
                let streamed: Vec<&str> = text.lines().collect();
                let skip = streamed.len().saturating_sub(STREAM_LINES);
                for line in &streamed[skip..] {
                    lines.push(Line::styled(line.to_string(), palette.base()));
                }
            }
            Diagnosis::Ready(diagnosis) => {
                lines.push(Line::styled(diagnosis.diagnosis.clone(), palette.base()));
                if !diagnosis.fix.is_empty() {
                    lines.push(Line::styled(
                        format!("Fix: {}", diagnosis.fix),
                        palette.dim().fg(palette.success),
                    ));
                }
                if !diagnosis.caused_by.is_empty() {
                    lines.push(Line::styled(
                        format!("Caused by: {}", diagnosis.caused_by),
                        palette.dim(),
                    ));
                }
            }
            Diagnosis::Failed => lines.push(Line::styled(
                "Diagnosis unavailable. Tap to retry.",
                palette.dim().fg(palette.error),
            )),
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
    }
}

impl Screen for CiDiagnosisScreen {
    type Button = CiButton;

    fn id(&self) -> ScreenId {
        ScreenId::CiDiagnosis
    }

    fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        regions: &mut HitRegions<CiButton>,
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

        let Some(run) = self.current().cloned() else {
            frame.render_widget(Paragraph::new(Line::styled("CI Status", palette.title())), header);
            widgets::message(
                frame,
                body,
                "All pipelines passing!",
                palette.base().fg(palette.success),
            );
            return;
        };

        let [title_area, age_area] =
            Layout::horizontal([Constraint::Min(10), Constraint::Length(16)]).areas(header);
        frame.render_widget(
            Paragraph::new(Line::styled("CI Failed", palette.title().fg(palette.error))),
            title_area,
        );
        frame.render_widget(
            Paragraph::new(Line::styled(
                run.updated_at.format("%b %d %H:%M").to_string(),
                palette.dim(),
            ))
            .alignment(Alignment::Right),
            age_area,
        );

        self.render_run(frame, body, &run, ctx);
        if self.diagnosis == Diagnosis::Failed {
            regions.register(body, CiButton::Retry);
        }

        if let Some(text) = &self.notice {
            frame.render_widget(
                Paragraph::new(Line::styled(text.clone(), palette.dim())).alignment(Alignment::Center),
                notice,
            );
        }

        if matches!(self.diagnosis, Diagnosis::Ready(_)) {
            let [fix, dismiss] =
                Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                    .areas(buttons);
            let label = if self.filing_issue {
                "Filing issue..."
            } else {
                "Open Fix Issue"
            };
            widgets::button(frame, fix, label, palette.success, palette);
            regions.register(fix, CiButton::Fix);
            widgets::button(frame, dismiss, "Dismiss", palette.text_dim, palette);
            regions.register(dismiss, CiButton::Dismiss);
        }
    }

    fn refresh(&mut self) -> Option<RefreshJob> {
        let cache = self.services.cache.clone();
        Some(async move { Ok::<_, DashError>(ScreenEvent::Runs(cache.failed_runs(None).await?)) }.boxed())
    }

    fn on_enter(&mut self) {
        if !self.failures.is_empty() && self.diagnosis == Diagnosis::None {
            self.diagnose_current();
        }
    }

    fn on_leave(&mut self) {
        if matches!(self.diagnosis, Diagnosis::Streaming(_)) {
            self.diagnosis = Diagnosis::None;
            self.diagnosed = None;
        }
        self.filing_issue = false;
    }

    fn on_button(&mut self, button: CiButton) {
        match button {
            CiButton::Fix => self.open_fix_issue(),
            CiButton::Dismiss => {
                self.notice = None;
                self.next_failure();
            }
            CiButton::Retry => self.diagnose_current(),
        }
    }

    fn apply(&mut self, event: ScreenEvent) {
        match event {
            ScreenEvent::Runs(runs) => {
                let previous = self.current().map(|r| r.run_id);
                self.failures = runs;
                if self.index >= self.failures.len() {
                    self.index = 0;
                }
                if self.current().map(|r| r.run_id) != previous {
                    self.diagnosis = Diagnosis::None;
                    self.diagnosed = None;
                }
                if !self.failures.is_empty() && self.diagnosis == Diagnosis::None {
                    self.diagnose_current();
                }
            }
            ScreenEvent::Delta { stream, text } => {
                // Text from a run that is no longer shown.
                if self.diagnosed != Some(stream) {
                    return;
                }
                if let Diagnosis::Streaming(buffer) = &mut self.diagnosis {
                    buffer.push_str(&text);
                }
            }
            ScreenEvent::Diagnosis { run_id, result } => {
                if self.diagnosed != Some(run_id) {
                    return;
                }
                self.diagnosis = match result {
                    Ok(diagnosis) => Diagnosis::Ready(diagnosis),
                    Err(_) => Diagnosis::Failed,
                };
            }
            ScreenEvent::IssueOpened(result) => {
                self.filing_issue = false;
                match result {
                    Ok(number) => {
                        tracing::info!(issue = number, "fix issue opened");
                        self.notice = Some(format!("Opened issue #{}", number));
                        self.next_failure();
                    }
                    Err(message) => self.notice = Some(format!("Issue failed: {}", message)),
                }
            }
            _ => {}
        }
    }

    fn status(&self) -> ScreenStatus {
        if self.failures.is_empty() {
            ScreenStatus::Success
        } else {
            ScreenStatus::Error
        }
    }
}
