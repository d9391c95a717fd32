//! Ask the assistant about your repositories by tapping a quick question
//! or speaking one.

use std::time::Instant;

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::Line;
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use crate::traits::AssistantRequest;
use crate::ui::avatar::{Avatar, AvatarWidget, Mood, AVATAR_HEIGHT};
use crate::ui::interaction::HitRegions;
use crate::ui::widgets;

use super::{RenderContext, Screen, ScreenEvent, ScreenId, ScreenStatus, ScreenTasks, Services};

pub const QUICK_QUESTIONS: [&str; 4] = [
    "Who owns this area?",
    "What broke last?",
    "Safe to refactor?",
    "Why this design?",
];

pub const ANSWER_FAILED: &str = "Failed to get answer. Tap to retry.";

const ANSWER_LINES: usize = 7;
const STREAM_LINES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatButton {
    Question(usize),
    Mic,
    /// Ask the failed question again.
    Retry,
    Back,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatState {
    Questions,
    Listening,
    Asking { question: String, streamed: String },
    Answered { question: String, answer: String },
    Failed { question: String },
}

pub struct ContextChatScreen {
    services: Services,
    tasks: ScreenTasks,
    state: ChatState,
    avatar: Avatar,
    voice_available: bool,
    /// Key of the latest question's stream.
    stream: u64,
}

impl ContextChatScreen {
    pub fn new(services: Services, tasks: ScreenTasks, now: Instant) -> Self {
        let voice_available = services.voice.mic_available();
        Self {
            services,
            tasks,
            state: ChatState::Questions,
            avatar: Avatar::new(now),
            voice_available,
            stream: 0,
        }
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn mood(&self) -> Mood {
        self.avatar.mood()
    }

    pub fn voice_available(&self) -> bool {
        self.voice_available
    }

    fn busy(&self) -> bool {
        matches!(self.state, ChatState::Listening | ChatState::Asking { .. })
    }

    fn ask(&mut self, question: String) {
        tracing::info!(question = %question, "asking assistant");
        self.state = ChatState::Asking {
            question: question.clone(),
            streamed: String::new(),
        };
        self.avatar.set_mood(Mood::Thinking, Instant::now());
        self.stream += 1;
        let stream = self.stream;

        let assistant = self.services.assistant.clone();
        self.tasks.spawn_streaming("ask", stream, move |deltas| async move {
            let result = assistant
                .send(AssistantRequest::Ask { question }, deltas)
                .await
                .map(|reply| reply.text.trim().to_string())
                .map_err(|err| {
                    tracing::error!(error = %err, "context question failed");
                    err.user_message()
                });
            ScreenEvent::Answer { stream, result }
        });
    }

    fn listen(&mut self) {
        if !self.voice_available || self.busy() {
            return;
        }
        self.state = ChatState::Listening;
        self.avatar.set_mood(Mood::Listening, Instant::now());

        let voice = self.services.voice.clone();
        self.tasks.spawn("voice", async move {
            let result = voice.record_and_transcribe().await.map_err(|err| {
                tracing::error!(error = %err, "voice input failed");
                err.user_message()
            });
            ScreenEvent::Transcribed(result)
        });
    }

    fn retry(&mut self) {
        if let ChatState::Failed { question } = &self.state {
            let question = question.clone();
            self.ask(question);
        }
    }

    fn back(&mut self) {
        self.state = ChatState::Questions;
        self.avatar.set_mood(Mood::Idle, Instant::now());
    }

    fn render_questions(
        &self,
        frame: &mut Frame,
        area: Rect,
        regions: &mut HitRegions<ChatButton>,
        ctx: &RenderContext,
    ) {
        let palette = &ctx.palette;
        let [label, grid] = Layout::vertical([Constraint::Length(1), Constraint::Min(6)]).areas(area);
        frame.render_widget(Paragraph::new(Line::styled("Quick Questions:", palette.dim())), label);

        let rows = Layout::vertical([Constraint::Ratio(1, 2); 2]).split(grid);
        for (row_index, row) in rows.iter().enumerate() {
            for (col_index, cell) in widgets::columns(*row, 2).into_iter().enumerate() {
                let index = row_index * 2 + col_index;
                widgets::button(frame, cell, QUICK_QUESTIONS[index], palette.primary, palette);
                regions.register(cell, ChatButton::Question(index));
            }
        }
    }
}

impl Screen for ContextChatScreen {
    type Button = ChatButton;

    fn id(&self) -> ScreenId {
        ScreenId::ContextChat
    }

    fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        regions: &mut HitRegions<ChatButton>,
        ctx: &RenderContext,
    ) {
        let palette = &ctx.palette;
        self.avatar.update(ctx.now);

        let [header, body] =
            Layout::vertical([Constraint::Length(AVATAR_HEIGHT), Constraint::Min(4)]).areas(area);
        let [title_area, avatar_area, mic_area] = Layout::horizontal([
            Constraint::Min(12),
            Constraint::Length(9),
            Constraint::Length(8),
        ])
        .areas(header);

        frame.render_widget(
            Paragraph::new(vec![
                Line::styled("Ask Copilot", palette.title()),
                Line::styled(self.avatar.mood().label(), palette.dim()),
            ]),
            title_area,
        );
        frame.render_widget(AvatarWidget::new(&self.avatar, ctx.now, palette), avatar_area);
        if self.voice_available {
            let mic = widgets::vertical_center(mic_area, 3);
            widgets::button(frame, mic, "Mic", palette.accent, palette);
            regions.register(mic, ChatButton::Mic);
        }

        match &self.state {
            ChatState::Questions => self.render_questions(frame, body, regions, ctx),
            ChatState::Listening => widgets::message(
                frame,
                body,
                "Listening...",
                palette.base().fg(palette.info),
            ),
            ChatState::Asking { question, streamed } => {
                let mut lines = vec![Line::styled(format!("Q: \"{}\"", question), palette.dim())];
                if streamed.is_empty() {
                    lines.push(Line::styled(
                        format!("{} Thinking...", widgets::spinner(ctx.now, ctx.epoch)),
                        palette.dim().fg(palette.info),
                    ));
                }
                let wrapped = widgets::wrap_text(streamed, body.width);
                let skip = wrapped.len().saturating_sub(STREAM_LINES);
                lines.extend(
                    wrapped
                        .into_iter()
                        .skip(skip)
                        .map(|l| Line::styled(l, palette.base())),
                );
                frame.render_widget(Paragraph::new(lines), body);
            }
            ChatState::Answered { question, answer } => {
                let [text, back] =
                    Layout::vertical([Constraint::Min(2), Constraint::Length(3)]).areas(body);
                let mut lines = vec![Line::styled(format!("Q: \"{}\"", question), palette.dim())];
                lines.extend(
                    widgets::wrap_text(answer, text.width)
                        .into_iter()
                        .take(ANSWER_LINES)
                        .map(|l| Line::styled(l, palette.base())),
                );
                frame.render_widget(Paragraph::new(lines), text);
                widgets::button(frame, back, "Back", palette.text_dim, palette);
                regions.register(back, ChatButton::Back);
            }
            ChatState::Failed { question } => {
                let [text, buttons] =
                    Layout::vertical([Constraint::Min(2), Constraint::Length(3)]).areas(body);
                frame.render_widget(
                    Paragraph::new(vec![
                        Line::styled(format!("Q: \"{}\"", question), palette.dim()),
                        Line::styled(ANSWER_FAILED, palette.base().fg(palette.error)),
                    ])
                    .wrap(Wrap { trim: true }),
                    text,
                );
                regions.register(text, ChatButton::Retry);
                let [retry, back] =
                    Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                        .areas(buttons);
                widgets::button(frame, retry, "Retry", palette.accent, palette);
                regions.register(retry, ChatButton::Retry);
                widgets::button(frame, back, "Back", palette.text_dim, palette);
                regions.register(back, ChatButton::Back);
            }
        }
    }

    fn on_enter(&mut self) {
        self.voice_available = self.services.voice.mic_available();
    }

    fn on_leave(&mut self) {
        if self.busy() {
            self.back();
        }
    }

    fn on_button(&mut self, button: ChatButton) {
        match button {
            ChatButton::Question(index) => {
                if self.busy() {
                    return;
                }
                if let Some(question) = QUICK_QUESTIONS.get(index) {
                    self.ask(question.to_string());
                }
            }
            ChatButton::Mic => self.listen(),
            ChatButton::Retry => self.retry(),
            ChatButton::Back => self.back(),
        }
    }

    fn apply(&mut self, event: ScreenEvent) {
        let now = Instant::now();
        match event {
            ScreenEvent::Transcribed(result) => {
                if self.state != ChatState::Listening {
                    return;
                }
                match result {
                    Ok(Some(question)) => self.ask(question),
                    Ok(None) | Err(_) => self.back(),
                }
            }
            ScreenEvent::Delta { stream, text } => {
                if stream != self.stream {
                    return;
                }
                if let ChatState::Asking { streamed, .. } = &mut self.state {
                    streamed.push_str(&text);
                    self.avatar.set_mood(Mood::Speaking, now);
                }
            }
            ScreenEvent::Answer { stream, result } => {
                if stream != self.stream {
                    return;
                }
                let ChatState::Asking { question, .. } = &self.state else {
                    return;
                };
                let question = question.clone();
                match result {
                    Ok(answer) => {
                        self.state = ChatState::Answered { question, answer };
                        self.avatar.set_mood(Mood::Happy, now);
                    }
                    Err(_) => {
                        self.state = ChatState::Failed { question };
                        self.avatar.set_mood(Mood::Idle, now);
                    }
                }
            }
            _ => {}
        }
    }

    fn status(&self) -> ScreenStatus {
        match self.state {
            ChatState::Failed { .. } => ScreenStatus::Warning,
            _ => ScreenStatus::Success,
        }
    }
}
