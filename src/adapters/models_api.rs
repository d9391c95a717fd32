//! Streaming chat completions against the GitHub Models endpoint.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::error::{classify_reqwest_error, ConfigError, DashResult, NetworkError};
use crate::sse::{event_stream, SseEvent};
use crate::traits::{Assistant, AssistantReply, AssistantRequest};

use super::check_status;

pub const FALLBACK_MODEL: &str = "gpt-4o-mini";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Map a configured model name onto the Models catalog.
pub fn api_model(configured: &str) -> &'static str {
    match configured {
        "gpt-4.1" | "gpt-4" => "gpt-4o",
        _ => FALLBACK_MODEL,
    }
}

pub fn system_prompt(repos: &[String]) -> String {
    let repos = if repos.is_empty() {
        "none configured".to_string()
    } else {
        repos.join(", ")
    };
    format!(
        "You are DevDash, an AI developer companion on a Raspberry Pi with a 3.5\" LCD \
         screen. The developer interacts by touch and voice.\n\n\
         Monitored repositories: {}\n\n\
         You help with CI/CD, pull requests, standup briefings, deployments and code \
         context questions.\n\n\
         Guidelines:\n\
         - Be concise: responses display on a 480x320 screen\n\
         - Max 3-5 lines per response\n\
         - Use emoji sparingly\n\
         - If asked to list repos, list the monitored repos above",
        repos
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }

    fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant",
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

/// Drop the oldest messages so at most `limit` remain.
fn trim_history(history: &mut Vec<ChatMessage>, limit: usize) {
    if history.len() > limit {
        let excess = history.len() - limit;
        history.drain(..excess);
    }
}

pub struct ModelsAssistant {
    client: Client,
    endpoint: String,
    token: String,
    model: &'static str,
    max_tokens: u32,
    temperature: f32,
    history_limit: usize,
    system_prompt: String,
    /// Ask turns only, without the system prompt.
    history: Mutex<Vec<ChatMessage>>,
}

impl std::fmt::Debug for ModelsAssistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelsAssistant")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl ModelsAssistant {
    pub fn new(config: &AppConfig) -> DashResult<Self> {
        let client = Client::builder()
            .user_agent("devdash")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| NetworkError::Other {
                message: format!("failed to build HTTP client: {}", err),
            })?;
        let model = api_model(&config.assistant.model);
        tracing::info!(configured = %config.assistant.model, model, "assistant model selected");

        Ok(Self {
            client,
            endpoint: config.assistant.endpoint.trim_end_matches('/').to_string(),
            token: config.github.token.clone(),
            model,
            max_tokens: config.assistant.max_tokens,
            temperature: config.assistant.temperature,
            history_limit: config.assistant.history_limit,
            system_prompt: system_prompt(&config.github.repos),
            history: Mutex::new(Vec::new()),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &'static str {
        self.model
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn clear_history(&self) {
        self.history.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn messages_for(&self, request: &AssistantRequest) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage {
            role: "system",
            content: self.system_prompt.clone(),
        }];
        if request.is_conversational() {
            let history = self.history.lock().unwrap_or_else(|e| e.into_inner());
            messages.extend(history.iter().cloned());
        }
        messages.push(ChatMessage::user(request.prompt()));
        messages
    }

    fn remember(&self, question: String, answer: &str) {
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        history.push(ChatMessage::user(question));
        history.push(ChatMessage::assistant(answer));
        trim_history(&mut history, self.history_limit);
    }
}

#[async_trait]
impl Assistant for ModelsAssistant {
    async fn send(
        &self,
        request: AssistantRequest,
        deltas: mpsc::UnboundedSender<String>,
    ) -> DashResult<AssistantReply> {
        if self.token.is_empty() {
            return Err(ConfigError::MissingValue {
                key: "github.token".to_string(),
            }
            .into());
        }

        let url = format!("{}/chat/completions", self.endpoint);
        let body = CompletionRequest {
            model: self.model,
            messages: self.messages_for(&request),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: true,
        };
        tracing::debug!(kind = request.kind(), messages = body.messages.len(), "assistant request");

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .json(&body)
            .send()
            .await
            .map_err(|err| classify_reqwest_error(&err, &url))?;
        let response = check_status(response, &url).await?;

        let mut events = Box::pin(event_stream(Box::pin(response.bytes_stream())));
        let mut text = String::new();
        while let Some(event) = events.next().await {
            match event? {
                SseEvent::Delta(delta) => {
                    text.push_str(&delta);
                    let _ = deltas.send(delta);
                }
                SseEvent::Error(message) => {
                    return Err(NetworkError::InvalidResponse { message }.into());
                }
                SseEvent::Done => break,
            }
        }

        if text.trim().is_empty() {
            return Err(NetworkError::InvalidResponse {
                message: "empty completion".to_string(),
            }
            .into());
        }

        if let AssistantRequest::Ask { question } = request {
            self.remember(question, &text);
        }
        tracing::debug!(chars = text.len(), "assistant reply complete");
        Ok(AssistantReply::from_text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_map() {
        assert_eq!(api_model("gpt-4.1"), "gpt-4o");
        assert_eq!(api_model("gpt-4"), "gpt-4o");
        assert_eq!(api_model("claude"), FALLBACK_MODEL);
        assert_eq!(api_model(""), FALLBACK_MODEL);
    }

    #[test]
    fn test_system_prompt_lists_repos() {
        let prompt = system_prompt(&["octo/widgets".to_string(), "octo/gears".to_string()]);
        assert!(prompt.contains("octo/widgets, octo/gears"));
        assert!(system_prompt(&[]).contains("none configured"));
    }

    #[test]
    fn test_trim_history_keeps_newest() {
        let mut history: Vec<ChatMessage> =
            (0..25).map(|i| ChatMessage::user(i.to_string())).collect();
        trim_history(&mut history, 20);
        assert_eq!(history.len(), 20);
        assert_eq!(history[0].content, "5");
        assert_eq!(history[19].content, "24");
    }

    #[test]
    fn test_task_requests_skip_history() {
        let assistant = ModelsAssistant::new(&AppConfig::default()).unwrap();
        assistant.remember("earlier".to_string(), "answer");

        let ask = AssistantRequest::Ask {
            question: "now?".to_string(),
        };
        assert_eq!(assistant.messages_for(&ask).len(), 4);

        let task = AssistantRequest::AssessDeploy {
            repo: "octo/widgets".to_string(),
            environment: "production".to_string(),
            git_ref: "main".to_string(),
            open_pulls: 0,
            failing_runs: 0,
        };
        let messages = assistant.messages_for(&task);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
    }

    #[tokio::test]
    async fn test_missing_token_is_config_error() {
        let assistant = ModelsAssistant::new(&AppConfig::default()).unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        let err = assistant
            .send(
                AssistantRequest::Ask {
                    question: "hi".to_string(),
                },
                tx,
            )
            .await
            .unwrap_err();
        assert_eq!(err.category(), crate::error::ErrorCategory::Configuration);
    }
}
