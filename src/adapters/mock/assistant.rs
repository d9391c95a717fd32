//! Scripted [`Assistant`].

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{DashResult, NetworkError};
use crate::traits::{Assistant, AssistantReply, AssistantRequest};

/// Replies are consumed in order. When the queue is empty the mock answers
/// with [`MockAssistant::DEFAULT_REPLY`]. Each reply is streamed word by
/// word before it is returned.
#[derive(Debug, Default)]
pub struct MockAssistant {
    replies: Mutex<VecDeque<Result<String, NetworkError>>>,
    requests: Mutex<Vec<AssistantRequest>>,
    delay: Mutex<Option<Duration>>,
}

impl MockAssistant {
    pub const DEFAULT_REPLY: &'static str = "All good.";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, text: impl Into<String>) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Ok(text.into()));
    }

    pub fn push_error(&self, error: NetworkError) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(error));
    }

    /// Wait this long before streaming each reply.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap_or_else(|e| e.into_inner()) = Some(delay);
    }

    pub fn requests(&self) -> Vec<AssistantRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn request_kinds(&self) -> Vec<&'static str> {
        self.requests().iter().map(AssistantRequest::kind).collect()
    }
}

#[async_trait]
impl Assistant for MockAssistant {
    async fn send(
        &self,
        request: AssistantRequest,
        deltas: mpsc::UnboundedSender<String>,
    ) -> DashResult<AssistantReply> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let delay = *self.delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        let text = match next {
            Some(Ok(text)) => text,
            Some(Err(err)) => return Err(err.into()),
            None => Self::DEFAULT_REPLY.to_string(),
        };

        for word in text.split_inclusive(' ') {
            let _ = deltas.send(word.to_string());
        }
        Ok(AssistantReply::from_text(text))
    }
}
