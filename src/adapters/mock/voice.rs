//! Scripted [`VoiceInput`].

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{DashResult, SystemError};
use crate::traits::VoiceInput;

#[derive(Debug, Default)]
pub struct MockVoice {
    available: bool,
    transcripts: Mutex<VecDeque<Option<String>>>,
}

impl MockVoice {
    /// A device without a microphone.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn with_transcripts<I, S>(transcripts: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            available: true,
            transcripts: Mutex::new(
                transcripts
                    .into_iter()
                    .map(|t| t.map(Into::into))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl VoiceInput for MockVoice {
    fn mic_available(&self) -> bool {
        self.available
    }

    async fn record_and_transcribe(&self) -> DashResult<Option<String>> {
        if !self.available {
            return Err(SystemError::Unavailable {
                resource: "microphone".to_string(),
            }
            .into());
        }
        Ok(self
            .transcripts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .flatten())
    }
}
