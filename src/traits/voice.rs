//! Voice capture abstraction.

use async_trait::async_trait;

use crate::error::DashResult;

#[async_trait]
pub trait VoiceInput: Send + Sync {
    fn mic_available(&self) -> bool;

    /// Record one utterance and transcribe it. `Ok(None)` means silence.
    async fn record_and_transcribe(&self) -> DashResult<Option<String>>;
}
