//! Voice input through an external record-and-transcribe command.
//!
//! The configured command (for example a whisper.cpp wrapper script) must
//! record one utterance and print the transcript on stdout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::VoiceConfig;
use crate::error::{DashResult, SystemError};
use crate::traits::VoiceInput;

#[derive(Debug, Clone)]
pub struct CommandVoice {
    command: Vec<String>,
    timeout: Duration,
    resolved: Option<PathBuf>,
}

impl CommandVoice {
    pub fn new(config: &VoiceConfig) -> Self {
        let resolved = config.command.first().and_then(|program| resolve_program(program));
        match &resolved {
            Some(path) => tracing::info!(program = %path.display(), "voice command available"),
            None if config.command.is_empty() => tracing::info!("voice input not configured"),
            None => tracing::warn!(program = %config.command[0], "voice command not found"),
        }
        Self {
            command: config.command.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            resolved,
        }
    }
}

/// Find `program` as given or on `PATH`.
fn resolve_program(program: &str) -> Option<PathBuf> {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return path.is_file().then(|| path.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

#[async_trait]
impl VoiceInput for CommandVoice {
    fn mic_available(&self) -> bool {
        self.resolved.is_some()
    }

    async fn record_and_transcribe(&self) -> DashResult<Option<String>> {
        let program = self.resolved.as_ref().ok_or_else(|| SystemError::Unavailable {
            resource: "microphone".to_string(),
        })?;

        let mut command = Command::new(program);
        command.args(&self.command[1..]).kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| SystemError::Command {
                program: program.display().to_string(),
                message: format!("timed out after {}s", self.timeout.as_secs()),
            })?
            .map_err(|err| SystemError::Command {
                program: program.display().to_string(),
                message: err.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SystemError::Command {
                program: program.display().to_string(),
                message: format!("exited with {}: {}", output.status, stderr.trim()),
            }
            .into());
        }

        let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
        tracing::info!(chars = transcript.len(), "voice transcribed");
        Ok((!transcript.is_empty()).then_some(transcript))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(command: &[&str]) -> CommandVoice {
        CommandVoice::new(&VoiceConfig {
            command: command.iter().map(|s| s.to_string()).collect(),
            timeout_secs: 5,
        })
    }

    #[test]
    fn test_unconfigured_voice_has_no_mic() {
        assert!(!voice(&[]).mic_available());
        assert!(!voice(&["/nonexistent/devdash-whisper"]).mic_available());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_transcript_from_stdout() {
        let voice = voice(&["sh", "-c", "echo '  what broke?  '"]);
        assert!(voice.mic_available());
        let text = voice.record_and_transcribe().await.unwrap();
        assert_eq!(text.as_deref(), Some("what broke?"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_silence_is_none_and_failure_is_error() {
        let silent = voice(&["sh", "-c", "true"]);
        assert_eq!(silent.record_and_transcribe().await.unwrap(), None);

        let failing = voice(&["sh", "-c", "echo nope >&2; exit 3"]);
        assert!(failing.record_and_transcribe().await.is_err());
    }
}
