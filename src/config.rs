//! Application configuration.
//!
//! Settings are read from `config.yaml`. Every field has a default so a
//! missing file, or a file with only `github.token` and `github.repos`,
//! still yields a working dashboard.
//!
//! Lookup order:
//! 1. `--config <path>` (must exist)
//! 2. `./config.yaml`
//! 3. `$XDG_CONFIG_HOME/devdash/config.yaml`
//! 4. built-in defaults
//!
//! `GITHUB_TOKEN` and `DEVDASH_MODEL` override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, DashResult};

pub const CONFIG_FILE: &str = "config.yaml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub github: GithubConfig,
    #[serde(alias = "copilot")]
    pub assistant: AssistantConfig,
    pub display: DisplayConfig,
    pub gpio: GpioConfig,
    pub deploy: DeployConfig,
    pub standup: StandupConfig,
    pub voice: VoiceConfig,
    pub storage: StorageConfig,
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub token: String,
    pub username: String,
    /// Monitored repositories as `owner/name`.
    pub repos: Vec<String>,
    /// Seconds between refresh cycles.
    pub poll_interval: u64,
    pub api_url: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            username: String::new(),
            repos: Vec::new(),
            poll_interval: 120,
            api_url: "https://api.github.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub model: String,
    pub endpoint: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Conversation messages kept in addition to the system prompt.
    pub history_limit: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4.1".to_string(),
            endpoint: "https://models.inference.ai.azure.com".to_string(),
            max_tokens: 200,
            temperature: 0.7,
            history_limit: 20,
        }
    }
}

/// Logical size of the touch panel and the frame rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u16,
    pub height: u16,
    pub fps: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 480,
            height: 320,
            fps: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GpioConfig {
    pub led_pin: u8,
    pub led_count: usize,
    pub led_brightness: u8,
    pub button_pin: u8,
    pub buzzer_pin: u8,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            led_pin: 18,
            led_count: 8,
            led_brightness: 50,
            button_pin: 17,
            buzzer_pin: 13,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Repository whose workflow gets dispatched. Empty disables deploys.
    pub repo: String,
    pub workflow: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub environment: String,
    /// Minimum assessed confidence (0-100) to allow a deploy.
    pub min_confidence: u8,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            repo: String::new(),
            workflow: "deploy.yml".to_string(),
            git_ref: "main".to_string(),
            environment: "production".to_string(),
            min_confidence: 70,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StandupConfig {
    /// Local hour after which a missing standup is generated on refresh.
    pub schedule_hour: u32,
    pub lookback_hours: u32,
}

impl Default for StandupConfig {
    fn default() -> Self {
        Self {
            schedule_hour: 8,
            lookback_hours: 16,
        }
    }
}

/// External speech-to-text command. It must print the transcript on stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub command: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file. Defaults to `$XDG_DATA_HOME/devdash/devdash.db`.
    pub path: Option<PathBuf>,
}

/// Hex colours, parsed into a palette by the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub background: String,
    pub surface: String,
    pub primary: String,
    pub accent: String,
    pub text: String,
    pub text_dim: String,
    pub success: String,
    pub warning: String,
    pub error: String,
    pub info: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            background: "#1a1a2e".to_string(),
            surface: "#16213e".to_string(),
            primary: "#0f3460".to_string(),
            accent: "#e94560".to_string(),
            text: "#eaeaea".to_string(),
            text_dim: "#8892a0".to_string(),
            success: "#00c853".to_string(),
            warning: "#ffd600".to_string(),
            error: "#ff1744".to_string(),
            info: "#2979ff".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration following the lookup order in the module docs,
    /// then apply environment overrides.
    pub fn load(explicit: Option<&Path>) -> DashResult<Self> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_paths().into_iter().find(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    tracing::info!("No config.yaml found, using defaults");
                    Self::default()
                }
            },
        };

        let config = config.with_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> DashResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let config = Self::from_yaml_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Apply `GITHUB_TOKEN` and `DEVDASH_MODEL` using the given lookup.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("GITHUB_TOKEN").filter(|t| !t.is_empty()) {
            self.github.token = token;
        }
        if let Some(model) = lookup("DEVDASH_MODEL").filter(|m| !m.is_empty()) {
            self.assistant.model = model;
        }
        self
    }

    pub fn validate(&self) -> DashResult<()> {
        if self.display.fps == 0 {
            return Err(ConfigError::Invalid {
                key: "display.fps".to_string(),
                message: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.display.width == 0 || self.display.height == 0 {
            return Err(ConfigError::Invalid {
                key: "display".to_string(),
                message: "width and height must be non-zero".to_string(),
            }
            .into());
        }
        if self.github.poll_interval == 0 {
            return Err(ConfigError::Invalid {
                key: "github.poll_interval".to_string(),
                message: "must be at least 1 second".to_string(),
            }
            .into());
        }
        if self.deploy.min_confidence > 100 {
            return Err(ConfigError::Invalid {
                key: "deploy.min_confidence".to_string(),
                message: "must be between 0 and 100".to_string(),
            }
            .into());
        }
        if let Some(bad) = self.github.repos.iter().find(|r| !r.contains('/')) {
            return Err(ConfigError::Invalid {
                key: "github.repos".to_string(),
                message: format!("'{}' is not owner/name", bad),
            }
            .into());
        }
        Ok(())
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.github.token = token.into();
        self
    }

    pub fn with_repos<I, S>(mut self, repos: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.github.repos = repos.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_poll_interval(mut self, secs: u64) -> Self {
        self.github.poll_interval = secs;
        self
    }

    pub fn with_deploy_repo(mut self, repo: impl Into<String>) -> Self {
        self.deploy.repo = repo.into();
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.github.poll_interval)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.display.fps.max(1) as f64)
    }

    /// SQLite path, falling back to the platform data directory.
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| data_dir().join("devdash.db"))
    }
}

/// `$XDG_DATA_HOME/devdash`, or the working directory if unknown.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("devdash"))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("devdash").join(CONFIG_FILE));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_device() {
        let config = AppConfig::default();
        assert_eq!(config.github.poll_interval, 120);
        assert_eq!(config.display.width, 480);
        assert_eq!(config.display.height, 320);
        assert_eq!(config.display.fps, 30);
        assert_eq!(config.gpio.led_count, 8);
        assert_eq!(config.deploy.min_confidence, 70);
        assert_eq!(config.deploy.git_ref, "main");
        assert_eq!(config.standup.schedule_hour, 8);
        assert_eq!(config.theme.accent, "#e94560");
        assert_eq!(config.assistant.max_tokens, 200);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
github:
  token: "ghp_abc"
  repos: ["octo/widgets"]
deploy:
  repo: "octo/widgets"
  ref: "release"
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.github.token, "ghp_abc");
        assert_eq!(config.github.repos, vec!["octo/widgets"]);
        assert_eq!(config.github.poll_interval, 120);
        assert_eq!(config.deploy.git_ref, "release");
        assert_eq!(config.deploy.workflow, "deploy.yml");
    }

    #[test]
    fn test_copilot_section_alias() {
        let config = AppConfig::from_yaml_str("copilot:\n  model: gpt-4\n").unwrap();
        assert_eq!(config.assistant.model, "gpt-4");
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = AppConfig::from_yaml_str("   \n").unwrap();
        assert_eq!(config.display.fps, 30);
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::default().with_env_overrides(|key| match key {
            "GITHUB_TOKEN" => Some("from-env".to_string()),
            "DEVDASH_MODEL" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.github.token, "from-env");
        assert_eq!(config.assistant.model, "gpt-4.1");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.display.fps = 0;
        assert!(config.validate().is_err());

        let config = AppConfig::default().with_repos(["no-slash"]);
        assert!(config.validate().is_err());

        let config = AppConfig::default().with_repos(["octo/widgets"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_frame_interval() {
        let config = AppConfig::default();
        let frame = config.frame_interval();
        assert!(frame > Duration::from_millis(33) && frame < Duration::from_millis(34));
    }
}
