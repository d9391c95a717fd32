//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("failed to read '{}': {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("invalid YAML in '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("missing setting '{key}'")]
    MissingValue { key: String },

    #[error("invalid value for '{key}': {message}")]
    Invalid { key: String, message: String },
}

impl ConfigError {
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::Read { path, .. } => format!("Can't read {}.", path.display()),
            ConfigError::Parse { path, .. } => format!("{} is not valid YAML.", path.display()),
            ConfigError::MissingValue { key } => format!("Set '{}' in config.yaml.", key),
            ConfigError::Invalid { key, .. } => format!("Fix '{}' in config.yaml.", key),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "E_CFG_READ",
            ConfigError::Parse { .. } => "E_CFG_PARSE",
            ConfigError::MissingValue { .. } => "E_CFG_MISSING",
            ConfigError::Invalid { .. } => "E_CFG_INVALID",
        }
    }
}
