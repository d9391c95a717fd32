//! UI-related error types.

use std::fmt;

#[derive(Debug, Clone)]
pub enum UiError {
    /// Raw mode, alternate screen or mouse capture could not be enabled.
    TerminalInit { message: String },

    /// The terminal could not be put back into cooked mode.
    TerminalRestore { message: String },

    /// Drawing or presenting a frame failed.
    Render { component: String, message: String },

    /// The app message channel closed underneath the loop.
    Channel { message: String },

    /// The screen manager was handed no screens.
    NoScreens,
}

impl UiError {
    /// Whether the loop may keep running after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, UiError::Render { .. })
    }

    pub fn user_message(&self) -> String {
        match self {
            UiError::TerminalInit { .. } => "Failed to initialize the terminal.".to_string(),
            UiError::TerminalRestore { .. } => {
                "Failed to restore the terminal. Run `reset` if the shell looks wrong.".to_string()
            }
            UiError::Render { component, .. } => format!("Failed to draw {}.", component),
            UiError::Channel { .. } => "Internal channel closed. Restart devdash.".to_string(),
            UiError::NoScreens => "No screens to show.".to_string(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            UiError::TerminalInit { .. } => "E_UI_TERM_INIT",
            UiError::TerminalRestore { .. } => "E_UI_TERM_RESTORE",
            UiError::Render { .. } => "E_UI_RENDER",
            UiError::Channel { .. } => "E_UI_CHANNEL",
            UiError::NoScreens => "E_UI_NO_SCREENS",
        }
    }
}

impl fmt::Display for UiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiError::TerminalInit { message } => {
                write!(f, "Terminal initialization failed: {}", message)
            }
            UiError::TerminalRestore { message } => {
                write!(f, "Terminal restore failed: {}", message)
            }
            UiError::Render { component, message } => {
                write!(f, "Render failed for '{}': {}", component, message)
            }
            UiError::Channel { message } => write!(f, "Event channel error: {}", message),
            UiError::NoScreens => f.write_str("Screen manager needs at least one screen"),
        }
    }
}

impl std::error::Error for UiError {}
