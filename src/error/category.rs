//! Error category classification for unified error handling.
//!
//! Categories drive retry decisions and the hint shown under an error
//! sub-state on screen.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connection, DNS and timeout failures. Transient.
    Network,

    /// The code host or assistant rejected our credentials.
    Auth,

    /// Remote service failures (HTTP 5xx). Transient.
    Server,

    /// Programming errors or malformed payloads.
    Client,

    /// Something the user has to fix on the device.
    User,

    /// OS, filesystem and local database errors.
    System,

    /// Missing or invalid settings in `config.yaml`.
    Configuration,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Short label used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Server => "server",
            ErrorCategory::Client => "client",
            ErrorCategory::User => "user",
            ErrorCategory::System => "system",
            ErrorCategory::Configuration => "configuration",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Network connectivity issue",
            ErrorCategory::Auth => "Authentication problem",
            ErrorCategory::Server => "Remote service issue",
            ErrorCategory::Client => "Application error",
            ErrorCategory::User => "User action required",
            ErrorCategory::System => "System error",
            ErrorCategory::Configuration => "Configuration problem",
        }
    }

    /// Suggested recovery action, short enough for a 480x320 panel.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Check the network and tap to retry",
            ErrorCategory::Auth => "Check the GitHub token in config.yaml",
            ErrorCategory::Server => "GitHub may be having issues, retry later",
            ErrorCategory::Client => "Unexpected response, see devdash.log",
            ErrorCategory::User => "Check your input and try again",
            ErrorCategory::System => "Check disk space and permissions",
            ErrorCategory::Configuration => "Check config.yaml",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
