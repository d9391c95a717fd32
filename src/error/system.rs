//! System-related error types.
//!
//! Local OS failures: files, the clipboard, child processes (the voice
//! recorder) and background task joins.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum SystemError {
    FileNotFound { path: PathBuf },

    PermissionDenied { path: PathBuf, operation: String },

    Io {
        operation: String,
        path: Option<PathBuf>,
        message: String,
    },

    /// An external helper program failed or is not installed.
    Command { program: String, message: String },

    /// The system clipboard refused the copy or is not reachable.
    Clipboard { message: String },

    /// Device resource is missing (mic, thermal zone).
    Unavailable { resource: String },

    /// Could not determine a data or config directory.
    NoDataDirectory,

    /// A blocking or spawned task panicked or was cancelled.
    Task { message: String },
}

impl SystemError {
    pub fn is_transient(&self) -> bool {
        matches!(self, SystemError::Task { .. })
    }

    pub fn user_message(&self) -> String {
        match self {
            SystemError::FileNotFound { path } => {
                format!("File not found: {}", path.display())
            }
            SystemError::PermissionDenied { path, operation } => {
                format!("Permission denied: cannot {} {}", operation, path.display())
            }
            SystemError::Io { operation, .. } => format!("{} failed.", operation),
            SystemError::Command { program, .. } => format!("{} is not available.", program),
            SystemError::Clipboard { .. } => "Copy failed, clipboard unavailable.".to_string(),
            SystemError::Unavailable { resource } => format!("No {} on this device.", resource),
            SystemError::NoDataDirectory => "No data directory available.".to_string(),
            SystemError::Task { .. } => "Background task failed.".to_string(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            SystemError::FileNotFound { .. } => "E_SYS_NOTFOUND",
            SystemError::PermissionDenied { .. } => "E_SYS_PERM",
            SystemError::Io { .. } => "E_SYS_IO",
            SystemError::Command { .. } => "E_SYS_CMD",
            SystemError::Clipboard { .. } => "E_SYS_CLIPBOARD",
            SystemError::Unavailable { .. } => "E_SYS_UNAVAILABLE",
            SystemError::NoDataDirectory => "E_SYS_NODIR",
            SystemError::Task { .. } => "E_SYS_TASK",
        }
    }
}

impl fmt::Display for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemError::FileNotFound { path } => {
                write!(f, "File not found: '{}'", path.display())
            }
            SystemError::PermissionDenied { path, operation } => {
                write!(f, "Permission denied: {} '{}'", operation, path.display())
            }
            SystemError::Io {
                operation,
                path: Some(path),
                message,
            } => write!(f, "{} failed for '{}': {}", operation, path.display(), message),
            SystemError::Io { operation, message, .. } => {
                write!(f, "{} failed: {}", operation, message)
            }
            SystemError::Command { program, message } => {
                write!(f, "Command '{}' failed: {}", program, message)
            }
            SystemError::Clipboard { message } => {
                write!(f, "Clipboard error: {}", message)
            }
            SystemError::Unavailable { resource } => {
                write!(f, "Resource unavailable: {}", resource)
            }
            SystemError::NoDataDirectory => {
                write!(f, "Could not determine data directory")
            }
            SystemError::Task { message } => {
                write!(f, "Background task failed: {}", message)
            }
        }
    }
}

impl std::error::Error for SystemError {}

/// Classify an I/O error, keeping the path when we know it.
pub fn classify_io_error(
    err: std::io::Error,
    path: Option<PathBuf>,
    operation: &str,
) -> SystemError {
    use std::io::ErrorKind;

    match (err.kind(), path) {
        (ErrorKind::NotFound, Some(path)) => SystemError::FileNotFound { path },
        (ErrorKind::PermissionDenied, Some(path)) => SystemError::PermissionDenied {
            path,
            operation: operation.to_string(),
        },
        (_, path) => SystemError::Io {
            operation: operation.to_string(),
            path,
            message: err.to_string(),
        },
    }
}
