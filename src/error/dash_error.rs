//! Unified error type for devdash.

use std::fmt;

use super::category::ErrorCategory;
use super::config::ConfigError;
use super::context::ErrorContext;
use super::network::NetworkError;
use super::storage::StorageError;
use super::system::SystemError;
use super::ui::UiError;

/// Every fallible collaborator call in devdash returns this.
#[derive(Debug)]
pub enum DashError {
    /// GitHub and Models API failures.
    Network(NetworkError),

    /// Local SQLite cache failures.
    Storage(StorageError),

    /// Bad or missing configuration.
    Config(ConfigError),

    /// OS, helper program and task failures.
    System(SystemError),

    /// Terminal and render failures.
    Ui(UiError),

    /// Wrapped error with additional context.
    WithContext {
        error: Box<DashError>,
        context: ErrorContext,
    },
}

impl DashError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DashError::Network(err) if err.is_auth_failure() => ErrorCategory::Auth,
            DashError::Network(NetworkError::HttpStatus { status, .. }) if *status >= 500 => {
                ErrorCategory::Server
            }
            DashError::Network(NetworkError::HttpStatus { .. })
            | DashError::Network(NetworkError::InvalidResponse { .. }) => ErrorCategory::Client,
            DashError::Network(_) => ErrorCategory::Network,
            DashError::Storage(_) => ErrorCategory::System,
            DashError::Config(_) => ErrorCategory::Configuration,
            DashError::System(SystemError::Unavailable { .. }) => ErrorCategory::User,
            DashError::System(_) => ErrorCategory::System,
            DashError::Ui(err) => {
                if err.is_recoverable() {
                    ErrorCategory::User
                } else {
                    ErrorCategory::System
                }
            }
            DashError::WithContext { error, .. } => error.category(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            DashError::Network(err) => err.is_retryable(),
            DashError::Storage(_) => false,
            DashError::Config(_) => false,
            DashError::System(err) => err.is_transient(),
            DashError::Ui(_) => false,
            DashError::WithContext { error, .. } => error.is_retryable(),
        }
    }

    /// Short message suitable for an error sub-state on screen.
    pub fn user_message(&self) -> String {
        match self {
            DashError::Network(err) => err.user_message(),
            DashError::Storage(err) => err.user_message(),
            DashError::Config(err) => err.user_message(),
            DashError::System(err) => err.user_message(),
            DashError::Ui(err) => err.user_message(),
            DashError::WithContext { error, .. } => error.user_message(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            DashError::Network(err) => err.error_code(),
            DashError::Storage(err) => err.error_code(),
            DashError::Config(err) => err.error_code(),
            DashError::System(err) => err.error_code(),
            DashError::Ui(err) => err.error_code(),
            DashError::WithContext { error, .. } => error.error_code(),
        }
    }

    pub fn with_context(self, ctx: ErrorContext) -> Self {
        DashError::WithContext {
            error: Box::new(self),
            context: ctx,
        }
    }

    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            DashError::WithContext { context, .. } => Some(context),
            _ => None,
        }
    }

    /// The innermost error, with all context layers removed.
    pub fn inner(&self) -> &DashError {
        match self {
            DashError::WithContext { error, .. } => error.inner(),
            _ => self,
        }
    }

    pub fn recovery_hint(&self) -> &'static str {
        self.category().recovery_hint()
    }
}

impl fmt::Display for DashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashError::Network(err) => write!(f, "{}", err),
            DashError::Storage(err) => write!(f, "{}", err),
            DashError::Config(err) => write!(f, "{}", err),
            DashError::System(err) => write!(f, "{}", err),
            DashError::Ui(err) => write!(f, "{}", err),
            DashError::WithContext { error, context } => write!(f, "{} ({})", error, context),
        }
    }
}

impl std::error::Error for DashError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DashError::Network(err) => Some(err),
            DashError::Storage(err) => Some(err),
            DashError::Config(err) => Some(err),
            DashError::System(err) => Some(err),
            DashError::Ui(err) => Some(err),
            DashError::WithContext { error, .. } => error.source(),
        }
    }
}

// ============================================================================
// From implementations for domain errors
// ============================================================================

impl From<NetworkError> for DashError {
    fn from(err: NetworkError) -> Self {
        DashError::Network(err)
    }
}

impl From<StorageError> for DashError {
    fn from(err: StorageError) -> Self {
        DashError::Storage(err)
    }
}

impl From<ConfigError> for DashError {
    fn from(err: ConfigError) -> Self {
        DashError::Config(err)
    }
}

impl From<SystemError> for DashError {
    fn from(err: SystemError) -> Self {
        DashError::System(err)
    }
}

impl From<UiError> for DashError {
    fn from(err: UiError) -> Self {
        DashError::Ui(err)
    }
}

// ============================================================================
// From implementations for external error types
// ============================================================================

impl From<std::io::Error> for DashError {
    fn from(err: std::io::Error) -> Self {
        use super::system::classify_io_error;
        DashError::System(classify_io_error(err, None, "I/O operation"))
    }
}

impl From<serde_json::Error> for DashError {
    fn from(err: serde_json::Error) -> Self {
        DashError::Network(NetworkError::InvalidResponse {
            message: err.to_string(),
        })
    }
}

impl From<reqwest::Error> for DashError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        DashError::Network(super::network::classify_reqwest_error(&err, &url))
    }
}

impl From<rusqlite::Error> for DashError {
    fn from(err: rusqlite::Error) -> Self {
        DashError::Storage(err.into())
    }
}

impl From<tokio::task::JoinError> for DashError {
    fn from(err: tokio::task::JoinError) -> Self {
        DashError::System(SystemError::Task {
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_http_status_categories() {
        let server: DashError = NetworkError::HttpStatus {
            status: 502,
            url: "u".to_string(),
            body: String::new(),
        }
        .into();
        assert_eq!(server.category(), ErrorCategory::Server);

        let auth: DashError = NetworkError::HttpStatus {
            status: 401,
            url: "u".to_string(),
            body: String::new(),
        }
        .into();
        assert_eq!(auth.category(), ErrorCategory::Auth);

        let client: DashError = NetworkError::HttpStatus {
            status: 422,
            url: "u".to_string(),
            body: String::new(),
        }
        .into();
        assert_eq!(client.category(), ErrorCategory::Client);
    }

    #[test]
    fn test_missing_token_is_auth() {
        let err: DashError = NetworkError::MissingToken {
            service: "GitHub".to_string(),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Auth);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_storage_is_system() {
        let err: DashError = StorageError::Poisoned.into();
        assert_eq!(err.category(), ErrorCategory::System);
        assert_eq!(err.error_code(), "E_DB_POISON");
    }

    #[test]
    fn test_context_wraps_and_unwraps() {
        let err: DashError = NetworkError::Cancelled.into();
        let wrapped = err
            .with_context(ErrorContext::new("outer"))
            .with_context(ErrorContext::new("outermost"));

        assert_eq!(wrapped.context().map(|c| c.operation.as_str()), Some("outermost"));
        assert!(matches!(wrapped.inner(), DashError::Network(NetworkError::Cancelled)));
        assert_eq!(wrapped.error_code(), "E_NET_CANCEL");
        assert!(wrapped.to_string().contains("[outermost]"));
    }

    #[test]
    fn test_source_chain() {
        let err: DashError = UiError::Render {
            component: "frame".to_string(),
            message: "x".to_string(),
        }
        .into();
        assert!(err.source().is_some());
    }

    #[test]
    fn test_json_error_is_invalid_response() {
        let json_err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        let err: DashError = json_err.into();
        assert!(matches!(err, DashError::Network(NetworkError::InvalidResponse { .. })));
    }
}
