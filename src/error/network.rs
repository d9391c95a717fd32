//! Network-related error types.
//!
//! Failures talking to the GitHub REST API and the Models chat endpoint.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    #[error("connection to '{url}' failed: {message}")]
    ConnectionFailed { url: String, message: String },

    #[error("{operation} timed out after {duration_secs} seconds")]
    Timeout {
        operation: String,
        duration_secs: u64,
    },

    #[error("HTTP {status} from {url}: {body}")]
    HttpStatus {
        status: u16,
        url: String,
        body: String,
    },

    #[error("rate limited")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("no {service} token configured")]
    MissingToken { service: String },

    #[error("request cancelled")]
    Cancelled,

    #[error("network error: {message}")]
    Other { message: String },
}

impl NetworkError {
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::ConnectionFailed { .. } => true,
            NetworkError::Timeout { .. } => true,
            NetworkError::HttpStatus { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            NetworkError::RateLimited { .. } => true,
            NetworkError::InvalidResponse { .. } => false,
            NetworkError::MissingToken { .. } => false,
            NetworkError::Cancelled => false,
            NetworkError::Other { .. } => false,
        }
    }

    /// True when the remote side refused our credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            NetworkError::MissingToken { .. } | NetworkError::HttpStatus { status: 401 | 403, .. }
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            NetworkError::ConnectionFailed { .. } => "Can't reach GitHub.".to_string(),
            NetworkError::Timeout { operation, .. } => format!("{} timed out.", operation),
            NetworkError::HttpStatus { status, .. } => match *status {
                401 => "GitHub rejected the token.".to_string(),
                403 => "Token lacks permission for this action.".to_string(),
                404 => "Not found on GitHub.".to_string(),
                422 => "GitHub refused the request.".to_string(),
                500..=599 => "GitHub is having issues.".to_string(),
                _ => format!("GitHub returned HTTP {}.", status),
            },
            NetworkError::RateLimited {
                retry_after_secs: Some(secs),
            } => format!("Rate limited, wait {}s.", secs),
            NetworkError::RateLimited { .. } => "Rate limited, wait a moment.".to_string(),
            NetworkError::InvalidResponse { .. } => "Unexpected response.".to_string(),
            NetworkError::MissingToken { service } => format!("No {} token configured.", service),
            NetworkError::Cancelled => "Request cancelled.".to_string(),
            NetworkError::Other { message } => format!("Network error: {}", message),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed { .. } => "E_NET_CONN",
            NetworkError::Timeout { .. } => "E_NET_TIMEOUT",
            NetworkError::HttpStatus { .. } => "E_NET_HTTP",
            NetworkError::RateLimited { .. } => "E_NET_RATE",
            NetworkError::InvalidResponse { .. } => "E_NET_INVALID",
            NetworkError::MissingToken { .. } => "E_NET_TOKEN",
            NetworkError::Cancelled => "E_NET_CANCEL",
            NetworkError::Other { .. } => "E_NET_OTHER",
        }
    }
}

/// Classify a reqwest error into a NetworkError.
pub fn classify_reqwest_error(err: &reqwest::Error, url: &str) -> NetworkError {
    if err.is_connect() {
        NetworkError::ConnectionFailed {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else if err.is_timeout() {
        NetworkError::Timeout {
            operation: "HTTP request".to_string(),
            duration_secs: 30,
        }
    } else if let Some(status) = err.status() {
        match status.as_u16() {
            429 => NetworkError::RateLimited {
                retry_after_secs: None,
            },
            code => NetworkError::HttpStatus {
                status: code,
                url: url.to_string(),
                body: err.to_string(),
            },
        }
    } else if err.is_decode() {
        NetworkError::InvalidResponse {
            message: format!("failed to decode response: {}", err),
        }
    } else {
        NetworkError::Other {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> NetworkError {
        NetworkError::HttpStatus {
            status: code,
            url: "https://api.github.com/repos/o/r/pulls".to_string(),
            body: String::new(),
        }
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(status(502).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!status(422).is_retryable());
    }

    #[test]
    fn test_auth_failure() {
        assert!(status(401).is_auth_failure());
        assert!(status(403).is_auth_failure());
        assert!(!status(500).is_auth_failure());
        assert!(NetworkError::MissingToken {
            service: "GitHub".to_string()
        }
        .is_auth_failure());
    }

    #[test]
    fn test_display_includes_status_and_url() {
        let msg = status(500).to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("api.github.com"));
    }

    #[test]
    fn test_user_messages_are_short() {
        for err in [status(401), status(503), NetworkError::Cancelled] {
            assert!(err.user_message().len() < 48, "{}", err.user_message());
        }
    }
}
