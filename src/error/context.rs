//! Error context for enriched error information.

use chrono::{DateTime, Utc};

/// Where and when an error happened.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorContext {
    /// The operation that failed, e.g. `"analyze_pull"`.
    pub operation: String,

    /// Screen that started the operation, if any.
    pub screen: Option<String>,

    /// Repository the operation targeted (`owner/name`).
    pub repo: Option<String>,

    pub component: Option<String>,

    pub retry_count: u32,

    pub timestamp: DateTime<Utc>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            screen: None,
            repo: None,
            component: None,
            retry_count: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn with_screen(mut self, screen: impl Into<String>) -> Self {
        self.screen = Some(screen.into());
        self
    }

    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = Some(repo.into());
        self
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn with_retry_count(mut self, count: u32) -> Self {
        self.retry_count = count;
        self
    }

    /// Formatted `key=value` string for log lines.
    pub fn to_log_string(&self) -> String {
        let mut parts = vec![format!("operation={}", self.operation)];

        if let Some(ref screen) = self.screen {
            parts.push(format!("screen={}", screen));
        }
        if let Some(ref repo) = self.repo {
            parts.push(format!("repo={}", repo));
        }
        if let Some(ref component) = self.component {
            parts.push(format!("component={}", component));
        }
        if self.retry_count > 0 {
            parts.push(format!("retry_count={}", self.retry_count));
        }

        parts.push(format!("timestamp={}", self.timestamp.to_rfc3339()));
        parts.join(" ")
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.operation)?;

        if let Some(ref screen) = self.screen {
            write!(f, " screen={}", screen)?;
        }
        if let Some(ref repo) = self.repo {
            write!(f, " repo={}", repo)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let ctx = ErrorContext::new("analyze_pull")
            .with_screen("pr_triage")
            .with_repo("octo/widgets")
            .with_component("models_api")
            .with_retry_count(1);

        assert_eq!(ctx.operation, "analyze_pull");
        assert_eq!(ctx.screen.as_deref(), Some("pr_triage"));
        assert_eq!(ctx.repo.as_deref(), Some("octo/widgets"));
        assert_eq!(ctx.component.as_deref(), Some("models_api"));
        assert_eq!(ctx.retry_count, 1);
    }

    #[test]
    fn test_context_display_minimal() {
        let ctx = ErrorContext::new("sync");
        assert_eq!(ctx.to_string(), "[sync]");
    }

    #[test]
    fn test_context_to_log_string() {
        let log = ErrorContext::new("failed_runs")
            .with_repo("octo/widgets")
            .to_log_string();

        assert!(log.contains("operation=failed_runs"));
        assert!(log.contains("repo=octo/widgets"));
        assert!(log.contains("timestamp="));
        assert!(!log.contains("retry_count"));
    }
}
