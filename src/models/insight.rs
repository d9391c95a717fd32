//! Structured results parsed out of assistant replies.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    #[default]
    Unknown,
}

impl RiskLevel {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LOW" => RiskLevel::Low,
            "MEDIUM" | "MED" => RiskLevel::Medium,
            "HIGH" => RiskLevel::High,
            _ => RiskLevel::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a pull request review submitted from the triage screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewVerdict {
    Approve,
    RequestChanges,
}

impl ReviewVerdict {
    /// Value of the `event` field in GitHub's review API.
    pub fn api_event(&self) -> &'static str {
        match self {
            ReviewVerdict::Approve => "APPROVE",
            ReviewVerdict::RequestChanges => "REQUEST_CHANGES",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PullInsight {
    pub summary: String,
    pub risk: RiskLevel,
    pub concern: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunDiagnosis {
    pub diagnosis: String,
    pub fix: String,
    pub caused_by: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeployAssessment {
    /// 0 to 100.
    pub confidence: u8,
    pub risk: RiskLevel,
    pub analysis: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_parse_is_lenient() {
        assert_eq!(RiskLevel::parse(" high "), RiskLevel::High);
        assert_eq!(RiskLevel::parse("Medium"), RiskLevel::Medium);
        assert_eq!(RiskLevel::parse("catastrophic"), RiskLevel::Unknown);
    }

    #[test]
    fn test_review_events() {
        assert_eq!(ReviewVerdict::Approve.api_event(), "APPROVE");
        assert_eq!(ReviewVerdict::RequestChanges.api_event(), "REQUEST_CHANGES");
    }
}
