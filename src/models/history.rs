use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::RiskLevel;

/// One generated standup per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandupRecord {
    pub date: NaiveDate,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployOutcome {
    Success,
    Failed,
}

impl DeployOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployOutcome::Success => "success",
            DeployOutcome::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Self {
        if raw == "success" {
            DeployOutcome::Success
        } else {
            DeployOutcome::Failed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployRecord {
    pub repo: String,
    pub git_ref: String,
    pub confidence: u8,
    pub risk: RiskLevel,
    pub outcome: DeployOutcome,
    pub created_at: DateTime<Utc>,
}
