use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Combined commit status of a pull request's head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CiState {
    Success,
    Failure,
    Pending,
    #[default]
    Unknown,
}

impl CiState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CiState::Success => "success",
            CiState::Failure => "failure",
            CiState::Pending => "pending",
            CiState::Unknown => "unknown",
        }
    }

    /// Lenient parse of GitHub's status strings. `error` counts as failure.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "success" => CiState::Success,
            "failure" | "error" => CiState::Failure,
            "pending" => CiState::Pending,
            _ => CiState::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PullState {
    #[default]
    Open,
    Closed,
}

impl PullState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullState::Open => "open",
            PullState::Closed => "closed",
        }
    }

    pub fn parse(raw: &str) -> Self {
        if raw == "open" {
            PullState::Open
        } else {
            PullState::Closed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    /// `owner/name`
    pub repo: String,
    pub number: u64,
    pub title: String,
    pub author: String,
    pub state: PullState,
    pub ci_status: CiState,
    pub files_changed: u32,
    pub additions: u32,
    pub deletions: u32,
    pub url: String,
    pub head_sha: String,
    pub updated_at: DateTime<Utc>,
}

impl PullRequest {
    /// `owner/name#123`
    pub fn reference(&self) -> String {
        format!("{}#{}", self.repo, self.number)
    }
}

/// A completed workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CiRun {
    pub repo: String,
    pub run_id: u64,
    pub workflow: String,
    pub branch: String,
    pub status: String,
    pub conclusion: String,
    pub url: String,
    pub head_sha: String,
    pub updated_at: DateTime<Utc>,
}

impl CiRun {
    pub fn is_failure(&self) -> bool {
        self.conclusion == "failure"
    }
}

/// Recent work in one repository, fed to standup generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoActivity {
    pub repo: String,
    /// First line of each commit message since the lookback window.
    pub commits: Vec<String>,
    /// `#number title` of pulls merged in the window.
    pub merged_pulls: Vec<String>,
}

impl RepoActivity {
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty() && self.merged_pulls.is_empty()
    }
}
