//! Code-hosting service abstraction.

use async_trait::async_trait;

use crate::error::DashResult;
use crate::models::{CiRun, PullRequest, RepoActivity, ReviewVerdict};

/// Remote operations against the code host. `repo` is always `owner/name`.
#[async_trait]
pub trait CodeHost: Send + Sync {
    /// Open pull requests, newest first, with the head commit's CI state.
    async fn open_pulls(&self, repo: &str) -> DashResult<Vec<PullRequest>>;

    /// Recently completed runs whose conclusion is `failure`.
    async fn failed_runs(&self, repo: &str) -> DashResult<Vec<CiRun>>;

    async fn unread_notifications(&self) -> DashResult<usize>;

    /// Condensed diff (file names plus truncated patches) for analysis.
    async fn pull_diff(&self, repo: &str, number: u64) -> DashResult<String>;

    /// Failed jobs and steps of a run, condensed for diagnosis.
    async fn run_log_summary(&self, repo: &str, run_id: u64) -> DashResult<String>;

    async fn recent_activity(&self, repo: &str, hours: u32) -> DashResult<RepoActivity>;

    async fn submit_review(
        &self,
        repo: &str,
        number: u64,
        verdict: ReviewVerdict,
        body: &str,
    ) -> DashResult<()>;

    /// Returns the new issue's number.
    async fn open_issue(&self, repo: &str, title: &str, body: &str) -> DashResult<u64>;

    async fn dispatch_workflow(
        &self,
        repo: &str,
        workflow: &str,
        git_ref: &str,
        inputs: serde_json::Value,
    ) -> DashResult<()>;
}
