//! Scripted [`CodeHost`] that records every write.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{DashResult, NetworkError};
use crate::models::{CiRun, PullRequest, RepoActivity, ReviewVerdict};
use crate::traits::CodeHost;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedReview {
    pub repo: String,
    pub number: u64,
    pub verdict: ReviewVerdict,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedIssue {
    pub repo: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDispatch {
    pub repo: String,
    pub workflow: String,
    pub git_ref: String,
    pub inputs: Value,
}

#[derive(Debug, Default)]
struct State {
    pulls: HashMap<String, Vec<PullRequest>>,
    runs: HashMap<String, Vec<CiRun>>,
    activity: HashMap<String, RepoActivity>,
    notifications: usize,
    diff: String,
    run_log: String,
    failing_repos: HashSet<String>,
    fail_writes: bool,
    reviews: Vec<RecordedReview>,
    issues: Vec<RecordedIssue>,
    dispatches: Vec<RecordedDispatch>,
}

#[derive(Debug, Default)]
pub struct MockCodeHost {
    state: Mutex<State>,
}

impl MockCodeHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_pulls(&self, repo: &str, pulls: Vec<PullRequest>) {
        self.lock().pulls.insert(repo.to_string(), pulls);
    }

    pub fn set_runs(&self, repo: &str, runs: Vec<CiRun>) {
        self.lock().runs.insert(repo.to_string(), runs);
    }

    pub fn set_activity(&self, activity: RepoActivity) {
        self.lock().activity.insert(activity.repo.clone(), activity);
    }

    pub fn set_notifications(&self, count: usize) {
        self.lock().notifications = count;
    }

    pub fn set_diff(&self, diff: impl Into<String>) {
        self.lock().diff = diff.into();
    }

    pub fn set_run_log(&self, log: impl Into<String>) {
        self.lock().run_log = log.into();
    }

    /// Reads for `repo` fail with a server error.
    pub fn fail_repo(&self, repo: &str) {
        self.lock().failing_repos.insert(repo.to_string());
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    pub fn reviews(&self) -> Vec<RecordedReview> {
        self.lock().reviews.clone()
    }

    pub fn issues(&self) -> Vec<RecordedIssue> {
        self.lock().issues.clone()
    }

    pub fn dispatches(&self) -> Vec<RecordedDispatch> {
        self.lock().dispatches.clone()
    }

    fn check_repo(&self, repo: &str) -> DashResult<()> {
        if self.lock().failing_repos.contains(repo) {
            return Err(server_error(repo).into());
        }
        Ok(())
    }

    fn check_writes(&self, repo: &str) -> DashResult<()> {
        if self.lock().fail_writes {
            return Err(server_error(repo).into());
        }
        Ok(())
    }
}

fn server_error(repo: &str) -> NetworkError {
    NetworkError::HttpStatus {
        status: 502,
        url: format!("mock://{}", repo),
        body: "bad gateway".to_string(),
    }
}

#[async_trait]
impl CodeHost for MockCodeHost {
    async fn open_pulls(&self, repo: &str) -> DashResult<Vec<PullRequest>> {
        self.check_repo(repo)?;
        Ok(self.lock().pulls.get(repo).cloned().unwrap_or_default())
    }

    async fn failed_runs(&self, repo: &str) -> DashResult<Vec<CiRun>> {
        self.check_repo(repo)?;
        Ok(self.lock().runs.get(repo).cloned().unwrap_or_default())
    }

    async fn unread_notifications(&self) -> DashResult<usize> {
        Ok(self.lock().notifications)
    }

    async fn pull_diff(&self, repo: &str, _number: u64) -> DashResult<String> {
        self.check_repo(repo)?;
        Ok(self.lock().diff.clone())
    }

    async fn run_log_summary(&self, repo: &str, _run_id: u64) -> DashResult<String> {
        self.check_repo(repo)?;
        Ok(self.lock().run_log.clone())
    }

    async fn recent_activity(&self, repo: &str, _hours: u32) -> DashResult<RepoActivity> {
        self.check_repo(repo)?;
        Ok(self
            .lock()
            .activity
            .get(repo)
            .cloned()
            .unwrap_or_else(|| RepoActivity {
                repo: repo.to_string(),
                ..Default::default()
            }))
    }

    async fn submit_review(
        &self,
        repo: &str,
        number: u64,
        verdict: ReviewVerdict,
        body: &str,
    ) -> DashResult<()> {
        self.check_writes(repo)?;
        self.lock().reviews.push(RecordedReview {
            repo: repo.to_string(),
            number,
            verdict,
            body: body.to_string(),
        });
        Ok(())
    }

    async fn open_issue(&self, repo: &str, title: &str, body: &str) -> DashResult<u64> {
        self.check_writes(repo)?;
        let mut state = self.lock();
        state.issues.push(RecordedIssue {
            repo: repo.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(state.issues.len() as u64)
    }

    async fn dispatch_workflow(
        &self,
        repo: &str,
        workflow: &str,
        git_ref: &str,
        inputs: Value,
    ) -> DashResult<()> {
        self.check_writes(repo)?;
        self.lock().dispatches.push(RecordedDispatch {
            repo: repo.to_string(),
            workflow: workflow.to_string(),
            git_ref: git_ref.to_string(),
            inputs,
        });
        Ok(())
    }
}
