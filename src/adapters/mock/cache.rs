//! In-memory [`DataCache`] with the same ordering rules as the SQLite one.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{DashResult, StorageError};
use crate::models::{CiRun, DeployRecord, PullRequest, PullState, StandupRecord};
use crate::traits::cache::FAILED_RUN_LIMIT;
use crate::traits::DataCache;

#[derive(Debug, Default)]
struct State {
    pulls: Vec<PullRequest>,
    runs: Vec<CiRun>,
    standups: Vec<StandupRecord>,
    deploys: Vec<DeployRecord>,
    failing: bool,
}

#[derive(Debug, Default)]
pub struct MockCache {
    state: Mutex<State>,
}

impl MockCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pulls(self, pulls: Vec<PullRequest>) -> Self {
        self.lock().pulls = pulls;
        self
    }

    pub fn with_runs(self, runs: Vec<CiRun>) -> Self {
        self.lock().runs = runs;
        self
    }

    pub fn with_standup(self, record: StandupRecord) -> Self {
        self.lock().standups.push(record);
        self
    }

    /// Make every call fail with a storage error.
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    pub fn pulls(&self) -> Vec<PullRequest> {
        self.lock().pulls.clone()
    }

    pub fn runs(&self) -> Vec<CiRun> {
        self.lock().runs.clone()
    }

    pub fn standups(&self) -> Vec<StandupRecord> {
        self.lock().standups.clone()
    }

    pub fn deploys(&self) -> Vec<DeployRecord> {
        self.lock().deploys.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn checked(&self, operation: &str) -> DashResult<std::sync::MutexGuard<'_, State>> {
        let state = self.lock();
        if state.failing {
            return Err(StorageError::Query {
                operation: operation.to_string(),
                message: "mock failure".to_string(),
            }
            .into());
        }
        Ok(state)
    }
}

#[async_trait]
impl DataCache for MockCache {
    async fn upsert_pull(&self, pull: &PullRequest) -> DashResult<()> {
        let mut state = self.checked("upsert pull")?;
        state
            .pulls
            .retain(|p| !(p.repo == pull.repo && p.number == pull.number));
        state.pulls.push(pull.clone());
        Ok(())
    }

    async fn close_missing_pulls(&self, repo: &str, open_numbers: &[u64]) -> DashResult<usize> {
        let mut state = self.checked("close missing pulls")?;
        let mut closed = 0;
        for pull in state.pulls.iter_mut().filter(|p| p.repo == repo) {
            if pull.state == PullState::Open && !open_numbers.contains(&pull.number) {
                pull.state = PullState::Closed;
                closed += 1;
            }
        }
        Ok(closed)
    }

    async fn pending_pulls(&self, repos: &[String]) -> DashResult<Vec<PullRequest>> {
        let state = self.checked("pending pulls")?;
        let mut pulls: Vec<PullRequest> = state
            .pulls
            .iter()
            .filter(|p| p.state == PullState::Open)
            .filter(|p| repos.is_empty() || repos.contains(&p.repo))
            .cloned()
            .collect();
        pulls.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(pulls)
    }

    async fn upsert_run(&self, run: &CiRun) -> DashResult<()> {
        let mut state = self.checked("upsert run")?;
        state
            .runs
            .retain(|r| !(r.repo == run.repo && r.run_id == run.run_id));
        state.runs.push(run.clone());
        Ok(())
    }

    async fn failed_runs(&self, repo: Option<&str>) -> DashResult<Vec<CiRun>> {
        let state = self.checked("failed runs")?;
        let mut runs: Vec<CiRun> = state
            .runs
            .iter()
            .filter(|r| r.is_failure())
            .filter(|r| repo.map(|repo| r.repo == repo).unwrap_or(true))
            .cloned()
            .collect();
        runs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        runs.truncate(FAILED_RUN_LIMIT);
        Ok(runs)
    }

    async fn save_standup(&self, record: &StandupRecord) -> DashResult<()> {
        let mut state = self.checked("save standup")?;
        state.standups.retain(|s| s.date != record.date);
        state.standups.push(record.clone());
        Ok(())
    }

    async fn latest_standup(&self) -> DashResult<Option<StandupRecord>> {
        let state = self.checked("latest standup")?;
        Ok(state.standups.iter().max_by_key(|s| s.date).cloned())
    }

    async fn save_deploy(&self, record: &DeployRecord) -> DashResult<()> {
        self.checked("save deploy")?.deploys.push(record.clone());
        Ok(())
    }

    async fn recent_deploys(&self, limit: usize) -> DashResult<Vec<DeployRecord>> {
        let state = self.checked("recent deploys")?;
        Ok(state.deploys.iter().rev().take(limit).cloned().collect())
    }
}
