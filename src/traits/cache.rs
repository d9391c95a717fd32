//! Local data cache abstraction.

use async_trait::async_trait;

use crate::error::DashResult;
use crate::models::{CiRun, DeployRecord, PullRequest, StandupRecord};

/// Maximum number of failed runs returned by [`DataCache::failed_runs`].
pub const FAILED_RUN_LIMIT: usize = 10;

/// Durable store shared by the sync job and the screens.
///
/// Upserts are last-write-wins keyed by `(repo, number)` for pulls and
/// `(repo, run_id)` for runs. Reads are ordered newest first.
#[async_trait]
pub trait DataCache: Send + Sync {
    async fn upsert_pull(&self, pull: &PullRequest) -> DashResult<()>;

    /// Mark open pulls of `repo` not in `open_numbers` as closed.
    /// Returns how many rows changed.
    async fn close_missing_pulls(&self, repo: &str, open_numbers: &[u64]) -> DashResult<usize>;

    /// Open pulls, optionally restricted to `repos` (empty means all).
    async fn pending_pulls(&self, repos: &[String]) -> DashResult<Vec<PullRequest>>;

    async fn upsert_run(&self, run: &CiRun) -> DashResult<()>;

    /// Up to [`FAILED_RUN_LIMIT`] runs with conclusion `failure`.
    async fn failed_runs(&self, repo: Option<&str>) -> DashResult<Vec<CiRun>>;

    /// Replaces any standup already stored for the same date.
    async fn save_standup(&self, record: &StandupRecord) -> DashResult<()>;

    async fn latest_standup(&self) -> DashResult<Option<StandupRecord>>;

    async fn save_deploy(&self, record: &DeployRecord) -> DashResult<()>;

    async fn recent_deploys(&self, limit: usize) -> DashResult<Vec<DeployRecord>>;
}
