//! Periodic refresh: sync the code host into the cache, then reload every
//! screen from the cache.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::screens::{wait_for_shutdown, RefreshJob, ScreenId};
use crate::traits::{CodeHost, DataCache};

use super::AppMessage;

/// Outcome of one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub pulls: usize,
    pub runs: usize,
    pub closed: usize,
    pub failed_repos: usize,
}

/// Copy open pulls and failed runs of each repository into the cache and
/// close cached pulls that are no longer open. A failing repository is
/// logged and skipped.
pub async fn sync_repos(
    code_host: &dyn CodeHost,
    cache: &dyn DataCache,
    repos: &[String],
) -> SyncReport {
    let mut report = SyncReport::default();

    for repo in repos {
        match sync_repo(code_host, cache, repo).await {
            Ok((pulls, runs, closed)) => {
                report.pulls += pulls;
                report.runs += runs;
                report.closed += closed;
            }
            Err(err) => {
                report.failed_repos += 1;
                tracing::warn!(repo = %repo, error = %err, "sync failed, keeping cached data");
            }
        }
    }

    tracing::debug!(
        pulls = report.pulls,
        runs = report.runs,
        closed = report.closed,
        failed_repos = report.failed_repos,
        "sync finished"
    );
    report
}

async fn sync_repo(
    code_host: &dyn CodeHost,
    cache: &dyn DataCache,
    repo: &str,
) -> crate::error::DashResult<(usize, usize, usize)> {
    let pulls = code_host.open_pulls(repo).await?;
    for pull in &pulls {
        cache.upsert_pull(pull).await?;
    }
    let open: Vec<u64> = pulls.iter().map(|p| p.number).collect();
    let closed = cache.close_missing_pulls(repo, &open).await?;

    let runs = code_host.failed_runs(repo).await?;
    for run in &runs {
        cache.upsert_run(run).await?;
    }
    Ok((pulls.len(), runs.len(), closed))
}

/// Everything a refresh cycle needs, captured on the loop task.
pub struct RefreshCycle {
    pub code_host: Arc<dyn CodeHost>,
    pub cache: Arc<dyn DataCache>,
    pub repos: Vec<String>,
    pub jobs: Vec<(ScreenId, RefreshJob)>,
}

/// Run `cycle` in the background. Jobs are lazy, so they read the cache only
/// after the sync finishes. Each job's failure is logged on its own and
/// never affects the others.
pub fn spawn_refresh_cycle(
    cycle: RefreshCycle,
    tx: mpsc::UnboundedSender<AppMessage>,
    shutdown: watch::Receiver<bool>,
    in_flight: Arc<AtomicBool>,
) -> JoinHandle<()> {
    in_flight.store(true, Ordering::SeqCst);

    tokio::spawn(async move {
        let work = async {
            sync_repos(cycle.code_host.as_ref(), cycle.cache.as_ref(), &cycle.repos).await;

            let results = join_all(
                cycle
                    .jobs
                    .into_iter()
                    .map(|(screen, job)| async move { (screen, job.await) }),
            )
            .await;

            for (screen, result) in results {
                match result {
                    Ok(event) => {
                        let _ = tx.send(AppMessage::Screen {
                            screen,
                            generation: None,
                            event,
                        });
                    }
                    Err(err) => {
                        tracing::error!(screen = %screen, error = %err, "screen refresh failed");
                    }
                }
            }
        };

        tokio::select! {
            _ = wait_for_shutdown(shutdown) => tracing::debug!("refresh cancelled by shutdown"),
            _ = work => {}
        }
        in_flight.store(false, Ordering::SeqCst);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockCache, MockCodeHost};
    use crate::models::{CiState, PullRequest, PullState};
    use chrono::Utc;

    fn pull(repo: &str, number: u64) -> PullRequest {
        PullRequest {
            repo: repo.to_string(),
            number,
            title: format!("Change {}", number),
            author: "octocat".to_string(),
            state: PullState::Open,
            ci_status: CiState::Success,
            files_changed: 1,
            additions: 1,
            deletions: 0,
            url: String::new(),
            head_sha: "abc".to_string(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_sync_skips_failing_repo() {
        let host = MockCodeHost::new();
        host.set_pulls("octo/a", vec![pull("octo/a", 1), pull("octo/a", 2)]);
        host.fail_repo("octo/b");
        let cache = MockCache::new();

        let repos = vec!["octo/b".to_string(), "octo/a".to_string()];
        let report = sync_repos(&host, &cache, &repos).await;

        assert_eq!(report.pulls, 2);
        assert_eq!(report.failed_repos, 1);
        assert_eq!(cache.pulls().len(), 2);
    }

    #[tokio::test]
    async fn test_sync_closes_merged_pulls() {
        let cache = MockCache::new().with_pulls(vec![pull("octo/a", 1), pull("octo/a", 2)]);
        let host = MockCodeHost::new();
        host.set_pulls("octo/a", vec![pull("octo/a", 2)]);

        let report = sync_repos(&host, &cache, &["octo/a".to_string()]).await;

        assert_eq!(report.closed, 1);
        let pending = cache.pending_pulls(&[]).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].number, 2);
    }
}
