//! SQLite-backed [`DataCache`].
//!
//! One connection behind a mutex. Every call hops onto the blocking pool so
//! the render loop never waits on disk.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::error::{DashResult, StorageError};
use crate::models::{
    CiRun, CiState, DeployOutcome, DeployRecord, PullRequest, PullState, RiskLevel,
    StandupRecord,
};
use crate::traits::cache::FAILED_RUN_LIMIT;
use crate::traits::DataCache;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS pr_cache (
    id INTEGER PRIMARY KEY,
    repo TEXT NOT NULL,
    number INTEGER NOT NULL,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    state TEXT NOT NULL,
    ci_status TEXT NOT NULL,
    files_changed INTEGER NOT NULL DEFAULT 0,
    additions INTEGER NOT NULL DEFAULT 0,
    deletions INTEGER NOT NULL DEFAULT 0,
    url TEXT NOT NULL DEFAULT '',
    head_sha TEXT NOT NULL DEFAULT '',
    updated_at TEXT NOT NULL,
    synced_at TEXT NOT NULL,
    UNIQUE(repo, number)
);

CREATE TABLE IF NOT EXISTS ci_cache (
    id INTEGER PRIMARY KEY,
    repo TEXT NOT NULL,
    run_id INTEGER NOT NULL,
    workflow TEXT NOT NULL,
    branch TEXT NOT NULL,
    status TEXT NOT NULL,
    conclusion TEXT NOT NULL,
    url TEXT NOT NULL DEFAULT '',
    head_sha TEXT NOT NULL DEFAULT '',
    updated_at TEXT NOT NULL,
    synced_at TEXT NOT NULL,
    UNIQUE(repo, run_id)
);

CREATE TABLE IF NOT EXISTS standup_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL UNIQUE,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS deploy_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repo TEXT NOT NULL,
    ref TEXT NOT NULL,
    confidence INTEGER NOT NULL,
    risk TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL
);
";

const PULL_COLUMNS: &str = "repo, number, title, author, state, ci_status, files_changed, \
     additions, deletions, url, head_sha, updated_at";

const RUN_COLUMNS: &str =
    "repo, run_id, workflow, branch, status, conclusion, url, head_sha, updated_at";

#[derive(Clone)]
pub struct SqliteCache {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCache").finish_non_exhaustive()
    }
}

impl SqliteCache {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open(path: &Path) -> DashResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| StorageError::Open {
                    path: path.display().to_string(),
                    message: err.to_string(),
                })?;
            }
        }
        let conn = Connection::open(path).map_err(|err| StorageError::Open {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        let cache = Self::from_connection(conn)?;
        tracing::info!(path = %path.display(), "cache opened");
        Ok(cache)
    }

    pub fn in_memory() -> DashResult<Self> {
        let conn = Connection::open_in_memory().map_err(|err| StorageError::Open {
            path: ":memory:".to_string(),
            message: err.to_string(),
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> DashResult<Self> {
        bootstrap(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn run<T, F>(&self, operation: &'static str, f: F) -> DashResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let result = tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StorageError::Poisoned)?;
            f(&mut guard).map_err(|err| StorageError::Query {
                operation: operation.to_string(),
                message: err.to_string(),
            })
        })
        .await?;
        Ok(result?)
    }
}

fn bootstrap(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(SCHEMA)
        .map_err(|err| StorageError::Query {
            operation: "bootstrap".to_string(),
            message: err.to_string(),
        })
}

fn pull_from_row(row: &Row<'_>) -> rusqlite::Result<PullRequest> {
    let state: String = row.get(4)?;
    let ci_status: String = row.get(5)?;
    Ok(PullRequest {
        repo: row.get(0)?,
        number: row.get::<_, i64>(1)? as u64,
        title: row.get(2)?,
        author: row.get(3)?,
        state: PullState::parse(&state),
        ci_status: CiState::parse(&ci_status),
        files_changed: row.get(6)?,
        additions: row.get(7)?,
        deletions: row.get(8)?,
        url: row.get(9)?,
        head_sha: row.get(10)?,
        updated_at: row.get::<_, DateTime<Utc>>(11)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<CiRun> {
    Ok(CiRun {
        repo: row.get(0)?,
        run_id: row.get::<_, i64>(1)? as u64,
        workflow: row.get(2)?,
        branch: row.get(3)?,
        status: row.get(4)?,
        conclusion: row.get(5)?,
        url: row.get(6)?,
        head_sha: row.get(7)?,
        updated_at: row.get::<_, DateTime<Utc>>(8)?,
    })
}

fn deploy_from_row(row: &Row<'_>) -> rusqlite::Result<DeployRecord> {
    let risk: String = row.get(3)?;
    let status: String = row.get(4)?;
    Ok(DeployRecord {
        repo: row.get(0)?,
        git_ref: row.get(1)?,
        confidence: row.get(2)?,
        risk: RiskLevel::parse(&risk),
        outcome: DeployOutcome::parse(&status),
        created_at: row.get::<_, DateTime<Utc>>(5)?,
    })
}

#[async_trait]
impl DataCache for SqliteCache {
    async fn upsert_pull(&self, pull: &PullRequest) -> DashResult<()> {
        let pull = pull.clone();
        self.run("upsert pull", move |conn| {
            conn.execute(
                "INSERT INTO pr_cache (repo, number, title, author, state, ci_status, \
                 files_changed, additions, deletions, url, head_sha, updated_at, synced_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13) \
                 ON CONFLICT(repo, number) DO UPDATE SET \
                 title = excluded.title, author = excluded.author, state = excluded.state, \
                 ci_status = excluded.ci_status, files_changed = excluded.files_changed, \
                 additions = excluded.additions, deletions = excluded.deletions, \
                 url = excluded.url, head_sha = excluded.head_sha, \
                 updated_at = excluded.updated_at, synced_at = excluded.synced_at",
                params![
                    pull.repo,
                    pull.number as i64,
                    pull.title,
                    pull.author,
                    pull.state.as_str(),
                    pull.ci_status.as_str(),
                    pull.files_changed,
                    pull.additions,
                    pull.deletions,
                    pull.url,
                    pull.head_sha,
                    pull.updated_at,
                    Utc::now(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn close_missing_pulls(&self, repo: &str, open_numbers: &[u64]) -> DashResult<usize> {
        let mut values = vec![SqlValue::Text(repo.to_string())];
        values.extend(open_numbers.iter().map(|n| SqlValue::Integer(*n as i64)));
        let mut sql =
            "UPDATE pr_cache SET state = 'closed' WHERE repo = ?1 AND state = 'open'".to_string();
        if !open_numbers.is_empty() {
            let placeholders = (0..open_numbers.len())
                .map(|i| format!("?{}", i + 2))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" AND number NOT IN ({})", placeholders));
        }
        self.run("close missing pulls", move |conn| {
            conn.execute(&sql, params_from_iter(values))
        })
        .await
    }

    async fn pending_pulls(&self, repos: &[String]) -> DashResult<Vec<PullRequest>> {
        let repos = repos.to_vec();
        self.run("pending pulls", move |conn| {
            let mut sql = format!("SELECT {} FROM pr_cache WHERE state = 'open'", PULL_COLUMNS);
            if !repos.is_empty() {
                let placeholders = vec!["?"; repos.len()].join(", ");
                sql.push_str(&format!(" AND repo IN ({})", placeholders));
            }
            sql.push_str(" ORDER BY updated_at DESC, number DESC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(repos.iter()), pull_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
    }

    async fn upsert_run(&self, run: &CiRun) -> DashResult<()> {
        let run = run.clone();
        self.run("upsert run", move |conn| {
            conn.execute(
                "INSERT INTO ci_cache (repo, run_id, workflow, branch, status, conclusion, \
                 url, head_sha, updated_at, synced_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) \
                 ON CONFLICT(repo, run_id) DO UPDATE SET \
                 workflow = excluded.workflow, branch = excluded.branch, \
                 status = excluded.status, conclusion = excluded.conclusion, \
                 url = excluded.url, head_sha = excluded.head_sha, \
                 updated_at = excluded.updated_at, synced_at = excluded.synced_at",
                params![
                    run.repo,
                    run.run_id as i64,
                    run.workflow,
                    run.branch,
                    run.status,
                    run.conclusion,
                    run.url,
                    run.head_sha,
                    run.updated_at,
                    Utc::now(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn failed_runs(&self, repo: Option<&str>) -> DashResult<Vec<CiRun>> {
        let repo = repo.map(str::to_string);
        self.run("failed runs", move |conn| {
            let limit = FAILED_RUN_LIMIT as i64;
            match repo {
                Some(repo) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {} FROM ci_cache WHERE conclusion = 'failure' AND repo = ?1 \
                         ORDER BY updated_at DESC, run_id DESC LIMIT ?2",
                        RUN_COLUMNS
                    ))?;
                    let rows = stmt.query_map(params![repo, limit], run_from_row)?;
                    rows.collect::<Result<Vec<_>, _>>()
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {} FROM ci_cache WHERE conclusion = 'failure' \
                         ORDER BY updated_at DESC, run_id DESC LIMIT ?1",
                        RUN_COLUMNS
                    ))?;
                    let rows = stmt.query_map(params![limit], run_from_row)?;
                    rows.collect::<Result<Vec<_>, _>>()
                }
            }
        })
        .await
    }

    async fn save_standup(&self, record: &StandupRecord) -> DashResult<()> {
        let record = record.clone();
        self.run("save standup", move |conn| {
            conn.execute(
                "INSERT INTO standup_history (date, content, created_at) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(date) DO UPDATE SET \
                 content = excluded.content, created_at = excluded.created_at",
                params![record.date, record.content, record.created_at],
            )?;
            Ok(())
        })
        .await
    }

    async fn latest_standup(&self) -> DashResult<Option<StandupRecord>> {
        self.run("latest standup", |conn| {
            conn.query_row(
                "SELECT date, content, created_at FROM standup_history \
                 ORDER BY date DESC LIMIT 1",
                [],
                |row| {
                    Ok(StandupRecord {
                        date: row.get::<_, NaiveDate>(0)?,
                        content: row.get(1)?,
                        created_at: row.get::<_, DateTime<Utc>>(2)?,
                    })
                },
            )
            .optional()
        })
        .await
    }

    async fn save_deploy(&self, record: &DeployRecord) -> DashResult<()> {
        let record = record.clone();
        self.run("save deploy", move |conn| {
            conn.execute(
                "INSERT INTO deploy_history (repo, ref, confidence, risk, status, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.repo,
                    record.git_ref,
                    record.confidence,
                    record.risk.as_str(),
                    record.outcome.as_str(),
                    record.created_at,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn recent_deploys(&self, limit: usize) -> DashResult<Vec<DeployRecord>> {
        self.run("recent deploys", move |conn| {
            let mut stmt = conn.prepare(
                "SELECT repo, ref, confidence, risk, status, created_at FROM deploy_history \
                 ORDER BY created_at DESC, id DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit as i64], deploy_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pull(repo: &str, number: u64, minute: u32) -> PullRequest {
        PullRequest {
            repo: repo.to_string(),
            number,
            title: format!("Change {}", number),
            author: "octocat".to_string(),
            state: PullState::Open,
            ci_status: CiState::Pending,
            files_changed: 3,
            additions: 10,
            deletions: 2,
            url: String::new(),
            head_sha: "abc123".to_string(),
            updated_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, minute, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_upsert_pull_is_last_write_wins() {
        let cache = SqliteCache::in_memory().unwrap();
        let mut first = pull("octo/widgets", 7, 0);
        cache.upsert_pull(&first).await.unwrap();

        first.ci_status = CiState::Success;
        first.title = "Renamed".to_string();
        cache.upsert_pull(&first).await.unwrap();

        let pending = cache.pending_pulls(&[]).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].title, "Renamed");
        assert_eq!(pending[0].ci_status, CiState::Success);
        assert_eq!(pending[0].updated_at, first.updated_at);
    }

    #[tokio::test]
    async fn test_pending_pulls_newest_first_and_filtered() {
        let cache = SqliteCache::in_memory().unwrap();
        cache.upsert_pull(&pull("octo/widgets", 1, 5)).await.unwrap();
        cache.upsert_pull(&pull("octo/widgets", 2, 30)).await.unwrap();
        cache.upsert_pull(&pull("octo/gears", 3, 10)).await.unwrap();

        let all = cache.pending_pulls(&[]).await.unwrap();
        let numbers: Vec<u64> = all.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![2, 3, 1]);

        let gears = cache
            .pending_pulls(&["octo/gears".to_string()])
            .await
            .unwrap();
        assert_eq!(gears.len(), 1);
        assert_eq!(gears[0].number, 3);
    }

    #[tokio::test]
    async fn test_close_missing_pulls() {
        let cache = SqliteCache::in_memory().unwrap();
        for n in 1..=3 {
            cache.upsert_pull(&pull("octo/widgets", n, n as u32)).await.unwrap();
        }
        cache.upsert_pull(&pull("octo/gears", 9, 0)).await.unwrap();

        let closed = cache.close_missing_pulls("octo/widgets", &[2]).await.unwrap();
        assert_eq!(closed, 2);

        let pending = cache.pending_pulls(&[]).await.unwrap();
        let mut numbers: Vec<u64> = pending.iter().map(|p| p.number).collect();
        numbers.sort();
        assert_eq!(numbers, vec![2, 9]);

        let closed = cache.close_missing_pulls("octo/gears", &[]).await.unwrap();
        assert_eq!(closed, 1);
    }

    #[tokio::test]
    async fn test_failed_runs_limited_to_ten() {
        let cache = SqliteCache::in_memory().unwrap();
        for id in 0..12u64 {
            let run = CiRun {
                repo: "octo/widgets".to_string(),
                run_id: id,
                workflow: "ci".to_string(),
                branch: "main".to_string(),
                status: "completed".to_string(),
                conclusion: if id == 0 { "success" } else { "failure" }.to_string(),
                url: String::new(),
                head_sha: String::new(),
                updated_at: Utc.with_ymd_and_hms(2026, 3, 2, 10, id as u32, 0).unwrap(),
            };
            cache.upsert_run(&run).await.unwrap();
        }

        let runs = cache.failed_runs(None).await.unwrap();
        assert_eq!(runs.len(), FAILED_RUN_LIMIT);
        assert_eq!(runs[0].run_id, 11);
        assert!(runs.iter().all(CiRun::is_failure));

        assert!(cache.failed_runs(Some("octo/gears")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_standup_replaced_per_date() {
        let cache = SqliteCache::in_memory().unwrap();
        assert!(cache.latest_standup().await.unwrap().is_none());

        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        for content in ["first", "second"] {
            cache
                .save_standup(&StandupRecord {
                    date,
                    content: content.to_string(),
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        let older = NaiveDate::from_ymd_opt(2026, 2, 27).unwrap();
        cache
            .save_standup(&StandupRecord {
                date: older,
                content: "friday".to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let latest = cache.latest_standup().await.unwrap().unwrap();
        assert_eq!(latest.date, date);
        assert_eq!(latest.content, "second");
    }

    #[tokio::test]
    async fn test_deploy_history() {
        let cache = SqliteCache::in_memory().unwrap();
        for (minute, outcome) in [(0, DeployOutcome::Success), (5, DeployOutcome::Failed)] {
            cache
                .save_deploy(&DeployRecord {
                    repo: "octo/widgets".to_string(),
                    git_ref: "main".to_string(),
                    confidence: 82,
                    risk: RiskLevel::Low,
                    outcome,
                    created_at: Utc.with_ymd_and_hms(2026, 3, 2, 12, minute, 0).unwrap(),
                })
                .await
                .unwrap();
        }

        let deploys = cache.recent_deploys(5).await.unwrap();
        assert_eq!(deploys.len(), 2);
        assert_eq!(deploys[0].outcome, DeployOutcome::Failed);
        assert_eq!(deploys[1].confidence, 82);
        assert_eq!(deploys[1].risk, RiskLevel::Low);
    }

    #[test]
    fn test_open_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("devdash.db");
        SqliteCache::open(&path).unwrap();
        assert!(path.exists());
    }
}
