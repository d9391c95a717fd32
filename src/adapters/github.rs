//! GitHub REST v3 client implementing [`CodeHost`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::GithubConfig;
use crate::error::{classify_reqwest_error, DashResult, NetworkError};
use crate::models::{CiRun, CiState, PullRequest, PullState, RepoActivity, ReviewVerdict};
use crate::traits::CodeHost;

use super::check_status;

pub const OPEN_PULL_LIMIT: usize = 20;
pub const RUN_PAGE_SIZE: usize = 10;
const DIFF_FILE_LIMIT: usize = 20;
const PATCH_CHARS: usize = 500;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(config: &GithubConfig) -> DashResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );

        let client = Client::builder()
            .user_agent("devdash")
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| NetworkError::Other {
                message: format!("failed to build HTTP client: {}", err),
            })?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Point the client at another API root (GitHub Enterprise, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.token.is_empty() {
            request
        } else {
            request.header(AUTHORIZATION, format!("Bearer {}", self.token))
        }
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> DashResult<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|err| classify_reqwest_error(&err, url))?;
        check_status(response, url).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> DashResult<T> {
        let url = self.url(path);
        let response = self.send(self.client.get(&url).query(query), &url).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| classify_reqwest_error(&err, &url).into())
    }

    async fn post_json(&self, path: &str, body: &Value) -> DashResult<Response> {
        let url = self.url(path);
        self.send(self.client.post(&url).json(body), &url).await
    }

    async fn combined_status(&self, repo: &str, sha: &str) -> CiState {
        let path = format!("/repos/{}/commits/{}/status", repo, sha);
        match self.get_json::<CombinedStatus>(&path, &[]).await {
            Ok(status) => CiState::parse(&status.state),
            Err(err) => {
                tracing::debug!(repo = %repo, sha = %sha, error = %err, "combined status unavailable");
                CiState::Unknown
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ApiHead {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ApiPull {
    number: u64,
    title: String,
    state: String,
    user: Option<ApiUser>,
    head: ApiHead,
    html_url: String,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    changed_files: u32,
    #[serde(default)]
    additions: u32,
    #[serde(default)]
    deletions: u32,
}

#[derive(Debug, Deserialize)]
struct CombinedStatus {
    state: String,
}

#[derive(Debug, Deserialize)]
struct ApiRuns {
    workflow_runs: Vec<ApiRun>,
}

#[derive(Debug, Deserialize)]
struct ApiRun {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    head_branch: Option<String>,
    status: String,
    #[serde(default)]
    conclusion: Option<String>,
    html_url: String,
    head_sha: String,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ApiJobs {
    jobs: Vec<ApiJob>,
}

#[derive(Debug, Deserialize)]
struct ApiJob {
    name: String,
    #[serde(default)]
    conclusion: Option<String>,
    #[serde(default)]
    steps: Vec<ApiStep>,
}

#[derive(Debug, Deserialize)]
struct ApiStep {
    name: String,
    #[serde(default)]
    conclusion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiFile {
    filename: String,
    additions: u32,
    deletions: u32,
    #[serde(default)]
    patch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiCommit {
    commit: ApiCommitDetail,
}

#[derive(Debug, Deserialize)]
struct ApiCommitDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiIssue {
    number: u64,
}

impl ApiRun {
    fn into_run(self, repo: &str) -> CiRun {
        CiRun {
            repo: repo.to_string(),
            run_id: self.id,
            workflow: self.name.unwrap_or_default(),
            branch: self.head_branch.unwrap_or_default(),
            status: self.status,
            conclusion: self.conclusion.unwrap_or_default(),
            url: self.html_url,
            head_sha: self.head_sha,
            updated_at: self.updated_at,
        }
    }
}

fn failed(conclusion: &Option<String>) -> bool {
    conclusion.as_deref() == Some("failure")
}

#[async_trait]
impl CodeHost for GitHubClient {
    async fn open_pulls(&self, repo: &str) -> DashResult<Vec<PullRequest>> {
        let pulls: Vec<ApiPull> = self
            .get_json(
                &format!("/repos/{}/pulls", repo),
                &[
                    ("state", "open".to_string()),
                    ("sort", "updated".to_string()),
                    ("direction", "desc".to_string()),
                    ("per_page", OPEN_PULL_LIMIT.to_string()),
                ],
            )
            .await?;

        let mut out = Vec::with_capacity(pulls.len().min(OPEN_PULL_LIMIT));
        for pull in pulls.into_iter().take(OPEN_PULL_LIMIT) {
            let ci_status = self.combined_status(repo, &pull.head.sha).await;
            out.push(PullRequest {
                repo: repo.to_string(),
                number: pull.number,
                title: pull.title,
                author: pull.user.map(|u| u.login).unwrap_or_else(|| "unknown".to_string()),
                state: PullState::parse(&pull.state),
                ci_status,
                files_changed: pull.changed_files,
                additions: pull.additions,
                deletions: pull.deletions,
                url: pull.html_url,
                head_sha: pull.head.sha,
                updated_at: pull.updated_at,
            });
        }
        Ok(out)
    }

    async fn failed_runs(&self, repo: &str) -> DashResult<Vec<CiRun>> {
        let runs: ApiRuns = self
            .get_json(
                &format!("/repos/{}/actions/runs", repo),
                &[
                    ("status", "completed".to_string()),
                    ("per_page", RUN_PAGE_SIZE.to_string()),
                ],
            )
            .await?;
        Ok(runs
            .workflow_runs
            .into_iter()
            .take(RUN_PAGE_SIZE)
            .filter(|run| failed(&run.conclusion))
            .map(|run| run.into_run(repo))
            .collect())
    }

    async fn unread_notifications(&self) -> DashResult<usize> {
        let items: Vec<Value> = self
            .get_json("/notifications", &[("per_page", "50".to_string())])
            .await?;
        Ok(items.len())
    }

    async fn pull_diff(&self, repo: &str, number: u64) -> DashResult<String> {
        let files: Vec<ApiFile> = self
            .get_json(
                &format!("/repos/{}/pulls/{}/files", repo, number),
                &[("per_page", DIFF_FILE_LIMIT.to_string())],
            )
            .await?;
        let mut parts = Vec::new();
        for file in files.into_iter().take(DIFF_FILE_LIMIT) {
            parts.push(format!(
                "--- {} (+{}/-{})",
                file.filename, file.additions, file.deletions
            ));
            if let Some(patch) = file.patch.filter(|p| !p.is_empty()) {
                parts.push(patch.chars().take(PATCH_CHARS).collect());
            }
        }
        Ok(parts.join("\n"))
    }

    async fn run_log_summary(&self, repo: &str, run_id: u64) -> DashResult<String> {
        let jobs: ApiJobs = self
            .get_json(&format!("/repos/{}/actions/runs/{}/jobs", repo, run_id), &[])
            .await?;
        let mut lines = Vec::new();
        for job in jobs.jobs.into_iter().filter(|j| failed(&j.conclusion)) {
            lines.push(format!("Job: {} - failure", job.name));
            for step in job.steps.into_iter().filter(|s| failed(&s.conclusion)) {
                lines.push(format!("  Step: {} - FAILED", step.name));
            }
        }
        if lines.is_empty() {
            Ok("No failed job logs found".to_string())
        } else {
            Ok(lines.join("\n"))
        }
    }

    async fn recent_activity(&self, repo: &str, hours: u32) -> DashResult<RepoActivity> {
        let since = Utc::now() - chrono::Duration::hours(i64::from(hours));
        let commits: Vec<ApiCommit> = self
            .get_json(
                &format!("/repos/{}/commits", repo),
                &[
                    ("since", since.to_rfc3339()),
                    ("per_page", "20".to_string()),
                ],
            )
            .await?;
        let closed: Vec<ApiPull> = self
            .get_json(
                &format!("/repos/{}/pulls", repo),
                &[
                    ("state", "closed".to_string()),
                    ("sort", "updated".to_string()),
                    ("direction", "desc".to_string()),
                    ("per_page", "10".to_string()),
                ],
            )
            .await?;

        Ok(RepoActivity {
            repo: repo.to_string(),
            commits: commits
                .into_iter()
                .filter_map(|c| c.commit.message.lines().next().map(str::to_string))
                .collect(),
            merged_pulls: closed
                .into_iter()
                .filter(|p| p.merged_at.map(|at| at > since).unwrap_or(false))
                .map(|p| format!("#{} {}", p.number, p.title))
                .collect(),
        })
    }

    async fn submit_review(
        &self,
        repo: &str,
        number: u64,
        verdict: ReviewVerdict,
        body: &str,
    ) -> DashResult<()> {
        self.post_json(
            &format!("/repos/{}/pulls/{}/reviews", repo, number),
            &json!({ "body": body, "event": verdict.api_event() }),
        )
        .await?;
        tracing::info!(repo = %repo, number, event = verdict.api_event(), "review submitted");
        Ok(())
    }

    async fn open_issue(&self, repo: &str, title: &str, body: &str) -> DashResult<u64> {
        let path = format!("/repos/{}/issues", repo);
        let response = self
            .post_json(&path, &json!({ "title": title, "body": body }))
            .await?;
        let issue: ApiIssue = response
            .json()
            .await
            .map_err(|err| classify_reqwest_error(&err, &self.url(&path)))?;
        tracing::info!(repo = %repo, issue = issue.number, "issue opened");
        Ok(issue.number)
    }

    async fn dispatch_workflow(
        &self,
        repo: &str,
        workflow: &str,
        git_ref: &str,
        inputs: Value,
    ) -> DashResult<()> {
        let mut body = json!({ "ref": git_ref });
        if inputs.as_object().map(|o| !o.is_empty()).unwrap_or(false) {
            body["inputs"] = inputs;
        }
        self.post_json(
            &format!("/repos/{}/actions/workflows/{}/dispatches", repo, workflow),
            &body,
        )
        .await?;
        tracing::info!(repo = %repo, workflow = %workflow, git_ref = %git_ref, "workflow dispatched");
        Ok(())
    }
}
