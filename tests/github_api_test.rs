//! GitHub REST client tests against a wiremock server.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use devdash::adapters::GitHubClient;
use devdash::config::GithubConfig;
use devdash::error::{DashError, NetworkError};
use devdash::models::{CiState, PullState, ReviewVerdict};
use devdash::traits::CodeHost;

const REPO: &str = "octo/widgets";
const TOKEN: &str = "test-auth-token";

fn client(server: &MockServer, token: &str) -> GitHubClient {
    let config = GithubConfig {
        token: token.to_string(),
        ..GithubConfig::default()
    };
    GitHubClient::new(&config).unwrap().with_base_url(server.uri())
}

fn api_pull(number: u64, sha: &str) -> serde_json::Value {
    json!({
        "number": number,
        "title": "Add retry backoff",
        "state": "open",
        "user": { "login": "mona" },
        "head": { "sha": sha },
        "html_url": format!("https://github.com/{}/pull/{}", REPO, number),
        "updated_at": "2026-10-15T09:30:00Z"
    })
}

fn api_run(id: u64, conclusion: Option<&str>) -> serde_json::Value {
    json!({
        "id": id,
        "name": "build",
        "head_branch": "main",
        "status": "completed",
        "conclusion": conclusion,
        "html_url": format!("https://github.com/{}/actions/runs/{}", REPO, id),
        "head_sha": "abc123",
        "updated_at": "2026-10-15T09:30:00Z"
    })
}

#[tokio::test]
async fn test_open_pulls_sends_token_and_joins_ci_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/pulls", REPO)))
        .and(query_param("state", "open"))
        .and(header("Authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([api_pull(7, "abc123")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/commits/abc123/status", REPO)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "state": "failure" })))
        .mount(&server)
        .await;

    let pulls = client(&server, TOKEN).open_pulls(REPO).await.unwrap();

    assert_eq!(pulls.len(), 1);
    let pull = &pulls[0];
    assert_eq!(pull.number, 7);
    assert_eq!(pull.repo, REPO);
    assert_eq!(pull.author, "mona");
    assert_eq!(pull.state, PullState::Open);
    assert_eq!(pull.ci_status, CiState::Failure);
    assert_eq!(pull.head_sha, "abc123");
}

#[tokio::test]
async fn test_unavailable_ci_status_is_unknown() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/pulls", REPO)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([api_pull(3, "def456")])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/commits/def456/status", REPO)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let pulls = client(&server, TOKEN).open_pulls(REPO).await.unwrap();

    assert_eq!(pulls[0].ci_status, CiState::Unknown);
}

#[tokio::test]
async fn test_empty_token_sends_no_authorization() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "1" }, { "id": "2" }])))
        .mount(&server)
        .await;

    let count = client(&server, "").unread_notifications().await.unwrap();

    assert_eq!(count, 2);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_failed_runs_keeps_only_failures() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/actions/runs", REPO)))
        .and(query_param("status", "completed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 3,
            "workflow_runs": [
                api_run(40, Some("success")),
                api_run(41, Some("failure")),
                api_run(42, Some("cancelled")),
            ]
        })))
        .mount(&server)
        .await;

    let runs = client(&server, TOKEN).failed_runs(REPO).await.unwrap();

    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_id, 41);
    assert_eq!(runs[0].workflow, "build");
    assert_eq!(runs[0].conclusion, "failure");
}

#[tokio::test]
async fn test_submit_review_posts_event() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/repos/{}/pulls/7/reviews", REPO)))
        .and(body_json(json!({ "body": "Looks good.", "event": "APPROVE" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server, TOKEN)
        .submit_review(REPO, 7, ReviewVerdict::Approve, "Looks good.")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_open_issue_returns_number() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/repos/{}/issues", REPO)))
        .and(body_json(json!({ "title": "CI failure in build", "body": "details" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "number": 99 })))
        .mount(&server)
        .await;

    let number = client(&server, TOKEN)
        .open_issue(REPO, "CI failure in build", "details")
        .await
        .unwrap();

    assert_eq!(number, 99);
}

#[tokio::test]
async fn test_dispatch_includes_inputs_only_when_present() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/repos/{}/actions/workflows/deploy.yml/dispatches", REPO)))
        .and(body_json(json!({ "ref": "main", "inputs": { "environment": "production" } })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/repos/{}/actions/workflows/lint.yml/dispatches", REPO)))
        .and(body_json(json!({ "ref": "main" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, TOKEN);
    client
        .dispatch_workflow(REPO, "deploy.yml", "main", json!({ "environment": "production" }))
        .await
        .unwrap();
    client
        .dispatch_workflow(REPO, "lint.yml", "main", json!({}))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notifications"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
        .mount(&server)
        .await;

    let err = client(&server, TOKEN).unread_notifications().await.unwrap_err();

    assert!(matches!(
        err,
        DashError::Network(NetworkError::RateLimited {
            retry_after_secs: Some(30)
        })
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_server_error_reports_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/actions/runs", REPO)))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let err = client(&server, TOKEN).failed_runs(REPO).await.unwrap_err();

    match err {
        DashError::Network(NetworkError::HttpStatus { status, body, .. }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "unavailable");
        }
        other => panic!("expected HttpStatus, got {:?}", other),
    }
}
