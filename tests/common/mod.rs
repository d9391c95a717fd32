//! Shared fixtures for integration tests.
//!
//! [`Harness`] wires the mock collaborators into [`Services`] and keeps
//! typed handles so tests can script them and inspect what was recorded.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::{mpsc, watch};

use devdash::adapters::mock::{MockAssistant, MockCache, MockCodeHost, MockPeripherals, MockVoice};
use devdash::app::AppMessage;
use devdash::config::AppConfig;
use devdash::models::{CiRun, CiState, PullRequest, PullState};
use devdash::screens::{Screen, ScreenEvent, Services, TaskHub};

pub const REPO: &str = "octo/widgets";
pub const OTHER_REPO: &str = "octo/gadgets";

pub fn test_config() -> AppConfig {
    AppConfig::default()
        .with_token("test-token")
        .with_repos([REPO, OTHER_REPO])
        .with_deploy_repo(REPO)
}

pub struct Harness {
    pub cache: Arc<MockCache>,
    pub code_host: Arc<MockCodeHost>,
    pub assistant: Arc<MockAssistant>,
    pub peripherals: Arc<MockPeripherals>,
    pub services: Services,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(test_config(), MockCache::new(), MockVoice::unavailable())
    }

    pub fn with_cache(cache: MockCache) -> Self {
        Self::build(test_config(), cache, MockVoice::unavailable())
    }

    pub fn build(config: AppConfig, cache: MockCache, voice: MockVoice) -> Self {
        let cache = Arc::new(cache);
        let code_host = Arc::new(MockCodeHost::new());
        let assistant = Arc::new(MockAssistant::new());
        let peripherals = Arc::new(MockPeripherals::new());
        let services = Services {
            config: Arc::new(config),
            cache: cache.clone(),
            code_host: code_host.clone(),
            assistant: assistant.clone(),
            peripherals: peripherals.clone(),
            voice: Arc::new(voice),
        };
        Self {
            cache,
            code_host,
            assistant,
            peripherals,
            services,
        }
    }
}

/// A task hub whose messages the test reads directly.
pub struct Channel {
    pub hub: TaskHub,
    pub rx: mpsc::UnboundedReceiver<AppMessage>,
    shutdown: watch::Sender<bool>,
}

impl Channel {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);
        Self {
            hub: TaskHub::new(tx, shutdown_rx),
            rx,
            shutdown,
        }
    }

    pub fn shut_down(&self) {
        let _ = self.shutdown.send(true);
    }

    pub async fn next(&mut self) -> AppMessage {
        tokio::time::timeout(Duration::from_secs(2), self.rx.recv())
            .await
            .expect("timed out waiting for a message")
            .expect("message channel closed")
    }

    /// Apply screen events to `screen` until one matching `done` has been
    /// applied. Other messages are ignored.
    pub async fn pump<S, F>(&mut self, screen: &mut S, done: F)
    where
        S: Screen,
        F: Fn(&ScreenEvent) -> bool,
    {
        loop {
            if let AppMessage::Screen { event, .. } = self.next().await {
                let finished = done(&event);
                screen.apply(event);
                if finished {
                    return;
                }
            }
        }
    }
}

pub fn pull(repo: &str, number: u64, minutes_ago: i64) -> PullRequest {
    PullRequest {
        repo: repo.to_string(),
        number,
        title: format!("Change number {}", number),
        author: "octocat".to_string(),
        state: PullState::Open,
        ci_status: CiState::Success,
        files_changed: 3,
        additions: 40,
        deletions: 12,
        url: format!("https://github.com/{}/pull/{}", repo, number),
        head_sha: format!("sha{}", number),
        updated_at: Utc::now() - ChronoDuration::minutes(minutes_ago),
    }
}

pub fn failed_run(repo: &str, run_id: u64) -> CiRun {
    CiRun {
        repo: repo.to_string(),
        run_id,
        workflow: "build".to_string(),
        branch: "main".to_string(),
        status: "completed".to_string(),
        conclusion: "failure".to_string(),
        url: format!("https://github.com/{}/actions/runs/{}", repo, run_id),
        head_sha: format!("run{}", run_id),
        updated_at: Utc::now(),
    }
}
