//! Concrete collaborators.
//!
//! - [`SqliteCache`] - the local cache, on rusqlite
//! - [`GitHubClient`] - GitHub REST v3, on reqwest
//! - [`ModelsAssistant`] - streaming chat completions from GitHub Models
//! - [`CommandVoice`] - an external record-and-transcribe command
//!
//! Test doubles for every trait live in [`mock`].

pub mod github;
pub mod mock;
pub mod models_api;
pub mod sqlite_cache;
pub mod voice;

pub use github::GitHubClient;
pub use models_api::ModelsAssistant;
pub use sqlite_cache::SqliteCache;
pub use voice::CommandVoice;

use reqwest::Response;

use crate::error::{DashResult, NetworkError};
use crate::models::truncate_chars;

/// Pass 2xx responses through; turn everything else into a [`NetworkError`].
pub(crate) async fn check_status(response: Response, url: &str) -> DashResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status.as_u16() == 429 {
        let retry_after_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        return Err(NetworkError::RateLimited { retry_after_secs }.into());
    }
    let body = response.text().await.unwrap_or_default();
    Err(NetworkError::HttpStatus {
        status: status.as_u16(),
        url: url.to_string(),
        body: truncate_chars(&body, 200),
    }
    .into())
}
