//! File-backed tracing setup.
//!
//! The TUI owns stdout, so log lines go to `devdash.log` in the data
//! directory. Filtering follows `RUST_LOG`, defaulting to `info`.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use tracing_subscriber::EnvFilter;

use crate::error::{classify_io_error, DashResult};

pub const LOG_FILE: &str = "devdash.log";

pub fn log_file_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LOG_FILE)
}

/// Install the global subscriber. Returns the log path for the startup banner.
pub fn init(data_dir: &Path) -> DashResult<PathBuf> {
    std::fs::create_dir_all(data_dir)
        .map_err(|e| classify_io_error(e, Some(data_dir.to_path_buf()), "create data dir"))?;

    let log_path = log_file_path(data_dir);
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| classify_io_error(e, Some(log_path.clone()), "open log file"))?;

    // try_init: a second call (tests, re-entry) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file))
        .try_init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "devdash starting");
    Ok(log_path)
}
