//! DevDash - a touchscreen developer dashboard for the terminal
//!
//! This library exposes modules for use in integration tests and benches.

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod hardware;
pub mod input;
pub mod logging;
pub mod models;
pub mod screens;
pub mod sse;
pub mod system;
pub mod terminal;
pub mod traits;
pub mod ui;
