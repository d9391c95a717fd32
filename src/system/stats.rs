//! Device health sampling for the status bar.
//!
//! Sampling happens on a background task so rendering never touches the
//! filesystem.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sysinfo::System;
use tokio::sync::mpsc;
use tokio::time::interval;

use crate::app::AppMessage;

pub const THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";
const DEVICE_MODEL: &str = "/proc/device-tree/model";

/// One reading of device health.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SystemSnapshot {
    /// `None` when the platform has no thermal zone.
    pub cpu_temp_c: Option<f32>,
    pub cpu_percent: f32,
    pub memory_percent: f32,
}

impl SystemSnapshot {
    /// `"47°C"`, or empty when unknown.
    pub fn temp_label(&self) -> String {
        self.cpu_temp_c
            .map(|t| format!("{:.0}°C", t))
            .unwrap_or_default()
    }
}

pub struct SystemSampler {
    system: System,
    thermal_path: PathBuf,
}

impl SystemSampler {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            thermal_path: PathBuf::from(THERMAL_ZONE),
        }
    }

    pub fn with_thermal_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.thermal_path = path.into();
        self
    }

    pub fn poll(&mut self) -> SystemSnapshot {
        self.system.refresh_cpu();
        self.system.refresh_memory();

        let total = self.system.total_memory();
        let memory_percent = if total == 0 {
            0.0
        } else {
            self.system.used_memory() as f32 / total as f32 * 100.0
        };

        SystemSnapshot {
            cpu_temp_c: read_cpu_temp(&self.thermal_path),
            cpu_percent: self.system.global_cpu_info().cpu_usage(),
            memory_percent,
        }
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Thermal zones report millidegrees Celsius.
pub fn read_cpu_temp(path: &Path) -> Option<f32> {
    let raw = std::fs::read_to_string(path).ok()?;
    let millis: f32 = raw.trim().parse().ok()?;
    Some(millis / 1000.0)
}

pub fn is_raspberry_pi() -> bool {
    std::fs::read_to_string(DEVICE_MODEL)
        .map(|model| model.contains("Raspberry Pi"))
        .unwrap_or(false)
}

/// Sample every `period` and post [`AppMessage::SystemStats`]. The task
/// ends when the app's receiver is gone.
pub fn spawn_stats_poller(
    tx: mpsc::UnboundedSender<AppMessage>,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut sampler = SystemSampler::new();
        let mut ticker = interval(period);

        loop {
            ticker.tick().await;
            let snapshot = sampler.poll();
            if tx.send(AppMessage::SystemStats(snapshot)).is_err() {
                break;
            }
        }
    })
}
