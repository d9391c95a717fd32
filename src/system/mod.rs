//! Device health (CPU temperature, load and memory) and the clipboard.

mod clipboard;
mod stats;

pub use clipboard::copy_to_clipboard;
pub use stats::{
    is_raspberry_pi, read_cpu_temp, spawn_stats_poller, SystemSampler, SystemSnapshot, THERMAL_ZONE,
};
