//! AppMessage enum for async communication with the loop task.

use crate::screens::{ScreenEvent, ScreenId};
use crate::system::SystemSnapshot;

/// Messages from background tasks and hardware threads. Only the loop task
/// receives them, so screen state has a single writer.
#[derive(Debug, Clone)]
pub enum AppMessage {
    /// A result for one screen. `generation` is `None` for refresh results,
    /// which always apply; interaction results carry the generation the
    /// screen had when the task was spawned.
    Screen {
        screen: ScreenId,
        generation: Option<u64>,
        event: ScreenEvent,
    },
    /// A screen asked to switch to another one.
    NavigateTo(ScreenId),
    /// Debounced hardware button press, routed to `screen` if it is current.
    ButtonPressed { screen: ScreenId },
    SystemStats(SystemSnapshot),
    /// Run a refresh cycle on the next tick.
    RefreshNow,
    /// Ctrl+C or SIGTERM outside the terminal's key handling.
    Shutdown,
}
