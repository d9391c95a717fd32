//! Panic hook that puts the terminal back before the message prints.

use super::setup::emergency_restore;
use std::panic;

/// Install before creating the [`TerminalManager`](super::TerminalManager).
/// Chains to the previously installed hook (color-eyre's, in the binary).
pub fn setup_panic_hook() {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        emergency_restore();
        tracing::error!(panic = %panic_info, "devdash panicked");
        original_hook(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_panic_hook_does_not_panic() {
        setup_panic_hook();
        let _ = panic::take_hook();
    }
}
