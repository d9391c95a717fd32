//! Push button with software debounce.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::traits::ButtonListener;

pub const DEBOUNCE: Duration = Duration::from_millis(200);

#[derive(Default)]
pub struct Button {
    listener: Mutex<Option<ButtonListener>>,
    last_press: Mutex<Option<Instant>>,
}

impl Button {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_listener(&self, listener: Option<ButtonListener>) {
        *self.listener.lock().unwrap_or_else(|e| e.into_inner()) = listener;
    }

    pub fn has_listener(&self) -> bool {
        self.listener
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    pub fn press(&self) -> bool {
        self.press_at(Instant::now())
    }

    /// Returns whether the press got past the debounce and reached a listener.
    pub fn press_at(&self, now: Instant) -> bool {
        {
            let mut last = self.last_press.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(previous) = *last {
                if now.saturating_duration_since(previous) < DEBOUNCE {
                    return false;
                }
            }
            *last = Some(now);
        }

        // Clone out so the listener runs without the lock held.
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        match listener {
            Some(listener) => {
                tracing::info!("Button pressed");
                listener();
                true
            }
            None => {
                tracing::debug!("Button pressed with no listener");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_debounce() {
        let count = Arc::new(AtomicUsize::new(0));
        let button = Button::new();
        let counter = Arc::clone(&count);
        button.set_listener(Some(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })));

        let t0 = Instant::now();
        assert!(button.press_at(t0));
        assert!(!button.press_at(t0 + Duration::from_millis(150)));
        assert!(button.press_at(t0 + Duration::from_millis(250)));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_no_listener() {
        let button = Button::new();
        assert!(!button.press());
        assert!(!button.has_listener());
    }
}
