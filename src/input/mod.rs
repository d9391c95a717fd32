//! Raw input normalization and gesture classification.
//!
//! ```text
//! crossterm::Event -> normalize() -> InputEvent -> GestureClassifier -> Gesture
//! ```
//!
//! Mouse presses stand in for the touch panel. Arrow keys and Enter are the
//! keyboard fallback for swipes and taps.

pub mod gesture;

pub use gesture::{
    classify, Gesture, GestureClassifier, GestureKind, PointerScale, QuitRequested, TouchSession,
    LONG_PRESS, SWIPE_THRESHOLD,
};

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

/// Device-independent input, one per relevant terminal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    PointerDown { x: u16, y: u16 },
    PointerUp { x: u16, y: u16 },
    /// Keyboard stand-in for a gesture.
    Fallback(GestureKind),
    Quit,
    /// The `d` key presses the (simulated) hardware button.
    SimulateButton,
    Resize { width: u16, height: u16 },
}

/// Map a terminal event to an [`InputEvent`]. Unsupported events yield `None`.
pub fn normalize(event: &Event) -> Option<InputEvent> {
    match event {
        Event::Mouse(mouse) => normalize_mouse(mouse),
        Event::Key(key) => normalize_key(key),
        Event::Resize(width, height) => Some(InputEvent::Resize {
            width: *width,
            height: *height,
        }),
        _ => None,
    }
}

fn normalize_mouse(mouse: &MouseEvent) -> Option<InputEvent> {
    let (x, y) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(InputEvent::PointerDown { x, y }),
        MouseEventKind::Up(MouseButton::Left) => Some(InputEvent::PointerUp { x, y }),
        _ => None,
    }
}

fn normalize_key(key: &KeyEvent) -> Option<InputEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(key.code, KeyCode::Char('c')).then_some(InputEvent::Quit);
    }

    match key.code {
        KeyCode::Left => Some(InputEvent::Fallback(GestureKind::SwipeLeft)),
        KeyCode::Right => Some(InputEvent::Fallback(GestureKind::SwipeRight)),
        KeyCode::Up => Some(InputEvent::Fallback(GestureKind::SwipeUp)),
        KeyCode::Down => Some(InputEvent::Fallback(GestureKind::SwipeDown)),
        KeyCode::Enter => Some(InputEvent::Fallback(GestureKind::Tap)),
        KeyCode::Char('q') | KeyCode::Esc => Some(InputEvent::Quit),
        KeyCode::Char('d') | KeyCode::Char('D') => Some(InputEvent::SimulateButton),
        _ => None,
    }
}
