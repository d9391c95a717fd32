//! Touch gesture classification.
//!
//! A single-pointer state machine. Pointer-down opens a [`TouchSession`],
//! pointer-up closes it and yields one [`Gesture`]. A session held past
//! [`LONG_PRESS`] fires a long press on its own, exactly once.
//!
//! Positions are terminal cells. Thresholds are logical display pixels, and
//! [`PointerScale`] converts between the two so a 50px swipe means the same
//! physical travel regardless of the terminal's font size.

use std::time::{Duration, Instant};

use ratatui::layout::{Position, Rect};
use thiserror::Error;

use super::InputEvent;

/// Minimum travel, in logical pixels, on either axis for a swipe.
pub const SWIPE_THRESHOLD: f32 = 50.0;

/// A press held strictly longer than this is a long press.
pub const LONG_PRESS: Duration = Duration::from_millis(600);

/// Synthetic travel for keyboard-generated swipes, in logical pixels.
const FALLBACK_TRAVEL: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    Tap,
    SwipeLeft,
    SwipeRight,
    SwipeUp,
    SwipeDown,
    LongPress,
}

impl GestureKind {
    pub fn is_swipe(&self) -> bool {
        matches!(
            self,
            GestureKind::SwipeLeft
                | GestureKind::SwipeRight
                | GestureKind::SwipeUp
                | GestureKind::SwipeDown
        )
    }
}

/// A classified gesture. `x`/`y` is where it ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gesture {
    pub kind: GestureKind,
    pub x: u16,
    pub y: u16,
    pub start_x: u16,
    pub start_y: u16,
}

impl Gesture {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// The active press. At most one exists at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchSession {
    pub start_x: u16,
    pub start_y: u16,
    pub start_time: Instant,
}

/// Logical pixels per terminal cell on each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerScale {
    pub x: f32,
    pub y: f32,
}

impl Default for PointerScale {
    fn default() -> Self {
        Self { x: 1.0, y: 1.0 }
    }
}

impl PointerScale {
    /// Stretch a `display_width x display_height` panel over `area`.
    pub fn fit(display_width: u16, display_height: u16, area: Rect) -> Self {
        if area.width == 0 || area.height == 0 {
            return Self::default();
        }
        Self {
            x: display_width as f32 / area.width as f32,
            y: display_height as f32 / area.height as f32,
        }
    }
}

/// Returned when the user asked to leave (q, Esc, Ctrl+C, window close).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("quit requested")]
pub struct QuitRequested;

/// Classify a completed press from its travel (logical px) and duration.
///
/// The larger axis wins; a tie goes vertical.
pub fn classify(dx: f32, dy: f32, duration: Duration) -> GestureKind {
    if dx.abs() > SWIPE_THRESHOLD || dy.abs() > SWIPE_THRESHOLD {
        if dx.abs() > dy.abs() {
            if dx > 0.0 {
                GestureKind::SwipeRight
            } else {
                GestureKind::SwipeLeft
            }
        } else if dy > 0.0 {
            GestureKind::SwipeDown
        } else {
            GestureKind::SwipeUp
        }
    } else if duration > LONG_PRESS {
        GestureKind::LongPress
    } else {
        GestureKind::Tap
    }
}

#[derive(Debug, Clone, Default)]
pub struct GestureClassifier {
    session: Option<TouchSession>,
    scale: PointerScale,
    viewport: Rect,
}

impl GestureClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track the terminal area the display is mapped onto.
    pub fn set_viewport(&mut self, area: Rect, display_width: u16, display_height: u16) {
        self.viewport = area;
        self.scale = PointerScale::fit(display_width, display_height, area);
    }

    pub fn scale(&self) -> PointerScale {
        self.scale
    }

    pub fn session(&self) -> Option<&TouchSession> {
        self.session.as_ref()
    }

    /// Drain one frame's worth of events, then check for a held press.
    ///
    /// Gestures come back in detection order. A quit aborts the batch.
    pub fn process_events<I>(&mut self, events: I, now: Instant) -> Result<Vec<Gesture>, QuitRequested>
    where
        I: IntoIterator<Item = InputEvent>,
    {
        let mut gestures = Vec::new();

        for event in events {
            if let Some(gesture) = self.handle(event, now)? {
                gestures.push(gesture);
            }
        }

        if let Some(gesture) = self.poll_held(now) {
            gestures.push(gesture);
        }

        Ok(gestures)
    }

    /// Feed a single event. Non-gesture events are ignored.
    pub fn handle(&mut self, event: InputEvent, now: Instant) -> Result<Option<Gesture>, QuitRequested> {
        match event {
            InputEvent::PointerDown { x, y } => {
                // A second down while tracking is ignored; the first press wins.
                if self.session.is_none() {
                    self.session = Some(TouchSession {
                        start_x: x,
                        start_y: y,
                        start_time: now,
                    });
                }
                Ok(None)
            }
            InputEvent::PointerUp { x, y } => {
                let Some(session) = self.session.take() else {
                    return Ok(None);
                };
                let dx = (x as f32 - session.start_x as f32) * self.scale.x;
                let dy = (y as f32 - session.start_y as f32) * self.scale.y;
                let duration = now.saturating_duration_since(session.start_time);

                Ok(Some(Gesture {
                    kind: classify(dx, dy, duration),
                    x,
                    y,
                    start_x: session.start_x,
                    start_y: session.start_y,
                }))
            }
            InputEvent::Fallback(kind) => Ok(Some(self.synthesize(kind))),
            InputEvent::Quit => Err(QuitRequested),
            InputEvent::SimulateButton | InputEvent::Resize { .. } => Ok(None),
        }
    }

    /// Emit a long press for a session held past the threshold.
    pub fn poll_held(&mut self, now: Instant) -> Option<Gesture> {
        let session = self.session?;
        if now.saturating_duration_since(session.start_time) <= LONG_PRESS {
            return None;
        }
        self.session = None;
        Some(Gesture {
            kind: GestureKind::LongPress,
            x: session.start_x,
            y: session.start_y,
            start_x: session.start_x,
            start_y: session.start_y,
        })
    }

    /// Keyboard gestures end at the viewport centre and start
    /// [`FALLBACK_TRAVEL`] away on the opposite side.
    fn synthesize(&self, kind: GestureKind) -> Gesture {
        let cx = self.viewport.x + self.viewport.width / 2;
        let cy = self.viewport.y + self.viewport.height / 2;
        let travel_x = (FALLBACK_TRAVEL / self.scale.x).ceil() as u16;
        let travel_y = (FALLBACK_TRAVEL / self.scale.y).ceil() as u16;

        let (start_x, start_y) = match kind {
            GestureKind::SwipeLeft => (cx.saturating_add(travel_x), cy),
            GestureKind::SwipeRight => (cx.saturating_sub(travel_x), cy),
            GestureKind::SwipeUp => (cx, cy.saturating_add(travel_y)),
            GestureKind::SwipeDown => (cx, cy.saturating_sub(travel_y)),
            GestureKind::Tap | GestureKind::LongPress => (cx, cy),
        };

        Gesture {
            kind,
            x: cx,
            y: cy,
            start_x,
            start_y,
        }
    }
}
