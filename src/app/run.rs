//! The frame loop.

use std::io;
use std::time::Instant;

use crossterm::event::Event;
use futures::{Stream, StreamExt};
use ratatui::layout::Rect;
use tokio::time::{interval, MissedTickBehavior};

use crate::error::UiError;
use crate::input::{normalize, InputEvent};
use crate::traits::RenderTarget;

use super::App;

/// Drive `app` until quit, shutdown or a render failure that survives one
/// re-initialisation. Shuts the app down before returning.
///
/// Each tick classifies the input gathered since the previous tick,
/// dispatches the gestures, starts a refresh cycle when due and presents a
/// frame. Messages and input are consumed between ticks.
pub async fn run<T, S>(app: &mut App, target: &mut T, events: S) -> Result<(), UiError>
where
    T: RenderTarget,
    S: Stream<Item = io::Result<Event>> + Unpin,
{
    let result = run_loop(app, target, events).await;
    app.shutdown();
    result
}

async fn run_loop<T, S>(app: &mut App, target: &mut T, mut events: S) -> Result<(), UiError>
where
    T: RenderTarget,
    S: Stream<Item = io::Result<Event>> + Unpin,
{
    let mut messages = app.take_receiver().ok_or_else(|| UiError::Channel {
        message: "message receiver already taken".to_string(),
    })?;

    app.set_viewport(target.size()?);

    let mut ticker = interval(app.frame_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut pending: Vec<InputEvent> = Vec::new();
    let mut input_open = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                if !tick(app, std::mem::take(&mut pending), now) {
                    tracing::info!("quit requested");
                    return Ok(());
                }
                present(app, target, now)?;
                tokio::task::yield_now().await;
            }

            event = events.next(), if input_open => match event {
                Some(Ok(event)) => match normalize(&event) {
                    Some(InputEvent::Resize { width, height }) => {
                        app.set_viewport(Rect::new(0, 0, width, height));
                    }
                    Some(InputEvent::SimulateButton) => {
                        app.services().peripherals.press_button();
                    }
                    Some(input) => pending.push(input),
                    None => {}
                },
                Some(Err(err)) => tracing::warn!(error = %err, "input error"),
                None => {
                    tracing::debug!("input stream closed");
                    input_open = false;
                }
            },

            Some(message) = messages.recv() => app.handle_message(message),
        }

        if app.should_quit() {
            return Ok(());
        }
    }
}

/// Classify and dispatch input, then refresh when due. Returns `false` when
/// the input asked to quit.
fn tick(app: &mut App, pending: Vec<InputEvent>, now: Instant) -> bool {
    let gestures = match app.classifier_mut().process_events(pending, now) {
        Ok(gestures) => gestures,
        Err(_quit) => return false,
    };
    for gesture in &gestures {
        tracing::debug!(kind = ?gesture.kind, x = gesture.x, y = gesture.y, "gesture");
        app.dispatch(gesture);
    }
    app.maybe_refresh(now);
    true
}

/// Draw one frame. A failed draw gets one terminal re-initialisation and a
/// retry; a second failure is returned.
fn present<T: RenderTarget>(app: &mut App, target: &mut T, now: Instant) -> Result<(), UiError> {
    match target.draw(|frame| app.render(frame, now)) {
        Ok(()) => Ok(()),
        Err(err) => {
            tracing::warn!(error = %err, "render failed, reinitialising terminal");
            target.reinit()?;
            target.draw(|frame| app.render(frame, now)).map_err(|err| {
                tracing::error!(error = %err, "render failed after reinit");
                err
            })
        }
    }
}
