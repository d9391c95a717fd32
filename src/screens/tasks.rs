//! Background work on behalf of a screen.
//!
//! Interaction tasks are stamped with the screen's generation when spawned.
//! Leaving the screen bumps the generation, and the manager drops results
//! carrying an older one. Every task also races the shutdown signal.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::app::AppMessage;
use crate::error::DashResult;
use crate::traits::ButtonListener;

use super::{ScreenEvent, ScreenId};

/// A screen's contribution to a refresh cycle.
pub type RefreshJob = BoxFuture<'static, DashResult<ScreenEvent>>;

/// Resolves once shutdown is signalled or the signal's owner is gone.
pub async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Hands out per-screen [`ScreenTasks`] sharing one channel and one
/// shutdown signal.
#[derive(Debug, Clone)]
pub struct TaskHub {
    tx: mpsc::UnboundedSender<AppMessage>,
    shutdown: watch::Receiver<bool>,
}

impl TaskHub {
    pub fn new(tx: mpsc::UnboundedSender<AppMessage>, shutdown: watch::Receiver<bool>) -> Self {
        Self { tx, shutdown }
    }

    pub fn for_screen(&self, screen: ScreenId) -> ScreenTasks {
        ScreenTasks {
            screen,
            tx: self.tx.clone(),
            shutdown: self.shutdown.clone(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<AppMessage> {
        self.tx.clone()
    }

    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.clone()
    }
}

#[derive(Debug, Clone)]
pub struct ScreenTasks {
    screen: ScreenId,
    tx: mpsc::UnboundedSender<AppMessage>,
    shutdown: watch::Receiver<bool>,
    generation: Arc<AtomicU64>,
}

impl ScreenTasks {
    pub fn screen(&self) -> ScreenId {
        self.screen
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn generation_handle(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.generation)
    }

    /// Run `task` in the background and deliver its event.
    pub fn spawn<F>(&self, label: &'static str, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ScreenEvent> + Send + 'static,
    {
        let screen = self.screen;
        let generation = self.generation();
        let tx = self.tx.clone();
        let shutdown = self.shutdown.clone();
        tracing::debug!(screen = %screen, task = label, generation, "spawn");

        tokio::spawn(async move {
            tokio::select! {
                _ = wait_for_shutdown(shutdown) => {
                    tracing::debug!(screen = %screen, task = label, "cancelled by shutdown");
                }
                event = task => {
                    let _ = tx.send(AppMessage::Screen {
                        screen,
                        generation: Some(generation),
                        event,
                    });
                }
            }
        })
    }

    /// Like [`spawn`](Self::spawn), for tasks that stream text. Increments
    /// written to the supplied sender arrive as [`ScreenEvent::Delta`]
    /// carrying `stream`, all of them before the final event. Screens pick
    /// `stream` so they can tell one call's text from the next.
    pub fn spawn_streaming<F, Fut>(
        &self,
        label: &'static str,
        stream: u64,
        make: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(mpsc::UnboundedSender<String>) -> Fut,
        Fut: Future<Output = ScreenEvent> + Send + 'static,
    {
        let screen = self.screen;
        let generation = self.generation();
        let tx = self.tx.clone();
        let shutdown = self.shutdown.clone();
        let (delta_tx, mut delta_rx) = mpsc::unbounded_channel::<String>();
        let task = make(delta_tx);
        tracing::debug!(screen = %screen, task = label, generation, stream, "spawn streaming");

        let send = move |event: ScreenEvent| {
            let _ = tx.send(AppMessage::Screen {
                screen,
                generation: Some(generation),
                event,
            });
        };

        tokio::spawn(async move {
            let cancelled = wait_for_shutdown(shutdown);
            tokio::pin!(task);
            tokio::pin!(cancelled);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut cancelled => {
                        tracing::debug!(screen = %screen, task = label, "cancelled by shutdown");
                        return;
                    }
                    Some(text) = delta_rx.recv() => send(ScreenEvent::Delta { stream, text }),
                    event = &mut task => {
                        while let Ok(text) = delta_rx.try_recv() {
                            send(ScreenEvent::Delta { stream, text });
                        }
                        send(event);
                        return;
                    }
                }
            }
        })
    }

    pub fn navigate_to(&self, screen: ScreenId) {
        let _ = self.tx.send(AppMessage::NavigateTo(screen));
    }

    pub fn request_refresh(&self) {
        let _ = self.tx.send(AppMessage::RefreshNow);
    }

    /// Listener for the hardware button that enqueues a press for this
    /// screen. Runs on the button thread, so it only sends.
    pub fn button_listener(&self) -> ButtonListener {
        let tx = self.tx.clone();
        let screen = self.screen;
        Arc::new(move || {
            let _ = tx.send(AppMessage::ButtonPressed { screen });
        })
    }
}
