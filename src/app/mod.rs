//! The screen manager.
//!
//! [`App`] owns the screens, routes gestures and messages to them, schedules
//! refresh cycles and renders the chrome around the current screen. It is
//! driven by [`run`], one iteration per frame tick.

mod handlers;
mod messages;
mod navigation;
pub mod refresh;
mod run;

pub use messages::AppMessage;
pub use refresh::{spawn_refresh_cycle, sync_repos, RefreshCycle, SyncReport};
pub use run::run;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use ratatui::Frame;
use tokio::sync::{mpsc, watch};

use crate::config::DisplayConfig;
use crate::error::UiError;
use crate::input::GestureClassifier;
use crate::screens::{build_all, DynScreen, RenderContext, ScreenId, ScreenStatus, Services, TaskHub};
use crate::system::SystemSnapshot;
use crate::ui::theme::Palette;

pub struct App {
    pages: Vec<Box<dyn DynScreen>>,
    current: usize,
    services: Services,
    hub: TaskHub,
    shutdown_tx: watch::Sender<bool>,
    message_tx: mpsc::UnboundedSender<AppMessage>,
    message_rx: Option<mpsc::UnboundedReceiver<AppMessage>>,
    classifier: GestureClassifier,
    display: DisplayConfig,
    palette: Palette,
    poll_interval: Duration,
    last_refresh: Option<Instant>,
    refresh_in_flight: Arc<AtomicBool>,
    stats: SystemSnapshot,
    epoch: Instant,
    should_quit: bool,
}

impl App {
    /// Build the six screens and enter the first one.
    pub fn new(services: Services, now: Instant) -> Self {
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let hub = TaskHub::new(message_tx.clone(), shutdown_rx);
        let pages = build_all(&services, &hub, now);
        Self::with_pages(services, hub, pages, message_tx, message_rx, shutdown_tx, now)
    }

    fn with_pages(
        services: Services,
        hub: TaskHub,
        mut pages: Vec<Box<dyn DynScreen>>,
        message_tx: mpsc::UnboundedSender<AppMessage>,
        message_rx: mpsc::UnboundedReceiver<AppMessage>,
        shutdown_tx: watch::Sender<bool>,
        now: Instant,
    ) -> Self {
        let config = services.config.clone();
        if let Some(first) = pages.first_mut() {
            first.enter();
        }
        Self {
            pages,
            current: 0,
            hub,
            shutdown_tx,
            message_tx,
            message_rx: Some(message_rx),
            classifier: GestureClassifier::new(),
            display: config.display.clone(),
            palette: Palette::from_config(&config.theme),
            poll_interval: Duration::from_secs(config.github.poll_interval.max(1)),
            last_refresh: None,
            refresh_in_flight: Arc::new(AtomicBool::new(false)),
            stats: SystemSnapshot::default(),
            epoch: now,
            should_quit: false,
            services,
        }
    }

    /// Build an app around caller-supplied screens. `make` receives the hub
    /// the screens must spawn their tasks through and must return at least
    /// one screen.
    pub fn with_screens<F>(services: Services, now: Instant, make: F) -> Result<Self, UiError>
    where
        F: FnOnce(&TaskHub) -> Vec<Box<dyn DynScreen>>,
    {
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let hub = TaskHub::new(message_tx.clone(), shutdown_rx);
        let pages = make(&hub);
        if pages.is_empty() {
            return Err(UiError::NoScreens);
        }
        Ok(Self::with_pages(
            services,
            hub,
            pages,
            message_tx,
            message_rx,
            shutdown_tx,
            now,
        ))
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<AppMessage> {
        self.message_tx.clone()
    }

    pub fn hub(&self) -> &TaskHub {
        &self.hub
    }

    /// The receiving end of the message channel. The run loop takes it once.
    pub fn take_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<AppMessage>> {
        self.message_rx.take()
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn screen_ids(&self) -> Vec<ScreenId> {
        self.pages.iter().map(|p| p.id()).collect()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_id(&self) -> ScreenId {
        self.pages[self.current].id()
    }

    pub fn current_page(&self) -> &dyn DynScreen {
        self.pages[self.current].as_ref()
    }

    pub fn page(&self, id: ScreenId) -> Option<&dyn DynScreen> {
        self.pages.iter().find(|p| p.id() == id).map(|p| p.as_ref())
    }

    fn page_mut(&mut self, id: ScreenId) -> Option<&mut Box<dyn DynScreen>> {
        self.pages.iter_mut().find(|p| p.id() == id)
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn stats(&self) -> &SystemSnapshot {
        &self.stats
    }

    pub fn classifier_mut(&mut self) -> &mut GestureClassifier {
        &mut self.classifier
    }

    /// Map the display's logical size onto a terminal area.
    pub fn set_viewport(&mut self, area: Rect) {
        self.classifier
            .set_viewport(area, self.display.width, self.display.height);
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.display.fps.max(1)))
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// First screen reporting an error or warning, in navigation order.
    pub fn overall_status(&self) -> ScreenStatus {
        self.pages
            .iter()
            .map(|p| p.status())
            .find(|s| *s != ScreenStatus::Success)
            .unwrap_or_default()
    }

    pub fn refresh_in_flight(&self) -> bool {
        self.refresh_in_flight.load(Ordering::SeqCst)
    }

    pub fn last_refresh(&self) -> Option<Instant> {
        self.last_refresh
    }

    /// Start a refresh cycle if none has run yet or the poll interval has
    /// passed. Returns whether a cycle was started.
    pub fn maybe_refresh(&mut self, now: Instant) -> bool {
        let due = match self.last_refresh {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.poll_interval,
        };
        if !due {
            return false;
        }
        self.last_refresh = Some(now);

        if self.refresh_in_flight() {
            tracing::debug!("previous refresh still running, skipping cycle");
            return false;
        }

        let jobs = self
            .pages
            .iter_mut()
            .filter_map(|page| page.refresh().map(|job| (page.id(), job)))
            .collect();
        let cycle = RefreshCycle {
            code_host: self.services.code_host.clone(),
            cache: self.services.cache.clone(),
            repos: self.services.config.github.repos.clone(),
            jobs,
        };
        tracing::debug!("starting refresh cycle");
        spawn_refresh_cycle(
            cycle,
            self.message_tx.clone(),
            self.hub.shutdown_signal(),
            self.refresh_in_flight.clone(),
        );
        true
    }

    /// Status bar, current screen, nav bar.
    pub fn render(&mut self, frame: &mut Frame, now: Instant) {
        let ctx = RenderContext {
            now,
            epoch: self.epoch,
            palette: self.palette,
        };
        let layout = crate::ui::render_chrome(frame, self, &ctx);
        self.pages[self.current].render(frame, layout, &ctx);
    }

    /// Cancel background tasks, detach the button and turn the LEDs off.
    pub fn shutdown(&mut self) {
        tracing::info!("shutting down");
        let _ = self.shutdown_tx.send(true);
        self.services.peripherals.set_button_listener(None);
        self.services.peripherals.shutdown();
    }
}
