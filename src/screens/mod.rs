//! Screens and the contract the manager drives them through.
//!
//! Each screen implements [`Screen`] with its own button enum, so tap
//! dispatch is checked at compile time. The manager stores screens behind
//! [`DynScreen`], implemented once by [`Page`], which also owns the tap
//! regions and the generation counter.
//!
//! Screens never block. Work goes to background tasks through
//! [`ScreenTasks`], and results come back as [`ScreenEvent`]s applied on
//! the loop task.

pub mod ci_diagnosis;
pub mod context_chat;
pub mod deploy;
pub mod home;
pub mod pr_triage;
pub mod standup;
mod tasks;

pub use ci_diagnosis::CiDiagnosisScreen;
pub use context_chat::ContextChatScreen;
pub use deploy::DeployScreen;
pub use home::HomeScreen;
pub use pr_triage::PrTriageScreen;
pub use standup::StandupScreen;
pub use tasks::{wait_for_shutdown, RefreshJob, ScreenTasks, TaskHub};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use ratatui::layout::Rect;
use ratatui::Frame;

use crate::config::AppConfig;
use crate::input::{Gesture, GestureKind};
use crate::models::{
    CiRun, DeployAssessment, DeployRecord, PullInsight, PullRequest, ReviewVerdict,
    RunDiagnosis, StandupRecord,
};
use crate::traits::{Assistant, CodeHost, DataCache, Peripherals, VoiceInput};
use crate::ui::interaction::HitRegions;
use crate::ui::theme::Palette;

/// Screen names, in navigation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenId {
    Home,
    PrTriage,
    CiDiagnosis,
    Standup,
    Deploy,
    ContextChat,
}

impl ScreenId {
    pub const ALL: [ScreenId; 6] = [
        ScreenId::Home,
        ScreenId::PrTriage,
        ScreenId::CiDiagnosis,
        ScreenId::Standup,
        ScreenId::Deploy,
        ScreenId::ContextChat,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScreenId::Home => "home",
            ScreenId::PrTriage => "pr_triage",
            ScreenId::CiDiagnosis => "ci_diagnosis",
            ScreenId::Standup => "standup",
            ScreenId::Deploy => "deploy",
            ScreenId::ContextChat => "context_chat",
        }
    }

    /// Short label for the nav bar.
    pub fn title(&self) -> &'static str {
        match self {
            ScreenId::Home => "Home",
            ScreenId::PrTriage => "PRs",
            ScreenId::CiDiagnosis => "CI",
            ScreenId::Standup => "Standup",
            ScreenId::Deploy => "Deploy",
            ScreenId::ContextChat => "Ask",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Health a screen reports to the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenStatus {
    #[default]
    Success,
    Warning,
    Error,
}

/// Results delivered back to a screen. Errors arrive as display strings;
/// the task that failed has already logged the full error.
#[derive(Debug, Clone)]
pub enum ScreenEvent {
    /// A text increment from a streaming assistant call, tagged with the
    /// stream key the call was spawned with.
    Delta { stream: u64, text: String },
    HomeCounts {
        pulls: usize,
        failing: usize,
        /// `None` when the code host could not be reached.
        notifications: Option<usize>,
    },
    /// The cache could not be read for the home counts.
    HomeRefreshFailed(String),
    Pulls(Vec<PullRequest>),
    PullInsight {
        number: u64,
        result: Result<PullInsight, String>,
    },
    ReviewSubmitted {
        number: u64,
        verdict: ReviewVerdict,
        result: Result<(), String>,
    },
    Runs(Vec<CiRun>),
    Diagnosis {
        run_id: u64,
        result: Result<RunDiagnosis, String>,
    },
    IssueOpened(Result<u64, String>),
    StandupLoaded(Option<StandupRecord>),
    StandupGenerated(Result<String, String>),
    StandupCopied(Result<(), String>),
    DeployHistory(Vec<DeployRecord>),
    DeployAssessed(Result<DeployAssessment, String>),
    DeployFinished(Result<(), String>),
    Transcribed(Result<Option<String>, String>),
    Answer {
        stream: u64,
        result: Result<String, String>,
    },
}

/// Per-frame inputs to rendering.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext {
    pub now: Instant,
    /// Loop start, the clock for spinners.
    pub epoch: Instant,
    pub palette: Palette,
}

/// Collaborators shared by every screen.
#[derive(Clone)]
pub struct Services {
    pub config: Arc<AppConfig>,
    pub cache: Arc<dyn DataCache>,
    pub code_host: Arc<dyn CodeHost>,
    pub assistant: Arc<dyn Assistant>,
    pub peripherals: Arc<dyn Peripherals>,
    pub voice: Arc<dyn VoiceInput>,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("repos", &self.config.github.repos)
            .finish_non_exhaustive()
    }
}

/// The screen contract.
///
/// Hooks run on the loop task and must return quickly. Anything that waits
/// on a collaborator goes through [`ScreenTasks`].
pub trait Screen: Send {
    type Button: Copy + PartialEq + fmt::Debug + Send + 'static;

    fn id(&self) -> ScreenId;

    /// Draw view-state and register tap regions. No I/O.
    fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        regions: &mut HitRegions<Self::Button>,
        ctx: &RenderContext,
    );

    /// Data reload for the periodic cycle. The returned future runs in the
    /// background; its event is applied on the loop task.
    fn refresh(&mut self) -> Option<RefreshJob> {
        None
    }

    fn on_enter(&mut self) {}

    fn on_leave(&mut self) {}

    /// First region containing the point, in registration order.
    fn on_tap(&mut self, gesture: &Gesture, regions: &HitRegions<Self::Button>) {
        if let Some(button) = regions.hit_test(gesture.x, gesture.y) {
            self.on_button(button);
        }
    }

    fn on_button(&mut self, _button: Self::Button) {}

    /// Return `true` to consume the swipe and veto navigation.
    fn on_swipe_left(&mut self, _gesture: &Gesture) -> bool {
        false
    }

    fn on_swipe_right(&mut self, _gesture: &Gesture) -> bool {
        false
    }

    fn on_swipe_up(&mut self, _gesture: &Gesture) {}

    fn on_swipe_down(&mut self, _gesture: &Gesture) {}

    fn on_long_press(&mut self, _gesture: &Gesture) {}

    fn on_hardware_button(&mut self) {}

    fn apply(&mut self, event: ScreenEvent);

    fn status(&self) -> ScreenStatus {
        ScreenStatus::Success
    }
}

/// Object-safe view of a [`Page`] used by the manager.
pub trait DynScreen: Send {
    fn id(&self) -> ScreenId;
    fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &RenderContext);
    fn refresh(&mut self) -> Option<RefreshJob>;
    fn enter(&mut self);
    /// Runs `on_leave`, then invalidates in-flight interaction tasks.
    fn leave(&mut self);
    fn generation(&self) -> u64;
    /// Route a gesture. Returns `true` when a horizontal swipe was consumed.
    fn gesture(&mut self, gesture: &Gesture) -> bool;
    fn hardware_button(&mut self);
    fn apply(&mut self, event: ScreenEvent);
    fn status(&self) -> ScreenStatus;
    /// Tap regions from the last render, in registration order.
    fn region_rects(&self) -> Vec<Rect>;
}

/// Wraps a [`Screen`] with its tap regions and generation counter.
pub struct Page<S: Screen> {
    screen: S,
    regions: HitRegions<S::Button>,
    generation: Arc<AtomicU64>,
}

impl<S: Screen> Page<S> {
    /// `generation` must be the counter the screen's [`ScreenTasks`] reads.
    pub fn new(screen: S, generation: Arc<AtomicU64>) -> Self {
        Self {
            screen,
            regions: HitRegions::new(),
            generation,
        }
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut S {
        &mut self.screen
    }

    pub fn regions(&self) -> &HitRegions<S::Button> {
        &self.regions
    }
}

impl<S: Screen> DynScreen for Page<S> {
    fn id(&self) -> ScreenId {
        self.screen.id()
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &RenderContext) {
        self.regions.clear();
        self.screen.render(frame, area, &mut self.regions, ctx);
    }

    fn refresh(&mut self) -> Option<RefreshJob> {
        self.screen.refresh()
    }

    fn enter(&mut self) {
        tracing::debug!(screen = %self.screen.id(), "enter");
        self.screen.on_enter();
    }

    fn leave(&mut self) {
        tracing::debug!(screen = %self.screen.id(), "leave");
        self.screen.on_leave();
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn gesture(&mut self, gesture: &Gesture) -> bool {
        match gesture.kind {
            GestureKind::Tap => {
                self.screen.on_tap(gesture, &self.regions);
                false
            }
            GestureKind::SwipeLeft => self.screen.on_swipe_left(gesture),
            GestureKind::SwipeRight => self.screen.on_swipe_right(gesture),
            GestureKind::SwipeUp => {
                self.screen.on_swipe_up(gesture);
                false
            }
            GestureKind::SwipeDown => {
                self.screen.on_swipe_down(gesture);
                false
            }
            GestureKind::LongPress => {
                self.screen.on_long_press(gesture);
                false
            }
        }
    }

    fn hardware_button(&mut self) {
        self.screen.on_hardware_button();
    }

    fn apply(&mut self, event: ScreenEvent) {
        self.screen.apply(event);
    }

    fn status(&self) -> ScreenStatus {
        self.screen.status()
    }

    fn region_rects(&self) -> Vec<Rect> {
        self.regions.iter().map(|area| area.rect).collect()
    }
}

/// Build the six screens in navigation order.
pub fn build_all(services: &Services, hub: &TaskHub, now: Instant) -> Vec<Box<dyn DynScreen>> {
    fn page<S: Screen + 'static>(screen: S, tasks: &ScreenTasks) -> Box<dyn DynScreen> {
        Box::new(Page::new(screen, tasks.generation_handle()))
    }

    ScreenId::ALL
        .into_iter()
        .map(|id| {
            let tasks = hub.for_screen(id);
            let services = services.clone();
            match id {
                ScreenId::Home => page(HomeScreen::new(services, tasks.clone(), now), &tasks),
                ScreenId::PrTriage => page(PrTriageScreen::new(services, tasks.clone()), &tasks),
                ScreenId::CiDiagnosis => {
                    page(CiDiagnosisScreen::new(services, tasks.clone()), &tasks)
                }
                ScreenId::Standup => page(StandupScreen::new(services, tasks.clone()), &tasks),
                ScreenId::Deploy => page(DeployScreen::new(services, tasks.clone()), &tasks),
                ScreenId::ContextChat => {
                    page(ContextChatScreen::new(services, tasks.clone(), now), &tasks)
                }
            }
        })
        .collect()
}
