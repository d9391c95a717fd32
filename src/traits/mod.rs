//! Trait seams for the dashboard's collaborators.
//!
//! Screens only see these traits, so every collaborator can be swapped for
//! a mock in tests.
//!
//! - [`DataCache`] - local store of polled PRs and runs, standups and deploys
//! - [`CodeHost`] - GitHub REST operations
//! - [`Assistant`] - streaming chat completions
//! - [`Peripherals`] - LEDs, buzzer and the physical button
//! - [`VoiceInput`] - microphone capture and transcription
//! - [`RenderTarget`] - where frames are drawn

pub mod assistant;
pub mod cache;
pub mod code_host;
pub mod display;
pub mod peripherals;
pub mod voice;

pub use assistant::{Assistant, AssistantReply, AssistantRequest};
pub use cache::DataCache;
pub use code_host::CodeHost;
pub use display::RenderTarget;
pub use peripherals::{ButtonListener, Peripherals};
pub use voice::VoiceInput;
