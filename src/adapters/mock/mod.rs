//! In-memory collaborators for tests.
//!
//! - [`MockCache`] - [`DataCache`](crate::traits::DataCache) over vectors
//! - [`MockCodeHost`] - scripted repos that record reviews, issues and dispatches
//! - [`MockAssistant`] - queued replies, streamed word by word
//! - [`MockPeripherals`] - records LED patterns and melodies
//! - [`MockVoice`] - queued transcripts
//! - [`TestDisplay`] - `TestBackend` render target with failure injection

pub mod assistant;
pub mod cache;
pub mod code_host;
pub mod display;
pub mod peripherals;
pub mod voice;

pub use assistant::MockAssistant;
pub use cache::MockCache;
pub use code_host::{MockCodeHost, RecordedDispatch, RecordedIssue, RecordedReview};
pub use display::TestDisplay;
pub use peripherals::MockPeripherals;
pub use voice::MockVoice;
