//! Result type alias for devdash operations.

use super::context::ErrorContext;
use super::dash_error::DashError;

/// Type alias for Results using DashError.
pub type DashResult<T> = Result<T, DashError>;

/// Extension trait for attaching an [`ErrorContext`] to any error that
/// converts into [`DashError`].
///
/// ```ignore
/// use devdash::error::{ErrorContext, ResultExt};
///
/// let pulls = client
///     .open_pulls(repo)
///     .await
///     .with_context(|| ErrorContext::new("open_pulls").with_repo(repo))?;
/// ```
pub trait ResultExt<T> {
    fn context(self, ctx: ErrorContext) -> DashResult<T>;

    /// Add context using a closure (only called on error).
    fn with_context<F>(self, f: F) -> DashResult<T>
    where
        F: FnOnce() -> ErrorContext;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<DashError>,
{
    fn context(self, ctx: ErrorContext) -> DashResult<T> {
        self.map_err(|e| e.into().with_context(ctx))
    }

    fn with_context<F>(self, f: F) -> DashResult<T>
    where
        F: FnOnce() -> ErrorContext,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
