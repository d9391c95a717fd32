//! Unified error handling for devdash.
//!
//! - **Error categories** decide retry policy and the hint shown on screen
//! - **Domain errors** cover network, storage, config, system and UI failures
//! - **`DashError`** consolidates them behind one type
//! - **`ErrorContext`** records the operation, screen and repo involved
//!
//! Screens never propagate collaborator errors to the manager. They catch a
//! [`DashError`] where the call returns, log it, and show
//! [`DashError::user_message`] in an error sub-state.
//!
//! | Category | Retryable |
//! |----------|-----------|
//! | Network | Yes |
//! | Auth | No |
//! | Server | Yes |
//! | Client | No |
//! | User | No |
//! | System | Sometimes |
//! | Configuration | No |

mod category;
mod config;
mod context;
mod dash_error;
mod network;
mod result;
mod storage;
mod system;
mod ui;

pub use category::ErrorCategory;
pub use config::ConfigError;
pub use context::ErrorContext;
pub use dash_error::DashError;
pub use network::{classify_reqwest_error, NetworkError};
pub use result::{DashResult, ResultExt};
pub use storage::StorageError;
pub use system::{classify_io_error, SystemError};
pub use ui::UiError;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_error_unification() {
        let errors: Vec<DashError> = vec![
            NetworkError::Timeout {
                operation: "poll".to_string(),
                duration_secs: 30,
            }
            .into(),
            StorageError::Poisoned.into(),
            ConfigError::MissingValue {
                key: "github.token".to_string(),
            }
            .into(),
            SystemError::NoDataDirectory.into(),
            UiError::Channel {
                message: "closed".to_string(),
            }
            .into(),
        ];

        for err in &errors {
            assert!(!err.error_code().is_empty());
            assert!(!err.user_message().is_empty());
            assert!(!err.recovery_hint().is_empty());
        }

        assert!(errors[0].is_retryable());
        assert_eq!(errors[2].category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_result_ext_on_dash_result() {
        fn might_fail() -> DashResult<i32> {
            Err(NetworkError::Cancelled.into())
        }

        let err = might_fail()
            .context(ErrorContext::new("deploy").with_screen("deploy"))
            .unwrap_err();
        assert_eq!(err.context().unwrap().screen.as_deref(), Some("deploy"));
    }
}
