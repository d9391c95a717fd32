//! System clipboard access.

use arboard::Clipboard;

use crate::error::{DashResult, SystemError};

fn clipboard_error(err: arboard::Error) -> SystemError {
    SystemError::Clipboard {
        message: err.to_string(),
    }
}

/// Copy text to the system clipboard.
///
/// Clipboard backends block (X11 round trips), so the copy runs on the
/// blocking pool.
pub async fn copy_to_clipboard(text: String) -> DashResult<()> {
    if text.trim().is_empty() {
        return Err(SystemError::Clipboard {
            message: "nothing to copy".to_string(),
        }
        .into());
    }

    tokio::task::spawn_blocking(move || set_text(&text)).await??;
    tracing::debug!("copied to clipboard");
    Ok(())
}

fn set_text(text: &str) -> Result<(), SystemError> {
    let mut clipboard = Clipboard::new().map_err(clipboard_error)?;
    clipboard.set_text(text).map_err(clipboard_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashError;

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        for text in ["", "  \n"] {
            let err = copy_to_clipboard(text.to_string()).await.unwrap_err();
            assert!(matches!(
                err,
                DashError::System(SystemError::Clipboard { ref message }) if message == "nothing to copy"
            ));
            assert_eq!(err.error_code(), "E_SYS_CLIPBOARD");
        }
    }
}
