//! Local cache (SQLite) error types.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("failed to open cache at '{path}': {message}")]
    Open { path: String, message: String },

    #[error("{operation} failed: {message}")]
    Query { operation: String, message: String },

    #[error("cache connection lock poisoned")]
    Poisoned,
}

impl StorageError {
    pub fn user_message(&self) -> String {
        match self {
            StorageError::Open { .. } => "Local cache unavailable.".to_string(),
            StorageError::Query { operation, .. } => format!("Cache {} failed.", operation),
            StorageError::Poisoned => "Local cache is in a bad state.".to_string(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::Open { .. } => "E_DB_OPEN",
            StorageError::Query { .. } => "E_DB_QUERY",
            StorageError::Poisoned => "E_DB_POISON",
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Query {
            operation: "query".to_string(),
            message: err.to_string(),
        }
    }
}
