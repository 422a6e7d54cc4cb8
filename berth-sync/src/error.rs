//! Error types for berth-sync.

use std::path::PathBuf;

use thiserror::Error;

use berth_core::CoreError;

/// All errors that can arise from config reconciliation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Desired-state shape or log-driver errors.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error while rendering a config.
    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Strict auth policy rejected at least one entry.
    #[error("invalid registry authentication: {0}")]
    InvalidAuth(String),

    /// A client config entry without a `location`.
    #[error("no location has been configured")]
    MissingLocation,
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
