use std::path::PathBuf;

use thiserror::Error;

/// Error surface for daemon calls, descriptors and verification.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("daemon unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("daemon protocol error: {0}")]
    Protocol(String),

    #[error("daemon call '{op}' failed: {msg}")]
    Call { op: String, msg: String },

    #[error("log driver plugin '{driver}' is not installed and enabled")]
    LogDriverMissing { driver: String },
}

impl DaemonError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DaemonError::Unavailable { .. })
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
