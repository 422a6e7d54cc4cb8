//! Error types for berth-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from loading or shaping desired state.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse desired state at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The desired-state file did not exist at the expected path.
    #[error("desired state not found at {path}")]
    DesiredStateNotFound { path: PathBuf },

    /// A section of the desired state has the wrong shape (e.g. `auths` is a list).
    #[error("'{field}' must be {expected}")]
    Shape {
        field: String,
        expected: &'static str,
    },

    /// A log driver string that is neither built in nor `name:version`.
    #[error("invalid log driver '{driver}': {reason}")]
    LogDriver { driver: String, reason: String },

    /// `dirs::home_dir()` returned `None`: cannot expand `~`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

/// Convenience constructor for [`CoreError::Io`].
pub fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`CoreError::Shape`].
pub(crate) fn shape_err(field: impl Into<String>, expected: &'static str) -> CoreError {
    CoreError::Shape {
        field: field.into(),
        expected,
    }
}
