//! # berth-sync
//!
//! Digest-gated atomic writer and the config reconciliation pipelines.
//!
//! Call [`reconcile_daemon_config`] for `daemon.json` or
//! [`reconcile_client_configs`] for every client `config.json`.

pub mod detector;
pub mod diff;
pub mod digest;
pub mod error;
pub mod pipeline;
pub mod writer;

pub use detector::ChangeDecision;
pub use error::SyncError;
pub use pipeline::{
    build_client_config, build_daemon_config, reconcile_client_config, reconcile_client_configs,
    reconcile_daemon_config, ClientBuild, RunOptions,
};
pub use writer::WriteResult;
