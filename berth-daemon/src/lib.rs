//! Daemon-facing half of berth: the control-socket client, plugin
//! lifecycle reconciliation, log-driver verification and version probe.

pub mod client;
pub mod descriptor;
mod error;
pub mod paths;
pub mod plugins;
pub mod socket;
pub mod verify;
pub mod version;

pub use client::{DaemonClient, PluginHandle, PluginInfo, VersionInfo};
pub use descriptor::PluginDescriptor;
pub use error::DaemonError;
pub use plugins::{LifecycleState, Observation, PluginReconciler};
pub use socket::{DaemonRequest, DaemonResponse, SocketClient};
pub use verify::verify_log_driver;
pub use version::probe_version;
