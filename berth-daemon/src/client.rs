//! The daemon collaborator consumed by reconciliation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DaemonError;

/// A plugin as listed by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub id: String,
    /// Local name, `alias:version`.
    pub name: String,
    pub enabled: bool,
    /// Remote reference the plugin was pulled from.
    #[serde(default)]
    pub reference: String,
}

impl PluginInfo {
    pub fn handle(&self) -> PluginHandle {
        PluginHandle {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }

    /// `(repository, version)` of the local name.
    pub fn split_name(&self) -> (&str, &str) {
        split_reference(&self.name)
    }
}

/// Opaque reference to an installed plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginHandle {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub api_version: String,
    pub version: String,
}

/// Split `name:version`; a missing tag means `latest`.
///
/// A colon inside a registry host (`host:5000/repo`) is not a tag separator.
pub fn split_reference(reference: &str) -> (&str, &str) {
    match reference.rsplit_once(':') {
        Some((name, tag)) if !tag.contains('/') && !name.is_empty() => (name, tag),
        _ => (reference, "latest"),
    }
}

/// Blocking request/response calls against a live daemon.
///
/// No call is retried; every failure is returned to the caller.
pub trait DaemonClient {
    fn ping(&self) -> Result<(), DaemonError>;

    fn list_plugins(&self) -> Result<Vec<PluginInfo>, DaemonError>;

    fn get_plugin(&self, name: &str) -> Result<PluginHandle, DaemonError>;

    /// Pull `remote` and install it under the local name `local`.
    fn install_plugin(&self, remote: &str, local: &str) -> Result<PluginHandle, DaemonError>;

    fn enable(&self, handle: &PluginHandle, timeout: Duration) -> Result<(), DaemonError>;

    fn disable(&self, handle: &PluginHandle, force: bool) -> Result<(), DaemonError>;

    fn remove_plugin(&self, handle: &PluginHandle, force: bool) -> Result<(), DaemonError>;

    /// Refresh and return the daemon's view of the plugin.
    fn reload(&self, handle: &PluginHandle) -> Result<PluginInfo, DaemonError>;

    fn version(&self) -> Result<VersionInfo, DaemonError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_reference_handles_tags_and_hosts() {
        assert_eq!(split_reference("loki:2.9.1"), ("loki", "2.9.1"));
        assert_eq!(split_reference("loki"), ("loki", "latest"));
        assert_eq!(
            split_reference("registry:5000/team/loki"),
            ("registry:5000/team/loki", "latest")
        );
        assert_eq!(
            split_reference("registry:5000/team/loki:3"),
            ("registry:5000/team/loki", "3")
        );
    }
}
