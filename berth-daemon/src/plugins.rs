//! Plugin lifecycle reconciliation.
//!
//! ## Transitions
//!
//! | desired   | observed                       | calls                                   |
//! |-----------|--------------------------------|-----------------------------------------|
//! | `test`    | any                            | none                                    |
//! | `present` | active, same version           | enable, reload                          |
//! | `present` | active, other version          | disable old, install, enable, reload    |
//! | `present` | desired installed but disabled | enable, reload                          |
//! | `present` | nothing                        | install, enable, reload                 |
//! | `absent`  | active                         | disable, remove                         |
//! | `absent`  | nothing active                 | none                                    |
//!
//! ## Failure policy
//!
//! `ping`, `list_plugins`, `get_plugin` and `install_plugin` failures are
//! fatal. `enable`, `reload`, `disable` and `remove` failures are soft:
//! the outcome is not failed and its message carries the error. Nothing is
//! rolled back or retried.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;

use berth_core::{Outcome, PluginSpec, PluginState};

use crate::client::{DaemonClient, PluginHandle, PluginInfo};
use crate::descriptor::{self, PluginDescriptor};
use crate::error::DaemonError;

/// Observed lifecycle state of the desired plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Absent,
    InstalledDisabled,
    InstalledEnabled,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Absent => write!(f, "absent"),
            LifecycleState::InstalledDisabled => write!(f, "installed_disabled"),
            LifecycleState::InstalledEnabled => write!(f, "installed_enabled"),
        }
    }
}

/// What the daemon currently has for one alias.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    /// First enabled plugin whose repository name is the alias.
    pub active: Option<PluginInfo>,
    /// `alias:version` installed but disabled.
    pub desired_disabled: Option<PluginInfo>,
}

impl Observation {
    pub fn from_plugins(plugins: &[PluginInfo], alias: &str, version: &str) -> Self {
        let mut named = plugins.iter().filter(|p| p.split_name().0 == alias);
        let active = named.clone().find(|p| p.enabled).cloned();
        let desired_disabled = named
            .find(|p| !p.enabled && p.split_name().1 == version)
            .cloned();
        Self {
            active,
            desired_disabled,
        }
    }

    pub fn active_version(&self) -> Option<&str> {
        self.active.as_ref().map(|p| p.split_name().1)
    }

    /// Lifecycle state relative to `version`.
    pub fn state_for(&self, version: &str) -> LifecycleState {
        match (self.active_version(), &self.desired_disabled) {
            (Some(active), _) if active == version => LifecycleState::InstalledEnabled,
            (_, Some(p)) if p.split_name().1 == version => LifecycleState::InstalledDisabled,
            _ => LifecycleState::Absent,
        }
    }
}

/// Drives one plugin towards its desired state through an injected client.
pub struct PluginReconciler<C> {
    client: C,
    cache_dir: PathBuf,
}

impl<C: DaemonClient> PluginReconciler<C> {
    pub fn new(client: C, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            cache_dir: cache_dir.into(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn reconcile(&self, spec: &PluginSpec) -> Outcome {
        if let Err(err) = self.client.ping() {
            tracing::error!(alias = %spec.alias, "daemon ping failed: {err}");
            return Outcome::failure(unavailable_msg(&err));
        }

        let plugins = match self.client.list_plugins() {
            Ok(plugins) => plugins,
            Err(err) => return Outcome::failure(format!("could not list plugins: {err}")),
        };
        let observed = Observation::from_plugins(&plugins, &spec.alias, &spec.version);
        tracing::debug!(
            alias = %spec.alias,
            active = ?observed.active_version(),
            desired = %spec.version,
            "observed plugin state"
        );

        match spec.state {
            PluginState::Test => self.report(spec, &observed),
            PluginState::Present => self.ensure_present(spec, &observed),
            PluginState::Absent => self.ensure_absent(spec, &observed),
        }
    }

    fn report(&self, spec: &PluginSpec, observed: &Observation) -> Outcome {
        let state = observed.state_for(&spec.version);
        let msg = match (state, observed.active_version()) {
            (LifecycleState::InstalledEnabled, _) => {
                format!("plugin {} is installed and enabled", spec.local_ref())
            }
            (_, Some(active)) => format!(
                "plugin {} is active in version '{active}', desired '{}'",
                spec.alias, spec.version
            ),
            (LifecycleState::InstalledDisabled, None) => {
                format!("plugin {} is installed but disabled", spec.local_ref())
            }
            (LifecycleState::Absent, None) => format!("plugin {} is not installed", spec.alias),
        };
        Outcome::unchanged(msg).with_data(json!({
            "alias": spec.alias,
            "state": state.to_string(),
            "active_version": observed.active_version(),
            "desired_version": spec.version,
        }))
    }

    fn ensure_present(&self, spec: &PluginSpec, observed: &Observation) -> Outcome {
        let mut notes = Vec::new();
        let timeout = Duration::from_secs(spec.enable_timeout_secs);

        if let Some(active) = &observed.active {
            let (_, active_version) = active.split_name();
            if active_version == spec.version {
                let handle = active.handle();
                self.soft("enable", &mut notes, self.client.enable(&handle, timeout));
                self.soft("reload", &mut notes, self.client.reload(&handle));
                return with_notes(
                    Outcome::unchanged(format!("plugin {} re-enabled", spec.local_ref())),
                    &notes,
                );
            }

            let previous = active.name.clone();
            self.soft(
                "disable",
                &mut notes,
                self.client.disable(&active.handle(), true),
            );
            let handle = match self.acquire(spec, observed) {
                Ok(handle) => handle,
                Err(outcome) => return with_notes(outcome, &notes),
            };
            let reloaded = self.activate(spec, &handle, timeout, &mut notes);
            self.persist(spec, &handle, reloaded, &mut notes);
            return with_notes(
                Outcome::changed(format!(
                    "plugin {} replaced {previous}",
                    spec.local_ref()
                )),
                &notes,
            );
        }

        if observed.desired_disabled.is_some() {
            let handle = match self.acquire(spec, observed) {
                Ok(handle) => handle,
                Err(outcome) => return outcome,
            };
            let reloaded = self.activate(spec, &handle, timeout, &mut notes);
            self.persist(spec, &handle, reloaded, &mut notes);
            return with_notes(
                Outcome::changed(format!("plugin {} enabled", spec.local_ref())),
                &notes,
            );
        }

        let handle = match self.install(spec) {
            Ok(handle) => handle,
            Err(outcome) => return outcome,
        };
        let reloaded = self.activate(spec, &handle, timeout, &mut notes);
        self.persist(spec, &handle, reloaded, &mut notes);
        with_notes(
            Outcome::changed(format!("plugin {} installed", spec.local_ref())),
            &notes,
        )
    }

    /// Only the active plugin is touched; disabled leftovers stay installed.
    fn ensure_absent(&self, spec: &PluginSpec, observed: &Observation) -> Outcome {
        let Some(active) = &observed.active else {
            return Outcome::unchanged(format!("plugin {} is not active", spec.alias));
        };

        let mut notes = Vec::new();
        let handle = active.handle();
        self.soft("disable", &mut notes, self.client.disable(&handle, true));
        let removed = self
            .soft("remove", &mut notes, self.client.remove_plugin(&handle, true))
            .is_some();
        if let Err(err) = descriptor::delete(&self.cache_dir, &spec.alias) {
            tracing::warn!(alias = %spec.alias, "descriptor not deleted: {err}");
            notes.push(format!("descriptor not deleted: {err}"));
        }

        let msg = if removed {
            format!("plugin {} removed", active.name)
        } else {
            format!("plugin {} removal attempted", active.name)
        };
        with_notes(Outcome::changed(msg), &notes)
    }

    /// Handle of the desired version: looked up when it is already
    /// installed, installed otherwise. Failure ends the run.
    fn acquire(&self, spec: &PluginSpec, observed: &Observation) -> Result<PluginHandle, Outcome> {
        if observed.desired_disabled.is_none() {
            return self.install(spec);
        }
        self.client.get_plugin(&spec.local_ref()).map_err(|err| {
            Outcome::failure(format!(
                "plugin {} could not be looked up: {err}",
                spec.local_ref()
            ))
        })
    }

    /// Install the desired version; failure ends the run.
    fn install(&self, spec: &PluginSpec) -> Result<PluginHandle, Outcome> {
        tracing::info!(remote = %spec.remote_ref(), local = %spec.local_ref(), "installing plugin");
        self.client
            .install_plugin(&spec.remote_ref(), &spec.local_ref())
            .map_err(|err| {
                tracing::error!(alias = %spec.alias, "install failed: {err}");
                Outcome::failure(format!(
                    "plugin {} could not be installed: {err}",
                    spec.local_ref()
                ))
            })
    }

    /// Enable then reload. Returns the daemon's view after reload, or
    /// `Err(enabled)` with the enable result when reload failed.
    fn activate(
        &self,
        spec: &PluginSpec,
        handle: &PluginHandle,
        timeout: Duration,
        notes: &mut Vec<String>,
    ) -> Result<PluginInfo, bool> {
        let enabled = self
            .soft("enable", notes, self.client.enable(handle, timeout))
            .is_some();
        let reloaded = self.soft("reload", notes, self.client.reload(handle));
        tracing::debug!(
            alias = %spec.alias,
            enabled,
            reloaded = reloaded.is_some(),
            "plugin activated"
        );
        reloaded.ok_or(enabled)
    }

    /// Record the activated plugin. Reloaded metadata wins over the handle.
    fn persist(
        &self,
        spec: &PluginSpec,
        handle: &PluginHandle,
        reloaded: Result<PluginInfo, bool>,
        notes: &mut Vec<String>,
    ) {
        let (id, name, enabled, source) = match reloaded {
            Ok(info) => {
                let source = if info.reference.is_empty() {
                    spec.remote_ref()
                } else {
                    info.reference
                };
                (info.id, info.name, info.enabled, source)
            }
            Err(enabled) => (
                handle.id.clone(),
                handle.name.clone(),
                enabled,
                spec.remote_ref(),
            ),
        };
        let descriptor = PluginDescriptor {
            id,
            name,
            short_name: spec.alias.clone(),
            version: spec.version.clone(),
            enabled,
            source,
            activated_at: Utc::now(),
        };
        if let Err(err) = descriptor::save(&self.cache_dir, &descriptor) {
            tracing::warn!(alias = %spec.alias, "descriptor not saved: {err}");
            notes.push(format!("descriptor not saved: {err}"));
        }
    }

    /// Record a soft failure. Returns the value when the call succeeded.
    fn soft<T>(
        &self,
        op: &str,
        notes: &mut Vec<String>,
        result: Result<T, DaemonError>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("{op} failed: {err}");
                notes.push(format!("{op} failed: {err}"));
                None
            }
        }
    }
}

pub(crate) fn unavailable_msg(err: &DaemonError) -> String {
    if err.is_unavailable() {
        err.to_string()
    } else {
        format!("daemon unavailable: {err}")
    }
}

fn with_notes(mut outcome: Outcome, notes: &[String]) -> Outcome {
    if !notes.is_empty() {
        outcome.msg.push_str("; ");
        outcome.msg.push_str(&notes.join("; "));
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str, enabled: bool) -> PluginInfo {
        PluginInfo {
            id: format!("id-{name}"),
            name: name.to_string(),
            enabled,
            reference: String::new(),
        }
    }

    #[test]
    fn active_is_first_enabled_with_matching_alias() {
        let plugins = vec![
            info("sshfs:latest", true),
            info("loki:2.8.0", false),
            info("loki:2.9.1", true),
        ];
        let observed = Observation::from_plugins(&plugins, "loki", "2.8.0");
        assert_eq!(observed.active_version(), Some("2.9.1"));
        assert_eq!(observed.desired_disabled.as_ref().unwrap().name, "loki:2.8.0");
        assert_eq!(observed.state_for("2.9.1"), LifecycleState::InstalledEnabled);
        assert_eq!(observed.state_for("2.8.0"), LifecycleState::InstalledDisabled);
        assert_eq!(observed.state_for("3.0"), LifecycleState::Absent);
    }

    #[test]
    fn notes_are_appended() {
        let outcome = with_notes(
            Outcome::changed("plugin x installed"),
            &["enable failed: boom".to_string()],
        );
        assert_eq!(outcome.msg, "plugin x installed; enable failed: boom");
        assert!(!outcome.failed);
    }
}
