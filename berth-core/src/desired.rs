//! Desired-state YAML document.
//!
//! # Layout
//!
//! ```yaml
//! daemon:
//!   state: present
//!   options: { log_driver: json-file, debug: true }
//! clients:
//!   - location: ~/.docker/config.json
//!     auth_policy: lenient
//!     auths: { registry.tld: { username: u, password: p } }
//!     formats: { ps: [".ID", ".Names"] }
//! plugins:
//!   - source: grafana/loki-docker-driver
//!     alias: loki
//!     version: 2.9.1
//! ```
//!
//! `auths` and `formats` are kept as raw YAML so that a wrong shape is
//! reported as a [`CoreError::Shape`] by the pipeline that consumes them,
//! instead of failing the whole document.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value as Yaml;

use crate::auth::{AuthEntry, AuthPolicy};
use crate::error::{io_err, shape_err, CoreError};
use crate::paths;
use crate::types::{ConfigState, PluginState};

/// Root of the desired-state document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesiredState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daemon: Option<DaemonConfigSpec>,
    #[serde(default)]
    pub clients: Vec<ClientConfigSpec>,
    #[serde(default)]
    pub plugins: Vec<PluginSpec>,
}

fn default_daemon_dest() -> PathBuf {
    PathBuf::from(paths::DAEMON_CONFIG)
}

fn default_daemon_checksum() -> PathBuf {
    PathBuf::from(paths::DAEMON_CHECKSUM)
}

/// Daemon config (`daemon.json`) section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfigSpec {
    #[serde(default)]
    pub state: ConfigState,
    #[serde(default = "default_daemon_dest")]
    pub dest: PathBuf,
    #[serde(default = "default_daemon_checksum")]
    pub checksum: PathBuf,
    /// Raw option values keyed by input name (`log_driver`, `dns`, ...).
    #[serde(default)]
    pub options: BTreeMap<String, Yaml>,
    /// Ask the daemon whether a plugin log driver is installed and enabled.
    #[serde(default)]
    pub verify_log_driver: bool,
}

impl Default for DaemonConfigSpec {
    fn default() -> Self {
        Self {
            state: ConfigState::Present,
            dest: default_daemon_dest(),
            checksum: default_daemon_checksum(),
            options: BTreeMap::new(),
            verify_log_driver: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Client config (`config.json`) entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfigSpec {
    #[serde(default)]
    pub location: Option<PathBuf>,
    #[serde(default)]
    pub state: ConfigState,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub auth_policy: AuthPolicy,
    /// Digest file; defaults to `<location>.checksum`.
    #[serde(default)]
    pub checksum: Option<PathBuf>,
    #[serde(default)]
    pub auths: Yaml,
    #[serde(default)]
    pub formats: Yaml,
}

impl Default for ClientConfigSpec {
    fn default() -> Self {
        Self {
            location: None,
            state: ConfigState::Present,
            enabled: true,
            auth_policy: AuthPolicy::Strict,
            checksum: None,
            auths: Yaml::Null,
            formats: Yaml::Null,
        }
    }
}

impl ClientConfigSpec {
    pub fn checksum_path(&self, location: &Path) -> PathBuf {
        self.checksum
            .clone()
            .unwrap_or_else(|| paths::client_checksum_path(location))
    }

    /// `auths` as `host → entry`. Null means no entries.
    pub fn auths(&self) -> Result<BTreeMap<String, AuthEntry>, CoreError> {
        let map = match &self.auths {
            Yaml::Null => return Ok(BTreeMap::new()),
            Yaml::Mapping(map) => map,
            _ => return Err(shape_err("auths", "a mapping of registry host to credentials")),
        };

        let mut out = BTreeMap::new();
        for (host, entry) in map {
            let Some(host) = host.as_str() else {
                return Err(shape_err("auths", "a mapping keyed by registry host"));
            };
            let entry = match entry {
                Yaml::Null => AuthEntry::default(),
                Yaml::Mapping(_) => serde_yaml::from_value(entry.clone()).map_err(|_| {
                    shape_err(
                        format!("auths.{host}"),
                        "a mapping with 'auth' or 'username'/'password' strings",
                    )
                })?,
                _ => {
                    return Err(shape_err(
                        format!("auths.{host}"),
                        "a mapping with 'auth' or 'username'/'password' strings",
                    ))
                }
            };
            out.insert(host.to_string(), entry);
        }
        Ok(out)
    }

    /// `formats` as `category → selectors`. Null means no formats.
    pub fn formats(&self) -> Result<BTreeMap<String, Vec<String>>, CoreError> {
        let map = match &self.formats {
            Yaml::Null => return Ok(BTreeMap::new()),
            Yaml::Mapping(map) => map,
            _ => return Err(shape_err("formats", "a mapping of category to selector list")),
        };

        let mut out = BTreeMap::new();
        for (category, selectors) in map {
            let Some(category) = category.as_str() else {
                return Err(shape_err("formats", "a mapping keyed by category name"));
            };
            let selectors = match selectors {
                Yaml::Null => Vec::new(),
                Yaml::Sequence(items) => items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| shape_err(format!("formats.{category}"), "a list of strings"))?,
                _ => return Err(shape_err(format!("formats.{category}"), "a list of strings")),
            };
            out.insert(category.to_string(), selectors);
        }
        Ok(out)
    }
}

fn default_plugin_version() -> String {
    "latest".to_string()
}

/// A daemon plugin that should (or should not) be active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSpec {
    /// Remote repository, e.g. `grafana/loki-docker-driver`.
    pub source: String,
    /// Local name the plugin is installed under.
    pub alias: String,
    #[serde(default = "default_plugin_version")]
    pub version: String,
    #[serde(default)]
    pub state: PluginState,
    /// Seconds to wait for enable; 0 leaves it to the daemon.
    #[serde(default)]
    pub enable_timeout_secs: u64,
}

impl PluginSpec {
    pub fn new(source: impl Into<String>, alias: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            alias: alias.into(),
            version: version.into(),
            state: PluginState::Present,
            enable_timeout_secs: 0,
        }
    }

    /// `source:version`: what the daemon pulls.
    pub fn remote_ref(&self) -> String {
        format!("{}:{}", self.source, self.version)
    }

    /// `alias:version`: the name the plugin is installed under.
    pub fn local_ref(&self) -> String {
        format!("{}:{}", self.alias, self.version)
    }
}

/// Parse a desired-state document; `path` is only used for error context.
pub fn parse(path: &Path, contents: &str) -> Result<DesiredState, CoreError> {
    serde_yaml::from_str(contents).map_err(|source| CoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the desired state at `path`.
///
/// Returns `CoreError::DesiredStateNotFound` if absent,
/// `CoreError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(path: &Path) -> Result<DesiredState, CoreError> {
    if !path.exists() {
        return Err(CoreError::DesiredStateNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    parse(path, &contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(yaml: &str) -> ClientConfigSpec {
        serde_yaml::from_str(yaml).expect("client yaml")
    }

    #[test]
    fn defaults_fill_in() {
        let state = parse(Path::new("mem.yaml"), "daemon: {}\nplugins:\n  - source: a/b\n    alias: b\n")
            .expect("parse");
        let daemon = state.daemon.expect("daemon");
        assert_eq!(daemon.dest, PathBuf::from(paths::DAEMON_CONFIG));
        assert_eq!(daemon.state, ConfigState::Present);
        assert_eq!(state.plugins[0].version, "latest");
        assert_eq!(state.plugins[0].local_ref(), "b:latest");
        assert!(state.clients.is_empty());
    }

    #[test]
    fn auths_must_be_a_mapping() {
        let err = client("auths: [a, b]\n").auths().unwrap_err();
        assert!(matches!(err, CoreError::Shape { .. }), "got: {err}");
        assert!(err.to_string().contains("'auths'"));
    }

    #[test]
    fn auth_entry_with_wrong_shape_names_the_host() {
        let err = client("auths:\n  reg.tld: token\n").auths().unwrap_err();
        assert!(err.to_string().contains("auths.reg.tld"));
    }

    #[test]
    fn null_auth_entry_is_empty() {
        let auths = client("auths:\n  reg.tld:\n").auths().expect("auths");
        assert_eq!(auths["reg.tld"], AuthEntry::default());
    }

    #[test]
    fn formats_must_be_lists_of_strings() {
        let formats = client("formats:\n  ps: ['.ID', '.Names']\n").formats().expect("formats");
        assert_eq!(formats["ps"], vec![".ID".to_string(), ".Names".to_string()]);

        let err = client("formats: table\n").formats().unwrap_err();
        assert!(matches!(err, CoreError::Shape { .. }));
        let err = client("formats:\n  ps: '.ID'\n").formats().unwrap_err();
        assert!(err.to_string().contains("formats.ps"));
    }

    #[test]
    fn checksum_defaults_next_to_location() {
        let spec = client("location: /tmp/config.json\n");
        let location = spec.location.clone().expect("location");
        assert_eq!(spec.checksum_path(&location), PathBuf::from("/tmp/config.json.checksum"));
    }
}
