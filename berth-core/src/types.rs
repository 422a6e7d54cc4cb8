//! Domain types shared by every berth crate.
//!
//! [`CanonicalConfig`] is the validated option map destined for disk;
//! [`Outcome`] is the result contract every top-level operation returns.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Desired state of a config artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConfigState {
    #[default]
    Present,
    Absent,
}

impl fmt::Display for ConfigState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigState::Present => write!(f, "present"),
            ConfigState::Absent => write!(f, "absent"),
        }
    }
}

/// Desired state of a daemon plugin. `Test` only probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PluginState {
    #[default]
    Present,
    Absent,
    Test,
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginState::Present => write!(f, "present"),
            PluginState::Absent => write!(f, "absent"),
            PluginState::Test => write!(f, "test"),
        }
    }
}

// ---------------------------------------------------------------------------
// CanonicalConfig
// ---------------------------------------------------------------------------

/// Validated daemon/client configuration keyed by wire-format names.
///
/// Top-level keys keep insertion order; nested JSON objects are key-sorted
/// by `serde_json`. Rendering is therefore a pure function of the entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalConfig {
    entries: Vec<(String, Value)>,
}

impl CanonicalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key`, replacing in place if the key exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge `other` into `self`; keys from `other` win.
    pub fn merge(&mut self, other: CanonicalConfig) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    /// Pretty-printed JSON with a trailing newline: the exact bytes written
    /// to disk and hashed.
    pub fn render(&self) -> Result<String, serde_json::Error> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }
}

impl Serialize for CanonicalConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result contract of every reconciliation entrypoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub changed: bool,
    pub failed: bool,
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Outcome {
    fn new(changed: bool, failed: bool, msg: impl Into<String>) -> Self {
        Self {
            changed,
            failed,
            msg: msg.into(),
            diff: None,
            data: None,
        }
    }

    pub fn changed(msg: impl Into<String>) -> Self {
        Self::new(true, false, msg)
    }

    pub fn unchanged(msg: impl Into<String>) -> Self {
        Self::new(false, false, msg)
    }

    pub fn failure(msg: impl Into<String>) -> Self {
        Self::new(false, true, msg)
    }

    pub fn with_diff(mut self, lines: Vec<String>) -> Self {
        self.diff = Some(lines);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
