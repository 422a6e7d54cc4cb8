//! Daemon option normalizer.
//!
//! Turns the sparse `options:` mapping of the desired state into a
//! [`CanonicalConfig`]. Each input is classified into a [`ConfigOption`]
//! against the fixed [`OPTIONS`] table; only `Valid` options are emitted,
//! in table order.

use std::collections::BTreeMap;

use serde_json::Value;
use serde_yaml::Value as Yaml;

use crate::types::CanonicalConfig;

pub const LOG_LEVELS: &[&str] = &["debug", "info", "warn", "error", "fatal"];

pub const STORAGE_DRIVERS: &[&str] = &[
    "overlay2",
    "fuse-overlayfs",
    "btrfs",
    "zfs",
    "vfs",
    "aufs",
    "devicemapper",
];

/// Expected shape of an option value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Str,
    Int,
    Bool,
    List,
    Map,
    Enum(&'static [&'static str]),
}

/// One row of the option table: input name, wire key, shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: &'static str,
    pub key: &'static str,
    pub kind: OptionKind,
}

const fn spec(name: &'static str, key: &'static str, kind: OptionKind) -> OptionSpec {
    OptionSpec { name, key, kind }
}

/// Daemon options in emission order.
pub const OPTIONS: &[OptionSpec] = &[
    spec("log_driver", "log-driver", OptionKind::Str),
    spec("log_opts", "log-opts", OptionKind::Map),
    spec("log_level", "log-level", OptionKind::Enum(LOG_LEVELS)),
    spec("dns", "dns", OptionKind::List),
    spec("dns_opts", "dns-opts", OptionKind::List),
    spec("dns_search", "dns-search", OptionKind::List),
    spec("data_root", "data-root", OptionKind::Str),
    spec("max_concurrent_downloads", "max-concurrent-downloads", OptionKind::Int),
    spec("max_concurrent_uploads", "max-concurrent-uploads", OptionKind::Int),
    spec("max_download_attempts", "max-download-attempts", OptionKind::Int),
    spec("debug", "debug", OptionKind::Bool),
    spec("selinux_enabled", "selinux-enabled", OptionKind::Bool),
    spec("seccomp_profile", "seccomp-profile", OptionKind::Str),
    spec("experimental", "experimental", OptionKind::Bool),
    spec("metrics_addr", "metrics-addr", OptionKind::Str),
    spec("storage_driver", "storage-driver", OptionKind::Enum(STORAGE_DRIVERS)),
    spec("storage_opts", "storage-opts", OptionKind::List),
    spec("group", "group", OptionKind::Str),
    spec("bridge", "bridge", OptionKind::Str),
    spec("bip", "bip", OptionKind::Str),
    spec("ip", "ip", OptionKind::Str),
    spec("fixed_cidr", "fixed-cidr", OptionKind::Str),
    spec("fixed_cidr_v6", "fixed-cidr-v6", OptionKind::Str),
    spec("default_gateway", "default-gateway", OptionKind::Str),
    spec("default_gateway_v6", "default-gateway-v6", OptionKind::Str),
    spec("insecure_registries", "insecure-registries", OptionKind::List),
    spec("registry_mirrors", "registry-mirrors", OptionKind::List),
    spec("live_restore", "live-restore", OptionKind::Bool),
    spec("shutdown_timeout", "shutdown-timeout", OptionKind::Int),
    spec("hosts", "hosts", OptionKind::List),
];

/// TLS options; only emitted when CA, cert and key are all valid.
pub const TLS_OPTIONS: &[OptionSpec] = &[
    spec("tls_verify", "tlsverify", OptionKind::Bool),
    spec("tls_ca_cert", "tlscacert", OptionKind::Str),
    spec("tls_cert", "tlscert", OptionKind::Str),
    spec("tls_key", "tlskey", OptionKind::Str),
];

const TLS_REQUIRED: [&str; 3] = ["tls_ca_cert", "tls_cert", "tls_key"];

/// Classification of a single raw option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOption {
    Absent,
    Valid(Value),
    Invalid { reason: String },
}

impl ConfigOption {
    /// Classify `raw` against `kind`. `None` and YAML `null` are absent.
    pub fn classify(raw: Option<&Yaml>, kind: OptionKind) -> Self {
        let raw = match raw {
            None | Some(Yaml::Null) => return ConfigOption::Absent,
            Some(raw) => raw,
        };

        match kind {
            OptionKind::Str => match raw {
                Yaml::String(s) if !s.is_empty() => ConfigOption::Valid(Value::from(s.clone())),
                Yaml::String(_) => invalid("empty string"),
                _ => invalid("expected a string"),
            },
            OptionKind::Int => match raw.as_i64() {
                Some(n) => ConfigOption::Valid(Value::from(n)),
                None => invalid("expected an integer"),
            },
            OptionKind::Bool => match raw {
                Yaml::Bool(b) => ConfigOption::Valid(Value::from(*b)),
                _ => invalid("expected a boolean"),
            },
            OptionKind::List => match raw {
                Yaml::Sequence(items) if items.is_empty() => invalid("empty list"),
                Yaml::Sequence(items) => {
                    let mut out = Vec::with_capacity(items.len());
                    for item in items {
                        match scalar_to_string(item) {
                            Some(s) => out.push(Value::from(s)),
                            None => return invalid("list items must be scalars"),
                        }
                    }
                    ConfigOption::Valid(Value::Array(out))
                }
                _ => invalid("expected a list"),
            },
            OptionKind::Map => match raw {
                Yaml::Mapping(map) if map.is_empty() => invalid("empty mapping"),
                Yaml::Mapping(map) => {
                    let mut out = serde_json::Map::new();
                    for (k, v) in map {
                        match (scalar_to_string(k), scalar_to_string(v)) {
                            (Some(k), Some(v)) => {
                                out.insert(k, Value::from(v));
                            }
                            _ => return invalid("mapping keys and values must be scalars"),
                        }
                    }
                    ConfigOption::Valid(Value::Object(out))
                }
                _ => invalid("expected a mapping"),
            },
            OptionKind::Enum(allowed) => match raw {
                Yaml::String(s) if allowed.contains(&s.as_str()) => {
                    ConfigOption::Valid(Value::from(s.clone()))
                }
                Yaml::String(s) => invalid(format!(
                    "'{s}' is not one of: {}",
                    allowed.join(", ")
                )),
                _ => invalid("expected a string"),
            },
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ConfigOption::Valid(_))
    }
}

fn invalid(reason: impl Into<String>) -> ConfigOption {
    ConfigOption::Invalid {
        reason: reason.into(),
    }
}

fn scalar_to_string(value: &Yaml) -> Option<String> {
    match value {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Number(n) => Some(n.to_string()),
        Yaml::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// An option that was present but not emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excluded {
    pub name: String,
    pub reason: String,
}

/// Normalizer output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub config: CanonicalConfig,
    pub excluded: Vec<Excluded>,
    pub unknown: Vec<String>,
}

/// Build the canonical daemon config from raw option values.
pub fn normalize(raw: &BTreeMap<String, Yaml>) -> Normalized {
    let mut out = Normalized::default();

    for spec in OPTIONS {
        classify_into(&mut out, raw, spec);
    }

    // Metrics are only served by the daemon in experimental mode.
    if out.config.contains_key("metrics-addr") {
        out.config.insert("experimental", true);
    }

    let required: Vec<ConfigOption> = TLS_REQUIRED
        .iter()
        .map(|name| ConfigOption::classify(raw.get(*name), OptionKind::Str))
        .collect();
    if required.iter().all(ConfigOption::is_valid) {
        out.config.insert("tls", true);
        for spec in TLS_OPTIONS {
            classify_into(&mut out, raw, spec);
        }
    } else if required.iter().any(|o| !matches!(o, ConfigOption::Absent)) {
        out.excluded.push(Excluded {
            name: "tls".to_string(),
            reason: "tls_ca_cert, tls_cert and tls_key must all be set".to_string(),
        });
    }

    out.unknown = raw
        .keys()
        .filter(|name| {
            !OPTIONS
                .iter()
                .chain(TLS_OPTIONS.iter())
                .any(|spec| spec.name == name.as_str())
        })
        .cloned()
        .collect();

    out
}

fn classify_into(out: &mut Normalized, raw: &BTreeMap<String, Yaml>, spec: &OptionSpec) {
    match ConfigOption::classify(raw.get(spec.name), spec.kind) {
        ConfigOption::Absent => {}
        ConfigOption::Valid(value) => out.config.insert(spec.key, value),
        ConfigOption::Invalid { reason } => out.excluded.push(Excluded {
            name: spec.name.to_string(),
            reason,
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
