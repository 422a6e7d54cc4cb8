//! Config reconciliation pipelines shared by every caller.
//!
//! Each entrypoint returns an [`Outcome`]; internal errors are folded into
//! a failed outcome at this boundary and never escape as panics.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{json, Map, Value};

use berth_core::{
    auth::{self, AuthEntry, AuthPolicy},
    formats,
    paths, CanonicalConfig, ClientConfigSpec, ConfigState, DaemonConfigSpec, LogDriver, Outcome,
};

use crate::detector;
use crate::diff::{self, DEFAULT_WIDTH};
use crate::error::SyncError;
use crate::writer::{self, WriteResult};

/// Title of the candidate column in a diff.
const CANDIDATE_TITLE: &str = "candidate";

/// Per-run switches shared by every pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Compute the outcome without touching the filesystem.
    pub dry_run: bool,
    /// Attach a side-by-side diff when the config changes.
    pub diff: bool,
    /// Total width of a diff row.
    pub diff_width: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            diff: false,
            diff_width: DEFAULT_WIDTH,
        }
    }
}

// ---------------------------------------------------------------------------
// Daemon config
// ---------------------------------------------------------------------------

/// Reconcile `daemon.json` with its desired options.
pub fn reconcile_daemon_config(spec: &DaemonConfigSpec, opts: &RunOptions) -> Outcome {
    try_daemon_config(spec, opts).unwrap_or_else(|err| {
        tracing::error!("daemon config: {err}");
        Outcome::failure(err.to_string())
    })
}

fn try_daemon_config(spec: &DaemonConfigSpec, opts: &RunOptions) -> Result<Outcome, SyncError> {
    if spec.state == ConfigState::Absent {
        return remove(&spec.dest, &spec.checksum, opts, "daemon config");
    }

    let config = build_daemon_config(&spec.options)?;
    let rendered = config.render()?;
    let applied = apply(&spec.dest, &spec.checksum, &rendered, opts)?;
    Ok(applied.into_outcome("daemon config"))
}

/// Normalize daemon options and check the log driver reference.
///
/// Excluded and unknown options are logged; a malformed log driver fails.
pub fn build_daemon_config(
    options: &BTreeMap<String, serde_yaml::Value>,
) -> Result<CanonicalConfig, SyncError> {
    let normalized = berth_core::normalize(options);
    for excluded in &normalized.excluded {
        tracing::warn!("option '{}' not applied: {}", excluded.name, excluded.reason);
    }
    for name in &normalized.unknown {
        tracing::warn!("unknown option '{name}' ignored");
    }

    if let Some(driver) = normalized.config.get("log-driver").and_then(Value::as_str) {
        LogDriver::parse(driver)?;
    }
    Ok(normalized.config)
}

// ---------------------------------------------------------------------------
// Client config
// ---------------------------------------------------------------------------

/// Reconcile one client `config.json`.
pub fn reconcile_client_config(spec: &ClientConfigSpec, opts: &RunOptions) -> Outcome {
    try_client_config(spec, opts).unwrap_or_else(|err| {
        tracing::error!("client config: {err}");
        Outcome::failure(err.to_string())
    })
}

fn try_client_config(spec: &ClientConfigSpec, opts: &RunOptions) -> Result<Outcome, SyncError> {
    let Some(location) = &spec.location else {
        return Err(SyncError::MissingLocation);
    };
    let location = paths::expand_home(location)?;
    let digest_path = paths::expand_home(&spec.checksum_path(&location))?;

    if spec.state == ConfigState::Absent {
        return remove(&location, &digest_path, opts, "client config");
    }

    if !spec.enabled {
        let mut msg = "client config creation is deactivated".to_string();
        if location.exists() {
            msg.push_str(&format!(
                "; {} exists, set state to absent to remove it",
                location.display()
            ));
        }
        return Ok(Outcome::unchanged(msg));
    }

    let auths = spec.auths()?;
    let formats = spec.formats()?;
    let built = build_client_config(&auths, &formats, spec.auth_policy)?;
    let rendered = built.config.render()?;
    let applied = apply(&location, &digest_path, &rendered, opts)?;

    let mut outcome = applied.into_outcome("client config");
    if !built.dropped.is_empty() {
        outcome.msg.push_str(&format!(
            " (dropped invalid auths: {})",
            built.dropped.join("; ")
        ));
    }
    Ok(outcome)
}

/// A built client config plus the auth hosts left out under the lenient policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientBuild {
    pub config: CanonicalConfig,
    pub dropped: Vec<String>,
}

/// Assemble `{"auths": ..., "<category>Format": ...}` for a client.
pub fn build_client_config(
    auths: &BTreeMap<String, AuthEntry>,
    formats: &BTreeMap<String, Vec<String>>,
    policy: AuthPolicy,
) -> Result<ClientBuild, SyncError> {
    let report = auth::encode_auths(auths);
    let mut dropped = Vec::new();
    if report.has_invalid() {
        match policy {
            AuthPolicy::Strict => return Err(SyncError::InvalidAuth(report.invalid_summary())),
            AuthPolicy::Lenient => {
                for invalid in &report.invalid {
                    tracing::warn!("auth for '{}' dropped: {}", invalid.host, invalid.reason);
                    dropped.push(format!("{}: {}", invalid.host, invalid.reason));
                }
            }
        }
    }

    let mut config = CanonicalConfig::new();
    if !auths.is_empty() {
        let entries: Map<String, Value> = report.auths.into_iter().collect();
        config.insert("auths", Value::Object(entries));
    }

    let built = formats::build_formats(formats);
    for name in &built.skipped {
        tracing::warn!("format '{name}' skipped: unknown category or no selectors");
    }
    let mut format_keys = CanonicalConfig::new();
    for (category, template) in built.formats {
        format_keys.insert(category.key(), template);
    }
    config.merge(format_keys);

    Ok(ClientBuild { config, dropped })
}

/// Reconcile every client entry and aggregate the results.
///
/// `changed` and `failed` are true when any entry is; the message lists
/// one `location: msg` line per entry.
pub fn reconcile_client_configs(specs: &[ClientConfigSpec], opts: &RunOptions) -> Outcome {
    let mut changed = false;
    let mut failed = false;
    let mut lines = Vec::with_capacity(specs.len());
    let mut diff_rows = Vec::new();
    let mut entries = Vec::with_capacity(specs.len());

    for spec in specs {
        let label = spec
            .location
            .as_ref()
            .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string());
        let outcome = reconcile_client_config(spec, opts);
        changed |= outcome.changed;
        failed |= outcome.failed;
        lines.push(format!("{label}: {}", outcome.msg));
        if let Some(rows) = &outcome.diff {
            diff_rows.extend(rows.iter().cloned());
        }
        entries.push(json!({ "location": label, "outcome": outcome }));
    }

    if specs.is_empty() {
        lines.push("no client configs declared".to_string());
    }

    let mut outcome = Outcome::unchanged(lines.join("\n"));
    outcome.changed = changed;
    outcome.failed = failed;
    if !diff_rows.is_empty() {
        outcome = outcome.with_diff(diff_rows);
    }
    outcome.with_data(Value::Array(entries))
}

// ---------------------------------------------------------------------------
// Shared steps
// ---------------------------------------------------------------------------

struct Applied {
    result: WriteResult,
    existed: bool,
    diff: Option<Vec<String>>,
}

impl Applied {
    fn into_outcome(self, what: &str) -> Outcome {
        let msg = match (&self.result, self.existed) {
            (WriteResult::Unchanged { .. }, _) => format!("{what} not changed"),
            (WriteResult::Written { path }, false) => format!("{what} created at {}", path.display()),
            (WriteResult::Written { path }, true) => format!("{what} changed at {}", path.display()),
            (WriteResult::WouldWrite { path }, false) => {
                format!("{what} would be created at {}", path.display())
            }
            (WriteResult::WouldWrite { path }, true) => {
                format!("{what} would be changed at {}", path.display())
            }
        };
        let mut outcome = if self.result.is_change() {
            Outcome::changed(msg)
        } else {
            Outcome::unchanged(msg)
        };
        if let Some(rows) = self.diff {
            outcome = outcome.with_diff(rows);
        }
        outcome
    }
}

fn apply(
    dest: &Path,
    digest_path: &Path,
    rendered: &str,
    opts: &RunOptions,
) -> Result<Applied, SyncError> {
    let existed = dest.exists();
    let decision = detector::decide(rendered, dest, digest_path, opts.dry_run)?;
    let diff = if opts.diff && decision.changed {
        Some(diff::diff_against_file(
            dest,
            rendered,
            opts.diff_width,
            CANDIDATE_TITLE,
        )?)
    } else {
        None
    };
    let result = writer::persist(dest, digest_path, rendered, &decision, opts.dry_run)?;
    Ok(Applied {
        result,
        existed,
        diff,
    })
}

fn remove(
    dest: &Path,
    digest_path: &Path,
    opts: &RunOptions,
    what: &str,
) -> Result<Outcome, SyncError> {
    if opts.dry_run {
        return Ok(if dest.exists() {
            Outcome::changed(format!("{what} would be removed from {}", dest.display()))
        } else {
            Outcome::unchanged(format!("{what} does not exist"))
        });
    }
    Ok(if writer::remove_config(dest, digest_path)? {
        Outcome::changed(format!("{what} removed from {}", dest.display()))
    } else {
        Outcome::unchanged(format!("{what} does not exist"))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_yaml::Value as Yaml;
    use tempfile::TempDir;

    use super::*;

    fn daemon_spec(dir: &Path, options: &[(&str, Yaml)]) -> DaemonConfigSpec {
        DaemonConfigSpec {
            dest: dir.join("daemon.json"),
            checksum: dir.join(".checksum"),
            options: options
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            ..DaemonConfigSpec::default()
        }
    }

    fn client_spec(dir: &Path, auths: &str) -> ClientConfigSpec {
        ClientConfigSpec {
            location: Some(dir.join("config.json")),
            auths: serde_yaml::from_str(auths).unwrap(),
            ..ClientConfigSpec::default()
        }
    }

    #[test]
    fn daemon_config_is_created_then_unchanged() {
        let tmp = TempDir::new().unwrap();
        let spec = daemon_spec(tmp.path(), &[("debug", Yaml::from(true))]);

        let first = reconcile_daemon_config(&spec, &RunOptions::default());
        assert!(first.changed && !first.failed, "{first:?}");
        assert!(first.msg.contains("created"));

        let second = reconcile_daemon_config(&spec, &RunOptions::default());
        assert!(!second.changed && !second.failed, "{second:?}");
        assert_eq!(
            fs::read_to_string(tmp.path().join("daemon.json")).unwrap(),
            "{\n  \"debug\": true\n}\n"
        );
    }

    #[test]
    fn malformed_plugin_log_driver_fails() {
        let tmp = TempDir::new().unwrap();
        let spec = daemon_spec(tmp.path(), &[("log_driver", Yaml::from("loki:"))]);
        let outcome = reconcile_daemon_config(&spec, &RunOptions::default());
        assert!(outcome.failed);
        assert!(!tmp.path().join("daemon.json").exists());
    }

    #[test]
    fn absent_daemon_config_is_removed() {
        let tmp = TempDir::new().unwrap();
        let mut spec = daemon_spec(tmp.path(), &[]);
        reconcile_daemon_config(&spec, &RunOptions::default());
        spec.state = ConfigState::Absent;

        let removed = reconcile_daemon_config(&spec, &RunOptions::default());
        assert!(removed.changed);
        assert!(!spec.dest.exists() && !spec.checksum.exists());

        let again = reconcile_daemon_config(&spec, &RunOptions::default());
        assert!(!again.changed && !again.failed);
    }

    #[test]
    fn diff_is_attached_only_on_change() {
        let tmp = TempDir::new().unwrap();
        let spec = daemon_spec(tmp.path(), &[("debug", Yaml::from(true))]);
        let opts = RunOptions {
            diff: true,
            diff_width: 60,
            ..RunOptions::default()
        };
        let first = reconcile_daemon_config(&spec, &opts);
        assert!(first.diff.is_some());
        let second = reconcile_daemon_config(&spec, &opts);
        assert!(second.diff.is_none());
    }

    #[test]
    fn client_without_location_fails() {
        let outcome = reconcile_client_config(&ClientConfigSpec::default(), &RunOptions::default());
        assert!(outcome.failed);
        assert!(outcome.msg.contains("no location has been configured"));
    }

    #[test]
    fn strict_policy_rejects_invalid_auth() {
        let tmp = TempDir::new().unwrap();
        let spec = client_spec(tmp.path(), "bad.tld: { username: u }\ngood.tld: { auth: eA== }");
        let outcome = reconcile_client_config(&spec, &RunOptions::default());
        assert!(outcome.failed);
        assert!(outcome.msg.contains("bad.tld"));
        assert!(!tmp.path().join("config.json").exists());
    }

    #[test]
    fn lenient_policy_drops_invalid_auth_with_notice() {
        let tmp = TempDir::new().unwrap();
        let mut spec = client_spec(tmp.path(), "bad.tld: { username: u }\ngood.tld: { auth: eA== }");
        spec.auth_policy = AuthPolicy::Lenient;
        let outcome = reconcile_client_config(&spec, &RunOptions::default());
        assert!(outcome.changed && !outcome.failed, "{outcome:?}");
        assert!(outcome.msg.contains("bad.tld"));

        let written = fs::read_to_string(tmp.path().join("config.json")).unwrap();
        let value: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["auths"]["good.tld"]["auth"], "eA==");
        assert!(value["auths"].get("bad.tld").is_none());
    }

    #[test]
    fn disabled_client_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let mut spec = client_spec(tmp.path(), "{}");
        spec.enabled = false;
        let outcome = reconcile_client_config(&spec, &RunOptions::default());
        assert!(!outcome.changed && !outcome.failed);
        assert!(!tmp.path().join("config.json").exists());
    }

    #[test]
    fn client_shape_error_names_the_field() {
        let tmp = TempDir::new().unwrap();
        let spec = client_spec(tmp.path(), "[one, two]");
        let outcome = reconcile_client_config(&spec, &RunOptions::default());
        assert!(outcome.failed);
        assert!(outcome.msg.contains("auths"));
    }

    #[test]
    fn aggregate_reports_each_location() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        let specs = vec![client_spec(&a, "{}"), client_spec(&b, "x: { password: p }")];
        let outcome = reconcile_client_configs(&specs, &RunOptions::default());
        assert!(outcome.changed);
        assert!(outcome.failed);
        assert_eq!(outcome.msg.lines().count(), 2);
        assert!(outcome.msg.lines().next().unwrap().contains("created"));
        assert_eq!(outcome.data.unwrap().as_array().unwrap().len(), 2);
    }
}
