//! Desired-state loading: error messages and full-document parsing.

use assert_fs::prelude::*;
use berth_core::{
    auth::AuthPolicy,
    desired,
    types::{ConfigState, PluginState},
    CoreError,
};
use std::path::PathBuf;

const FULL: &str = r#"
daemon:
  dest: /srv/docker/daemon.json
  checksum: /srv/docker/.checksum
  options:
    log_driver: loki:2.9.1
    log_level: warn
    dns: [1.1.1.1, 9.9.9.9]
  verify_log_driver: true
clients:
  - location: ~/.docker/config.json
    auth_policy: lenient
    auths:
      registry.gitlab.com:
        auth: amVua2luczpydWJiZWw=
      ghcr.io:
        username: octo
        password: hunter2
    formats:
      ps: [".ID", ".Names", ".Status"]
  - location: /root/.docker/config.json
    state: absent
plugins:
  - source: grafana/loki-docker-driver
    alias: loki
    version: 2.9.1
  - source: vieux/sshfs
    alias: sshfs
    state: test
"#;

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_file_returns_not_found() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.path().join("desired.yaml");
    let err = desired::load_at(&path).unwrap_err();
    assert!(matches!(err, CoreError::DesiredStateNotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("desired.yaml"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("desired.yaml");
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = desired::load_at(file.path()).unwrap_err();
    assert!(matches!(err, CoreError::Parse { .. }), "got: {err}");
    let msg = err.to_string();
    assert!(msg.contains("desired.yaml"), "must contain file path, got: {msg}");
}

#[test]
fn load_wrong_plugin_state_is_a_parse_error() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("desired.yaml");
    file.write_str("plugins:\n  - source: a/b\n    alias: b\n    state: sometimes\n")
        .expect("write");

    let err = desired::load_at(file.path()).unwrap_err();
    assert!(matches!(err, CoreError::Parse { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Full document
// ---------------------------------------------------------------------------

#[test]
fn full_document_parses() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("desired.yaml");
    file.write_str(FULL).expect("write");

    let state = desired::load_at(file.path()).expect("load");

    let daemon = state.daemon.expect("daemon section");
    assert_eq!(daemon.dest, PathBuf::from("/srv/docker/daemon.json"));
    assert!(daemon.verify_log_driver);
    assert_eq!(daemon.options.len(), 3);

    assert_eq!(state.clients.len(), 2);
    let first = &state.clients[0];
    assert_eq!(first.auth_policy, AuthPolicy::Lenient);
    assert!(first.enabled);
    let auths = first.auths().expect("auths");
    assert_eq!(auths.len(), 2);
    assert_eq!(auths["ghcr.io"].username.as_deref(), Some("octo"));
    assert_eq!(first.formats().expect("formats")["ps"].len(), 3);
    assert_eq!(state.clients[1].state, ConfigState::Absent);
    assert_eq!(state.clients[1].auth_policy, AuthPolicy::Strict);

    assert_eq!(state.plugins.len(), 2);
    assert_eq!(state.plugins[0].remote_ref(), "grafana/loki-docker-driver:2.9.1");
    assert_eq!(state.plugins[0].local_ref(), "loki:2.9.1");
    assert_eq!(state.plugins[1].state, PluginState::Test);
    assert_eq!(state.plugins[1].version, "latest");
}

#[test]
fn empty_document_is_valid() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("desired.yaml");
    file.write_str("{}\n").expect("write");

    let state = desired::load_at(file.path()).expect("load");
    assert!(state.daemon.is_none());
    assert!(state.clients.is_empty());
    assert!(state.plugins.is_empty());
}
