//! Daemon version probe.

use serde_json::json;

use berth_core::Outcome;

use crate::client::DaemonClient;
use crate::plugins::unavailable_msg;

/// Report the daemon's engine and API versions.
pub fn probe_version<C: DaemonClient>(client: &C) -> Outcome {
    if let Err(err) = client.ping() {
        return Outcome::failure(unavailable_msg(&err));
    }
    match client.version() {
        Ok(info) => Outcome::unchanged(format!(
            "daemon version {} (API {})",
            info.version, info.api_version
        ))
        .with_data(json!({
            "api_version": info.api_version,
            "daemon_version": info.version,
        })),
        Err(err) => Outcome::failure(format!("could not read daemon version: {err}")),
    }
}
