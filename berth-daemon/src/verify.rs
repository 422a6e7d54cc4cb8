//! Plugin-backed log-driver verification.

use berth_core::LogDriver;

use crate::client::DaemonClient;
use crate::error::DaemonError;

/// Check that a plugin log driver is installed and enabled.
///
/// Built-in drivers always pass without contacting the daemon.
pub fn verify_log_driver<C: DaemonClient>(client: &C, driver: &LogDriver) -> Result<(), DaemonError> {
    let LogDriver::Plugin { .. } = driver else {
        return Ok(());
    };

    client.ping().map_err(|err| match err {
        err @ DaemonError::Unavailable { .. } => err,
        other => DaemonError::Unavailable {
            reason: other.to_string(),
        },
    })?;

    let wanted = driver.to_string();
    let found = client
        .list_plugins()?
        .into_iter()
        .any(|p| p.enabled && p.name == wanted);
    if found {
        tracing::debug!(driver = %wanted, "log driver plugin verified");
        Ok(())
    } else {
        Err(DaemonError::LogDriverMissing { driver: wanted })
    }
}
