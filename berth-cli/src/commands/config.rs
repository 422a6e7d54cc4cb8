//! `berth config`: reconcile the daemon config file.

use anyhow::Result;
use clap::Args;
use serde_yaml::Value as Yaml;

use berth_core::{ConfigState, DaemonConfigSpec, LogDriver, Outcome};
use berth_daemon::verify_log_driver;
use berth_sync::{diff::DEFAULT_WIDTH, reconcile_daemon_config, RunOptions};

use crate::GlobalArgs;

/// Flags shared by the config-writing subcommands.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Report what would change without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Show a side-by-side diff when the config changes.
    #[arg(long)]
    pub diff: bool,

    /// Total width of a diff row.
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    pub width: usize,
}

impl RunArgs {
    pub fn options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.dry_run,
            diff: self.diff,
            diff_width: self.width,
        }
    }
}

/// Arguments for `berth config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub run: RunArgs,
}

impl ConfigArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<Outcome> {
        let desired = global.load_desired()?;
        let Some(spec) = desired.daemon else {
            return Ok(Outcome::unchanged("no daemon config declared"));
        };

        if let Some(failure) = check_log_driver(&spec, global) {
            return Ok(failure);
        }
        Ok(reconcile_daemon_config(&spec, &self.run.options()))
    }
}

/// Ask the daemon about a plugin log driver when verification is requested.
///
/// Malformed driver strings are left to the pipeline, which rejects them.
fn check_log_driver(spec: &DaemonConfigSpec, global: &GlobalArgs) -> Option<Outcome> {
    if !spec.verify_log_driver || spec.state == ConfigState::Absent {
        return None;
    }
    let raw = spec.options.get("log_driver").and_then(Yaml::as_str)?;
    let driver = LogDriver::parse(raw).ok().filter(LogDriver::is_plugin)?;

    tracing::debug!(driver = %driver, "verifying log driver plugin");
    verify_log_driver(&global.client(), &driver)
        .err()
        .map(|err| Outcome::failure(err.to_string()))
}
