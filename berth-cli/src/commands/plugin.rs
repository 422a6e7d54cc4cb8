//! `berth plugin`: reconcile declared plugins against the running daemon.

use anyhow::{bail, Result};
use clap::Args;

use berth_core::Outcome;
use berth_daemon::PluginReconciler;

use crate::GlobalArgs;

/// Arguments for `berth plugin`.
#[derive(Args, Debug)]
pub struct PluginArgs {
    /// Only reconcile the plugin with this alias.
    pub alias: Option<String>,
}

impl PluginArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<Outcome> {
        let mut plugins = global.load_desired()?.plugins;
        if let Some(alias) = &self.alias {
            plugins.retain(|p| &p.alias == alias);
            if plugins.is_empty() {
                bail!("no plugin with alias '{alias}' in {}", global.file.display());
            }
        }
        if plugins.is_empty() {
            return Ok(Outcome::unchanged("no plugins declared"));
        }

        let reconciler = PluginReconciler::new(global.client(), &global.cache_dir);
        let mut changed = false;
        let mut failed = false;
        let mut lines = Vec::with_capacity(plugins.len());
        let mut entries = Vec::with_capacity(plugins.len());
        for spec in &plugins {
            let outcome = reconciler.reconcile(spec);
            changed |= outcome.changed;
            failed |= outcome.failed;
            lines.push(format!("{}: {}", spec.alias, outcome.msg));
            entries.push(serde_json::json!({ "alias": spec.alias, "outcome": outcome }));
        }

        let mut outcome = Outcome::unchanged(lines.join("\n"));
        outcome.changed = changed;
        outcome.failed = failed;
        Ok(outcome.with_data(serde_json::Value::Array(entries)))
    }
}
