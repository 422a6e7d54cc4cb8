//! `berth plugins`: table of plugins installed on the daemon.

use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

use berth_core::Outcome;
use berth_daemon::{DaemonClient, PluginInfo};

use crate::GlobalArgs;

#[derive(Tabled)]
struct PluginRow {
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "version")]
    version: String,
    #[tabled(rename = "enabled")]
    enabled: bool,
    #[tabled(rename = "id")]
    id: String,
}

impl From<&PluginInfo> for PluginRow {
    fn from(info: &PluginInfo) -> Self {
        let (name, version) = info.split_name();
        Self {
            name: name.to_string(),
            version: version.to_string(),
            enabled: info.enabled,
            id: info.id.chars().take(12).collect(),
        }
    }
}

pub fn run(global: &GlobalArgs) -> Result<Outcome> {
    let client = global.client();
    let plugins = match client.ping().and_then(|()| client.list_plugins()) {
        Ok(plugins) => plugins,
        Err(err) if err.is_unavailable() => return Ok(Outcome::failure(err.to_string())),
        Err(err) => return Ok(Outcome::failure(format!("could not list plugins: {err}"))),
    };

    if !global.json && !plugins.is_empty() {
        let mut table = Table::new(plugins.iter().map(PluginRow::from));
        table.with(Style::rounded());
        println!("{table}");
    }

    let data = serde_json::to_value(&plugins)?;
    Ok(Outcome::unchanged(format!("{} plugin(s) installed", plugins.len())).with_data(data))
}
