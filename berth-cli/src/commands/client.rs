//! `berth client`: reconcile every client config file.

use anyhow::Result;
use clap::Args;

use berth_core::{AuthPolicy, Outcome};
use berth_sync::reconcile_client_configs;

use crate::commands::config::RunArgs;
use crate::GlobalArgs;

/// Arguments for `berth client`.
#[derive(Args, Debug)]
pub struct ClientArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Drop invalid registry auths with a warning instead of failing.
    #[arg(long)]
    pub lenient_auth: bool,
}

impl ClientArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<Outcome> {
        let mut clients = global.load_desired()?.clients;
        if self.lenient_auth {
            for client in &mut clients {
                client.auth_policy = AuthPolicy::Lenient;
            }
        }
        Ok(reconcile_client_configs(&clients, &self.run.options()))
    }
}
