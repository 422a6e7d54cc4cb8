//! berth: reconcile container-engine daemon config, client configs and plugins.
//!
//! # Usage
//!
//! ```text
//! berth config  [--dry-run] [--diff] [--width N]
//! berth client  [--dry-run] [--diff] [--width N] [--lenient-auth]
//! berth plugin  [<alias>]
//! berth plugins
//! berth version
//!
//! global: --file <desired.yaml> --socket <path> --cache-dir <dir> --json --verbose
//! ```

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use berth_core::{desired, paths, DesiredState};
use berth_daemon::paths::{DEFAULT_SOCKET, PLUGIN_CACHE_DIR};
use berth_daemon::SocketClient;
use commands::{client::ClientArgs, config::ConfigArgs, plugin::PluginArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "berth",
    version,
    about = "Reconcile container-engine daemon config, client configs and plugins",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Desired-state YAML file.
    #[arg(long, short = 'f', global = true, default_value = paths::DESIRED_STATE)]
    pub file: PathBuf,

    /// Daemon control socket.
    #[arg(long, global = true, default_value = DEFAULT_SOCKET)]
    pub socket: PathBuf,

    /// Directory for plugin descriptors.
    #[arg(long, global = true, default_value = PLUGIN_CACHE_DIR)]
    pub cache_dir: PathBuf,

    /// Emit the outcome as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging on stderr.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    pub fn load_desired(&self) -> Result<DesiredState> {
        desired::load_at(&self.file)
            .with_context(|| format!("failed to load desired state from {}", self.file.display()))
    }

    pub fn client(&self) -> SocketClient {
        SocketClient::new(&self.socket)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile the daemon config file.
    Config(ConfigArgs),

    /// Reconcile every client config file.
    Client(ClientArgs),

    /// Reconcile declared plugins against the running daemon.
    Plugin(PluginArgs),

    /// List plugins installed on the daemon.
    Plugins,

    /// Show daemon and API versions.
    Version,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let outcome = match cli.command {
        Commands::Config(args) => args.run(&cli.global)?,
        Commands::Client(args) => args.run(&cli.global)?,
        Commands::Plugin(args) => args.run(&cli.global)?,
        Commands::Plugins => commands::plugins::run(&cli.global)?,
        Commands::Version => commands::version::run(&cli.global),
    };

    output::print_outcome(&outcome, cli.global.json)?;
    if outcome.failed {
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
