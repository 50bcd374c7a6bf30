//! Developer CLI for Bridgekit.
//!
//! Checks destinations against the navigation security lists and manages the
//! site permissions a wallet host has persisted.

mod inspect;
mod permissions;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::{eyre, Result};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "bridgekit", version, about)]
struct Cli {
    /// Directory holding the persisted bridge state.
    #[arg(long, env = "BRIDGEKIT_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Shows the warnings a destination URL would raise.
    Inspect(inspect::InspectArgs),
    /// Lists or revokes site connection grants.
    #[command(subcommand)]
    Permissions(permissions::PermissionsCommand),
}

fn main() -> Result<()> {
    // `RUST_LOG=bridgekit_core=debug` also surfaces the library's `log` records
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Inspect(args) => inspect::run(&args),
        Command::Permissions(command) => permissions::run(command, &data_dir(cli.data_dir)?),
    }
}

fn data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    explicit
        .or_else(|| dirs::data_dir().map(|dir| dir.join("bridgekit")))
        .ok_or_else(|| eyre!("no data directory on this platform, pass --data-dir"))
}
