//! `bridgekit permissions`

use std::path::Path;
use std::sync::Arc;

use bridgekit_core::storage::FileBlobStore;
use bridgekit_core::{Origin, SitePermissions};
use clap::Subcommand;
use eyre::{bail, Result, WrapErr};

/// Subcommands of `bridgekit permissions`.
#[derive(Debug, Subcommand)]
pub enum PermissionsCommand {
    /// Lists the origins allowed to read the wallet address.
    List {
        /// Prints the origins as a JSON array.
        #[arg(long)]
        json: bool,
    },
    /// Revokes the grant of one origin. A full page URL is accepted.
    Revoke {
        /// Origin or URL of the site.
        origin: String,
    },
}

/// Runs `command` against the permission table stored under `data_dir`.
pub fn run(command: PermissionsCommand, data_dir: &Path) -> Result<()> {
    let store = FileBlobStore::open(data_dir)
        .wrap_err_with(|| format!("failed to open {}", data_dir.display()))?;
    let permissions = SitePermissions::load(Arc::new(store))?;

    match command {
        PermissionsCommand::List { json } => {
            let origins = permissions.granted_origins();
            if json {
                println!("{}", serde_json::to_string_pretty(&origins)?);
            } else if origins.is_empty() {
                println!("no site has been granted access");
            } else {
                for origin in origins {
                    println!("{origin}");
                }
            }
        }
        PermissionsCommand::Revoke { origin } => {
            let origin = Origin::resolve(&origin);
            if !permissions.revoke(origin.as_str())? {
                bail!("{origin} has no grant");
            }
            tracing::info!(%origin, "revoked site permission");
            println!("revoked {origin}");
        }
    }
    Ok(())
}
