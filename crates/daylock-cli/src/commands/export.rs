use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use daylock_core::Vault;

#[derive(ClapArgs)]
pub struct Args {
    /// Destination for the portable backup file
    pub output: PathBuf,
}

#[instrument(level = "info", name = "cmd::export", skip_all, fields(output = %args.output.display()))]
pub fn execute(vault: &Vault, args: &Args) -> Result<()> {
    let backup = vault.export()?;
    fs::write(&args.output, &backup)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    println!("Exported sealed journal to {}", args.output.display());
    Ok(())
}
