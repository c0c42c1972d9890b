use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use daylock_core::Vault;

#[derive(ClapArgs)]
pub struct Args {
    /// Portable backup file produced by `daylock export`
    pub input: PathBuf,
}

#[instrument(level = "info", name = "cmd::restore", skip_all, fields(input = %args.input.display()))]
pub fn execute(vault: &Vault, args: &Args) -> Result<()> {
    let backup =
        fs::read(&args.input).with_context(|| format!("failed to read {}", args.input.display()))?;
    let locked_at = vault.restore(&backup)?;
    println!("Restored sealed journal (locked at {})", locked_at.to_rfc3339());
    Ok(())
}
