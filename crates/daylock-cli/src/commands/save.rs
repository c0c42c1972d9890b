use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use daylock_core::Vault;

#[derive(ClapArgs)]
pub struct Args {
    /// Read the draft from this file instead of stdin
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

#[instrument(level = "info", name = "cmd::save", skip_all)]
pub fn execute(vault: &Vault, args: &Args) -> Result<()> {
    if !vault.state().is_open() {
        bail!("vault is locked, unlock it before saving");
    }

    let text = match &args.file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read draft from stdin")?;
            text
        }
    };

    vault.save(&text)?;
    eprintln!("Saved {} chars", text.chars().count());
    Ok(())
}
