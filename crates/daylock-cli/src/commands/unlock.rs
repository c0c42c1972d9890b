use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use daylock_core::Vault;

#[derive(ClapArgs)]
pub struct Args {
    /// Give up if key derivation takes longer than this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Print the recovered draft to stdout after unlocking
    #[arg(long)]
    pub print: bool,
}

#[instrument(level = "info", name = "cmd::unlock", skip_all)]
pub fn execute(vault: &Vault, passphrase: &str, args: &Args) -> Result<()> {
    let content = match args.timeout {
        Some(secs) => vault.unlock_with_timeout(passphrase, Duration::from_secs(secs))?,
        None => vault.unlock(passphrase)?,
    };

    if args.print {
        io::stdout().write_all(content.as_bytes())?;
    } else {
        eprintln!("Unlocked ({} chars recovered)", content.chars().count());
    }
    Ok(())
}
