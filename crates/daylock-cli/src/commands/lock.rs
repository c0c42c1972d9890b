use anyhow::Result;
use tracing::instrument;

use daylock_core::Vault;

#[instrument(level = "info", name = "cmd::lock", skip_all)]
pub fn execute(vault: &Vault, passphrase: &str) -> Result<()> {
    let locked_at = vault.lock(passphrase)?;
    println!("Locked at {}", locked_at.to_rfc3339());
    Ok(())
}
