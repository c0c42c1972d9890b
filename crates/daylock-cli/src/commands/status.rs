use anyhow::Result;

use daylock_core::{Vault, VaultState};

pub fn execute(vault: &Vault) -> Result<()> {
    match vault.state() {
        VaultState::Open {
            content,
            last_updated,
        } => {
            println!("open");
            println!("  last updated: {}", last_updated.to_rfc3339());
            println!("  draft length: {} chars", content.chars().count());
        }
        VaultState::Locked { locked_at } => {
            println!("locked");
            println!("  locked at: {}", locked_at.to_rfc3339());
        }
        VaultState::Loading => unreachable!("bootstrap completed before dispatch"),
    }
    Ok(())
}
