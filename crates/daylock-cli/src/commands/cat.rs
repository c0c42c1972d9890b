use std::io::{self, Write};

use anyhow::{bail, Result};

use daylock_core::{Vault, VaultState};

pub fn execute(vault: &Vault) -> Result<()> {
    match vault.state() {
        VaultState::Open { content, .. } => {
            io::stdout().write_all(content.as_bytes())?;
            Ok(())
        }
        _ => bail!("vault is locked, unlock it first"),
    }
}
