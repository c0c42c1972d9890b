//! Vault directory configuration.
//!
//! A vault directory holds two files: `daylock.toml` (the lock policy) and
//! `daylock.json` (the record store). The auto-lock passphrase lives in the
//! config file on purpose: it is an injected configuration value, and
//! whoever can read the vault directory is inside the threat model anyway
//! (casual access, not a hostile local attacker).

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use daylock_core::LockPolicy;

/// Lock policy file inside the vault directory.
pub const CONFIG_FILE: &str = "daylock.toml";
/// Record store file inside the vault directory.
pub const STATE_FILE: &str = "daylock.json";

#[derive(Debug, Serialize, Deserialize)]
struct ConfigFile {
    /// RFC 3339 instant after which bootstrap seals the journal.
    lock_date: String,
    /// Passphrase used by the automatic calendar lock.
    auto_passphrase: String,
}

/// Load the lock policy from `dir`.
pub fn load(dir: &Path) -> Result<LockPolicy> {
    let path = dir.join(CONFIG_FILE);
    let contents = fs::read_to_string(&path).with_context(|| {
        format!(
            "no vault at {} (missing {CONFIG_FILE}, run `daylock init` first)",
            dir.display()
        )
    })?;
    let config: ConfigFile =
        toml::from_str(&contents).with_context(|| format!("invalid config {}", path.display()))?;

    let lock_date = config
        .lock_date
        .parse::<DateTime<Utc>>()
        .with_context(|| format!("invalid lock_date {:?} in {}", config.lock_date, path.display()))?;

    Ok(LockPolicy::new(
        lock_date,
        SecretString::from(config.auto_passphrase),
    ))
}

/// Write a fresh lock policy into `dir`, refusing to overwrite one.
pub fn create(dir: &Path, lock_date: DateTime<Utc>, auto_passphrase: &str) -> Result<()> {
    let path = dir.join(CONFIG_FILE);
    if path.exists() {
        bail!("vault already initialized at {}", dir.display());
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create vault directory {}", dir.display()))?;

    let config = ConfigFile {
        lock_date: lock_date.to_rfc3339(),
        auto_passphrase: auto_passphrase.to_string(),
    };
    let contents = toml::to_string_pretty(&config).context("failed to serialize config")?;
    fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
