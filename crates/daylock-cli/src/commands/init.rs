use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::config;

#[derive(ClapArgs)]
pub struct Args {
    /// Instant (RFC 3339) after which the journal seals itself at startup
    #[arg(long, value_name = "WHEN")]
    pub lock_date: DateTime<Utc>,

    /// Passphrase the automatic calendar lock seals with
    #[arg(long, value_name = "PASSPHRASE")]
    pub auto_passphrase: String,
}

#[instrument(level = "info", name = "cmd::init", skip_all, fields(dir = %dir.display()))]
pub fn execute(dir: &Path, args: &Args) -> Result<()> {
    config::create(dir, args.lock_date, &args.auto_passphrase)?;
    println!(
        "Initialized vault in {} (seals automatically after {})",
        dir.display(),
        args.lock_date.to_rfc3339()
    );
    Ok(())
}
