#![deny(unsafe_code)]

mod commands;
mod config;

use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use daylock_core::{FileStore, Vault};

use crate::commands::{cat, export, init, lock, restore, save, status, unlock};

/// Command-line interface for a date-sealed journal vault
#[derive(Parser)]
#[command(name = "daylock")]
#[command(author, version)]
#[command(propagate_version = true)]
#[command(after_help = "EXAMPLES:
    # Initialize a vault that seals itself on New Year's Day
    daylock init --lock-date 2027-01-01T00:00:00Z --auto-passphrase \"shared secret\"

    # Write today's entry
    echo \"dear diary\" | daylock save

    # Seal it now (pipe passphrase from a secret manager)
    echo \"$SECRET\" | daylock --password-stdin lock

    # Reopen it
    daylock unlock

    # Offline backup of the sealed journal
    daylock export backup.json
")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Vault directory
    #[arg(long, env = "DAYLOCK_DIR", default_value = ".", global = true)]
    dir: PathBuf,

    /// Vault passphrase (insecure, prefer --password-stdin or DAYLOCK_PASSWORD)
    #[arg(long, env = "DAYLOCK_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Read passphrase from stdin (single line)
    #[arg(long, conflicts_with = "password", global = true)]
    password_stdin: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a vault directory with a lock policy
    Init(init::Args),

    /// Show whether the vault is open or locked
    Status,

    /// Print the current draft
    Cat,

    /// Save draft text from a file or stdin
    Save(save::Args),

    /// Seal the journal with a passphrase
    Lock,

    /// Open the sealed journal with a passphrase
    Unlock(unlock::Args),

    /// Write the sealed record to a portable backup file
    Export(export::Args),

    /// Restore the sealed record from a portable backup file
    Restore(restore::Args),
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Open the vault at `cli.dir`, running bootstrap (including a due
/// auto-lock) as a side effect.
fn open_vault(cli: &Cli) -> Result<Vault> {
    let policy = config::load(&cli.dir)?;
    let store = FileStore::open(cli.dir.join(config::STATE_FILE))
        .with_context(|| format!("failed to open vault state in {}", cli.dir.display()))?;
    Vault::open(Box::new(store), &policy).context("vault bootstrap failed")
}

/// Resolve the passphrase for lock/unlock: flag, env, stdin, or prompt.
fn resolve_passphrase(cli: &Cli, confirm: bool) -> Result<String> {
    if let Some(password) = &cli.password {
        return Ok(password.clone());
    }
    if cli.password_stdin {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("failed to read passphrase from stdin")?;
        return Ok(line.trim_end_matches(['\r', '\n']).to_string());
    }
    if !io::stdin().is_terminal() {
        bail!("no passphrase: stdin is not a terminal, use --password-stdin or DAYLOCK_PASSWORD");
    }

    let passphrase = rpassword::prompt_password("Passphrase: ")?;
    if confirm {
        let again = rpassword::prompt_password("Confirm passphrase: ")?;
        if passphrase != again {
            bail!("passphrases do not match");
        }
    }
    Ok(passphrase)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Init(args) => init::execute(&cli.dir, args),
        Commands::Status => status::execute(&open_vault(&cli)?),
        Commands::Cat => cat::execute(&open_vault(&cli)?),
        Commands::Save(args) => save::execute(&open_vault(&cli)?, args),
        Commands::Lock => {
            let vault = open_vault(&cli)?;
            let passphrase = resolve_passphrase(&cli, true)?;
            lock::execute(&vault, &passphrase)
        }
        Commands::Unlock(args) => {
            let vault = open_vault(&cli)?;
            let passphrase = resolve_passphrase(&cli, false)?;
            unlock::execute(&vault, &passphrase, args)
        }
        Commands::Export(args) => export::execute(&open_vault(&cli)?, args),
        Commands::Restore(args) => restore::execute(&open_vault(&cli)?, args),
    }
}
