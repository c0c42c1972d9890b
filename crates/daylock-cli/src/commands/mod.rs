//! Subcommand implementations.

pub mod cat;
pub mod export;
pub mod init;
pub mod lock;
pub mod restore;
pub mod save;
pub mod status;
pub mod unlock;
