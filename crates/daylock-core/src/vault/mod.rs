//! Vault lifecycle: records, bootstrap, and the state machine.

pub mod bootstrap;
pub mod machine;
pub mod records;

pub use bootstrap::LockPolicy;
pub use machine::{Vault, VaultError, VaultState};
pub use records::{DraftRecord, SealedRecord};
