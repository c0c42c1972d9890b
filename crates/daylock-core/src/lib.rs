//! Date-sealed journal vault.
//!
//! A single journal document is either open (a plaintext draft record) or
//! locked (one AES-256-GCM sealed record, key derived from a passphrase via
//! PBKDF2). Transitions between the two are atomic with respect to both
//! persisted records, and a configured calendar date seals the journal
//! automatically at the next startup.

pub mod crypto;
pub mod store;
pub mod vault;

// Re-export commonly used types at crate root
pub use store::{FileStore, MemoryStore, RecordStore};
pub use vault::{LockPolicy, Vault, VaultError, VaultState};
