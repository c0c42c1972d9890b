//! Durable record store: two single-record slots with atomic multi-slot
//! commit.
//!
//! The store is the only persistence boundary in the crate. It knows nothing
//! about drafts or sealed blobs; it holds at most one raw JSON record per
//! [`Slot`] and guarantees that a [`RecordStore::commit`] batch applies
//! entirely or not at all. Typed validation of records happens above, at the
//! vault boundary, so a malformed payload surfaces there as data to recover
//! from rather than as a parse panic here.
//!
//! Two implementations ship: [`FileStore`] for real persistence and
//! [`MemoryStore`] for tests (including injected commit failures).

pub mod file;
pub mod memory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// A record as the store sees it: parsed JSON, not yet validated.
pub type RawRecord = serde_json::Value;

/// The two record slots. Each holds at most one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// The plaintext draft, present only while the vault is open.
    Draft,
    /// The encrypted blob, present only while the vault is locked.
    Sealed,
}

/// One operation in an atomic commit batch.
#[derive(Debug, Clone)]
pub enum StoreOp {
    Put(Slot, RawRecord),
    Delete(Slot),
}

/// Errors from the record store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted state document could not be parsed at all.
    ///
    /// Distinct from a malformed individual record: this means the store's
    /// own container is unreadable, which is fatal at open time.
    #[error("storage state is unreadable: {0}")]
    Unreadable(#[from] serde_json::Error),

    /// An atomic commit could not be applied; the prior state is unchanged.
    #[error("atomic commit failed: {0}")]
    CommitFailed(String),
}

/// Capability interface for the two-slot record store.
///
/// `get`/`put`/`delete` are each independently durable once they return.
/// `commit` applies an ordered batch all-or-nothing, which is what lets a
/// lock or unlock transition write one record and delete the other as a
/// single unit.
pub trait RecordStore: Send {
    fn get(&self, slot: Slot) -> Result<Option<RawRecord>, StoreError>;

    fn put(&mut self, slot: Slot, record: RawRecord) -> Result<(), StoreError>;

    fn delete(&mut self, slot: Slot) -> Result<(), StoreError>;

    /// Apply `batch` in order, atomically. On error the store's observable
    /// state is exactly what it was before the call.
    fn commit(&mut self, batch: &[StoreOp]) -> Result<(), StoreError>;
}
