//! In-memory record store for tests.
//!
//! Same contract as [`FileStore`](super::FileStore), nothing persisted.
//! Commit batches can be made to fail mid-batch with [`MemoryStore::fail_after`]
//! so tests can check that a failed commit leaves no trace.

use std::collections::BTreeMap;

use super::{RawRecord, RecordStore, Slot, StoreError, StoreOp};

/// Volatile two-slot store with commit fault injection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: BTreeMap<Slot, RawRecord>,
    /// When set, the next commit fails after applying this many operations
    /// (to a scratch copy; the visible state never changes).
    fail_after: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `commit` fail after `n` operations of the batch.
    ///
    /// The injected failure is one-shot: it clears once it fires.
    pub fn fail_after(&mut self, n: usize) {
        self.fail_after = Some(n);
    }

    /// Number of records currently held (0, 1, or 2).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, slot: Slot) -> Result<Option<RawRecord>, StoreError> {
        Ok(self.slots.get(&slot).cloned())
    }

    fn put(&mut self, slot: Slot, record: RawRecord) -> Result<(), StoreError> {
        self.slots.insert(slot, record);
        Ok(())
    }

    fn delete(&mut self, slot: Slot) -> Result<(), StoreError> {
        self.slots.remove(&slot);
        Ok(())
    }

    fn commit(&mut self, batch: &[StoreOp]) -> Result<(), StoreError> {
        let mut scratch = self.slots.clone();
        for (applied, op) in batch.iter().enumerate() {
            if self.fail_after.is_some_and(|n| applied >= n) {
                self.fail_after = None;
                return Err(StoreError::CommitFailed(format!(
                    "injected failure after {applied} of {} operations",
                    batch.len()
                )));
            }
            match op {
                StoreOp::Put(slot, record) => {
                    scratch.insert(*slot, record.clone());
                }
                StoreOp::Delete(slot) => {
                    scratch.remove(slot);
                }
            }
        }
        self.slots = scratch;
        Ok(())
    }
}
