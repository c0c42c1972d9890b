//! File-backed record store.
//!
//! Both slots live in a single JSON state document. Every mutation
//! serializes the full document to a temporary file in the same directory,
//! fsyncs it, and renames it over the previous one. Rename is atomic on the
//! platforms we care about, so a multi-operation commit batch is applied
//! all-or-nothing for free: either the new document replaces the old one or
//! the old one survives untouched.
//!
//! With exactly two small records the rewrite cost is irrelevant; what the
//! journal needs is that a crash mid-lock never leaves it with half a
//! transition on disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{RawRecord, RecordStore, Slot, StoreError, StoreOp};

/// The persisted shape of the whole store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StateDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    draft: Option<RawRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sealed: Option<RawRecord>,
}

impl StateDoc {
    fn slot(&self, slot: Slot) -> &Option<RawRecord> {
        match slot {
            Slot::Draft => &self.draft,
            Slot::Sealed => &self.sealed,
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Option<RawRecord> {
        match slot {
            Slot::Draft => &mut self.draft,
            Slot::Sealed => &mut self.sealed,
        }
    }

    fn apply(&mut self, op: &StoreOp) {
        match op {
            StoreOp::Put(slot, record) => *self.slot_mut(*slot) = Some(record.clone()),
            StoreOp::Delete(slot) => *self.slot_mut(*slot) = None,
        }
    }
}

/// Durable two-slot store backed by one JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    doc: StateDoc,
}

impl FileStore {
    /// Open (or create) a store at `path`.
    ///
    /// A missing file is an empty store. An unparseable file is
    /// `StoreError::Unreadable`: the container itself is gone, which is not
    /// a condition the vault can recover a record from.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let doc = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no state file, starting empty");
                StateDoc::default()
            }
            Err(e) => return Err(StoreError::Io(e)),
        };
        Ok(Self { path, doc })
    }

    /// Path of the backing state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `doc` to disk atomically, then adopt it as the current state.
    ///
    /// The in-memory state only changes after the rename succeeds, so a
    /// failed persist leaves both disk and memory at the prior state.
    fn persist(&mut self, doc: StateDoc) -> Result<(), StoreError> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &doc)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::Io(e.error))?;
        trace!(path = %self.path.display(), "state file replaced");
        self.doc = doc;
        Ok(())
    }
}

impl RecordStore for FileStore {
    fn get(&self, slot: Slot) -> Result<Option<RawRecord>, StoreError> {
        Ok(self.doc.slot(slot).clone())
    }

    fn put(&mut self, slot: Slot, record: RawRecord) -> Result<(), StoreError> {
        let mut doc = self.doc.clone();
        *doc.slot_mut(slot) = Some(record);
        self.persist(doc)
    }

    fn delete(&mut self, slot: Slot) -> Result<(), StoreError> {
        let mut doc = self.doc.clone();
        *doc.slot_mut(slot) = None;
        self.persist(doc)
    }

    fn commit(&mut self, batch: &[StoreOp]) -> Result<(), StoreError> {
        let mut doc = self.doc.clone();
        for op in batch {
            doc.apply(op);
        }
        self.persist(doc)
            .map_err(|e| StoreError::CommitFailed(e.to_string()))
    }
}
