//! The vault lifecycle state machine.
//!
//! Three states: `Loading` (transient, bootstrap only), `Open` (plaintext
//! draft on disk), `Locked` (sealed blob on disk). The only way state moves
//! between `Open` and `Locked` is an atomic commit that writes one record
//! and deletes the other, so at most one of the two exists at any point a
//! caller can observe.
//!
//! A single mutex serializes every transition's read → transform → commit
//! sequence. Saves go through the same mutex: a lock must encrypt a draft
//! that is not being overwritten underneath it, and two racing unlocks must
//! not both "win". Key derivation is CPU-bound and runs inside the critical
//! section by design; [`Vault::unlock_with_timeout`] lets a caller bound the
//! wait without ever leaving a partial write behind.

use std::sync::{mpsc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::crypto::{self, CryptoError};
use crate::store::{RecordStore, Slot, StoreError, StoreOp};

use super::bootstrap::{self, LockPolicy};
use super::records::{DraftRecord, SealedRecord};

/// Errors from vault transitions.
///
/// Every variant leaves the vault in a well-defined state: the only mutation
/// point in any transition is the atomic commit, so a failed transition
/// means nothing moved.
#[derive(Error, Debug)]
pub enum VaultError {
    /// The requested transition needs the vault to be open.
    #[error("vault is not open")]
    NotOpen,

    /// The requested transition needs the vault to be locked.
    #[error("vault is not locked")]
    NotLocked,

    /// Restore refused: a sealed record already exists.
    #[error("vault is already locked")]
    AlreadyLocked,

    /// Decryption did not authenticate. Wrong passphrase and corrupted
    /// ciphertext are deliberately indistinguishable.
    #[error("incorrect passphrase or corrupted data")]
    WrongPassphrase,

    /// The vault believes it is locked but the sealed record is gone.
    /// Surfaced, never silently repaired.
    #[error("no sealed record in storage - store is inconsistent")]
    MissingSealedRecord,

    /// Key derivation did not finish within the caller's deadline. The
    /// store was not touched.
    #[error("key derivation timed out")]
    Timeout,

    /// A stored record failed typed validation where recovery would mean
    /// losing data (the sealed record at bootstrap, unlock, or export).
    #[error("stored record is malformed: {0}")]
    Malformed(#[source] serde_json::Error),

    /// A portable backup file failed validation.
    #[error("invalid backup file: {0}")]
    BadBackup(#[source] serde_json::Error),

    /// A record could not be serialized for storage.
    #[error("record serialization failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The atomic commit failed; the prior state is retained.
    #[error("commit failed, vault state unchanged: {0}")]
    Commit(#[source] StoreError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Observable vault state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultState {
    /// Bootstrap in progress. Never observed after [`Vault::open`] returns
    /// and never re-entered.
    Loading,
    /// Writable: the draft record exists, the sealed record does not.
    Open {
        content: String,
        last_updated: DateTime<Utc>,
    },
    /// Sealed: the sealed record exists, the draft does not.
    Locked { locked_at: DateTime<Utc> },
}

impl VaultState {
    pub fn is_open(&self) -> bool {
        matches!(self, VaultState::Open { .. })
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, VaultState::Locked { .. })
    }
}

struct Inner {
    store: Box<dyn RecordStore>,
    state: VaultState,
}

/// The journal vault.
///
/// Owns its record store (injected at construction, so tests substitute an
/// in-memory one) and the current lifecycle state. All methods take `&self`;
/// the internal mutex is the single mutual-exclusion token of the design.
pub struct Vault {
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Vault {
    /// Bootstrap the vault from whatever the store holds, using the current
    /// time for the auto-lock decision.
    pub fn open(store: Box<dyn RecordStore>, policy: &LockPolicy) -> Result<Self, VaultError> {
        Self::open_at(store, policy, Utc::now())
    }

    /// Bootstrap with an explicit clock.
    ///
    /// `now` decides the auto-lock trigger and stamps any records written
    /// during bootstrap. Callers with a real clock use [`Vault::open`].
    #[instrument(level = "info", name = "vault::bootstrap", skip_all, fields(now = %now))]
    pub fn open_at(
        mut store: Box<dyn RecordStore>,
        policy: &LockPolicy,
        now: DateTime<Utc>,
    ) -> Result<Self, VaultError> {
        let state = bootstrap::initial_state(store.as_mut(), policy, now)?;
        info!(open = state.is_open(), "bootstrap complete");
        Ok(Self {
            inner: Mutex::new(Inner { store, state }),
        })
    }

    /// Snapshot of the current state, for rendering.
    pub fn state(&self) -> VaultState {
        self.lock_inner().state.clone()
    }

    /// Save new draft text. `Open` → `Open`.
    ///
    /// Writes a whole fresh draft record stamped with the current time.
    /// Outside `Open` this is a no-op, not an error: the editor collaborator
    /// may still flush a debounced change after a lock has won the race.
    pub fn save(&self, text: &str) -> Result<(), VaultError> {
        let mut inner = self.lock_inner();
        if !inner.state.is_open() {
            debug!("ignoring save while vault is not open");
            return Ok(());
        }

        let draft = DraftRecord::new(text, Utc::now());
        let raw = draft.to_raw().map_err(VaultError::Encode)?;
        inner.store.put(Slot::Draft, raw)?;
        inner.state = VaultState::Open {
            content: draft.content,
            last_updated: draft.last_updated,
        };
        Ok(())
    }

    /// Seal the journal with `passphrase`. `Open` → `Locked`.
    ///
    /// Fresh salt and nonce, derived key, one atomic commit that writes the
    /// sealed record and deletes the draft. On any failure the vault stays
    /// `Open` and nothing was written.
    #[instrument(level = "info", name = "vault::lock", skip_all)]
    pub fn lock(&self, passphrase: &str) -> Result<DateTime<Utc>, VaultError> {
        let mut inner = self.lock_inner();
        let content = match &inner.state {
            VaultState::Open { content, .. } => content.clone(),
            _ => return Err(VaultError::NotOpen),
        };

        let locked_at = Utc::now();
        let sealed = seal(inner.store.as_mut(), &content, passphrase, locked_at)?;
        inner.state = VaultState::Locked {
            locked_at: sealed.locked_at,
        };
        info!(locked_at = %sealed.locked_at, "vault locked");
        Ok(sealed.locked_at)
    }

    /// Open the sealed journal with `passphrase`. `Locked` → `Open`.
    ///
    /// A wrong passphrase is the expected, frequent failure: it returns
    /// [`VaultError::WrongPassphrase`], leaves the sealed record untouched,
    /// and the vault stays `Locked`.
    #[instrument(level = "info", name = "vault::unlock", skip_all)]
    pub fn unlock(&self, passphrase: &str) -> Result<String, VaultError> {
        let mut inner = self.lock_inner();
        let sealed = read_sealed(&*inner)?;
        let content = open_sealed(&sealed, passphrase)?;
        finish_unlock(&mut inner, content)
    }

    /// Like [`unlock`](Self::unlock), but bound the CPU-heavy key
    /// derivation and decryption to `timeout`.
    ///
    /// On timeout the derivation thread is left to finish on its own (there
    /// is nothing to cancel safely) and [`VaultError::Timeout`] is returned;
    /// the store was not touched, so the vault is still cleanly `Locked`.
    #[instrument(level = "info", name = "vault::unlock", skip_all)]
    pub fn unlock_with_timeout(
        &self,
        passphrase: &str,
        timeout: Duration,
    ) -> Result<String, VaultError> {
        let mut inner = self.lock_inner();
        let sealed = read_sealed(&*inner)?;

        let (tx, rx) = mpsc::channel();
        let passphrase = passphrase.to_string();
        let sealed_for_worker = sealed.clone();
        std::thread::spawn(move || {
            let _ = tx.send(open_sealed(&sealed_for_worker, &passphrase));
        });

        let content = match rx.recv_timeout(timeout) {
            Ok(result) => result?,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(?timeout, "key derivation exceeded deadline");
                return Err(VaultError::Timeout);
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(VaultError::Crypto(CryptoError::Encryption(
                    "key derivation thread terminated unexpectedly".to_string(),
                )));
            }
        };

        finish_unlock(&mut inner, content)
    }

    /// Emit the sealed record as a portable backup file. `Locked` → `Locked`.
    ///
    /// No decryption, no state change; the record's fields go out verbatim.
    pub fn export(&self) -> Result<Vec<u8>, VaultError> {
        let inner = self.lock_inner();
        if !inner.state.is_locked() {
            return Err(VaultError::NotLocked);
        }
        let sealed = read_sealed(&inner)?;
        sealed.to_portable().map_err(VaultError::Encode)
    }

    /// Restore a sealed record from a portable backup file. → `Locked`.
    ///
    /// Refuses to run while locked: overwriting the existing sealed record
    /// would destroy the only copy of the journal. From `Open`, the current
    /// draft is replaced by the backup in one atomic commit.
    #[instrument(level = "info", name = "vault::restore", skip_all)]
    pub fn restore(&self, backup: &[u8]) -> Result<DateTime<Utc>, VaultError> {
        let sealed = SealedRecord::from_portable(backup).map_err(VaultError::BadBackup)?;

        let mut inner = self.lock_inner();
        if inner.state.is_locked() {
            return Err(VaultError::AlreadyLocked);
        }

        let raw = sealed.to_raw().map_err(VaultError::Encode)?;
        inner
            .store
            .commit(&[StoreOp::Put(Slot::Sealed, raw), StoreOp::Delete(Slot::Draft)])
            .map_err(VaultError::Commit)?;
        inner.state = VaultState::Locked {
            locked_at: sealed.locked_at,
        };
        info!(locked_at = %sealed.locked_at, "sealed record restored from backup");
        Ok(sealed.locked_at)
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Encrypt `content` and commit the sealed record while deleting the draft.
///
/// Shared by the explicit lock transition and the bootstrap auto-lock. The
/// commit is the only mutation; every earlier failure leaves the store as it
/// was.
pub(crate) fn seal(
    store: &mut dyn RecordStore,
    content: &str,
    passphrase: &str,
    locked_at: DateTime<Utc>,
) -> Result<SealedRecord, VaultError> {
    let salt = crypto::generate_salt()?;
    let nonce = crypto::generate_nonce()?;
    let key = crypto::derive_key(passphrase, &salt);
    let ciphertext = crypto::encrypt(content, &key, &nonce)?;

    let sealed = SealedRecord {
        ciphertext,
        nonce,
        salt,
        locked_at,
    };
    let raw = sealed.to_raw().map_err(VaultError::Encode)?;
    store
        .commit(&[StoreOp::Put(Slot::Sealed, raw), StoreOp::Delete(Slot::Draft)])
        .map_err(VaultError::Commit)?;
    Ok(sealed)
}

/// Read and validate the sealed record for a `Locked` vault.
fn read_sealed(inner: &Inner) -> Result<SealedRecord, VaultError> {
    if !inner.state.is_locked() {
        return Err(VaultError::NotLocked);
    }
    let raw = inner
        .store
        .get(Slot::Sealed)?
        .ok_or(VaultError::MissingSealedRecord)?;
    SealedRecord::from_raw(raw).map_err(VaultError::Malformed)
}

/// Derive the key from the stored salt and decrypt. CPU-bound, store-free.
fn open_sealed(sealed: &SealedRecord, passphrase: &str) -> Result<String, VaultError> {
    let key = crypto::derive_key(passphrase, &sealed.salt);
    crypto::decrypt(&sealed.ciphertext, &key, &sealed.nonce).map_err(|e| match e {
        CryptoError::Authentication => VaultError::WrongPassphrase,
        other => VaultError::Crypto(other),
    })
}

/// Commit the decrypted draft and delete the sealed record.
fn finish_unlock(inner: &mut Inner, content: String) -> Result<String, VaultError> {
    let now = Utc::now();
    let draft = DraftRecord::new(content.clone(), now);
    let raw = draft.to_raw().map_err(VaultError::Encode)?;
    inner
        .store
        .commit(&[StoreOp::Put(Slot::Draft, raw), StoreOp::Delete(Slot::Sealed)])
        .map_err(VaultError::Commit)?;
    inner.state = VaultState::Open {
        content: content.clone(),
        last_updated: now,
    };
    info!("vault unlocked");
    Ok(content)
}
