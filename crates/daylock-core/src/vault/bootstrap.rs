//! Lifecycle bootstrap: decide the initial state from persisted records and
//! the clock, sealing the journal if the lock date has passed.
//!
//! The auto-lock trigger is evaluated here and only here. A vault left open
//! in storage past its lock date stays open until the next bootstrap; that
//! is accepted eventual consistency, because this check always re-runs on
//! the next load.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use crate::store::{RecordStore, Slot};

use super::machine::{seal, VaultError, VaultState};
use super::records::{DraftRecord, SealedRecord};

/// When and how the journal seals itself.
///
/// Both fields are injected at startup. The auto-lock passphrase is
/// configuration, not a compiled-in secret; whoever configures the vault
/// decides who can reopen an auto-locked journal.
#[derive(Clone)]
pub struct LockPolicy {
    lock_date: DateTime<Utc>,
    auto_passphrase: SecretString,
}

impl LockPolicy {
    pub fn new(lock_date: DateTime<Utc>, auto_passphrase: SecretString) -> Self {
        Self {
            lock_date,
            auto_passphrase,
        }
    }

    /// The fixed point in time after which bootstrap seals the journal.
    pub fn lock_date(&self) -> DateTime<Utc> {
        self.lock_date
    }

    /// Whether the auto-lock is due at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.lock_date
    }

    pub(crate) fn auto_passphrase(&self) -> &str {
        self.auto_passphrase.expose_secret()
    }
}

impl std::fmt::Debug for LockPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockPolicy")
            .field("lock_date", &self.lock_date)
            .field("auto_passphrase", &"[REDACTED]")
            .finish()
    }
}

/// Inspect the store and compute the initial state, auto-locking if due.
///
/// The sealed record wins: if one exists and validates, the vault is
/// `Locked` and the draft slot is not even consulted (under the one-record
/// invariant it should not exist; if a stray draft survives a prior
/// inconsistent write, the encrypted journal is the authoritative copy).
/// A malformed draft is logged and treated as absent. A malformed sealed
/// record fails bootstrap instead: it may still hold the only copy of the
/// journal (a damaged `iv` with intact ciphertext is recoverable by hand),
/// and treating it as absent would let a due auto-lock seal over it.
pub(crate) fn initial_state(
    store: &mut dyn RecordStore,
    policy: &LockPolicy,
    now: DateTime<Utc>,
) -> Result<VaultState, VaultError> {
    if let Some(raw) = store.get(Slot::Sealed)? {
        let sealed = SealedRecord::from_raw(raw).map_err(VaultError::Malformed)?;
        info!(locked_at = %sealed.locked_at, "sealed record present, vault is locked");
        return Ok(VaultState::Locked {
            locked_at: sealed.locked_at,
        });
    }

    let draft = match store.get(Slot::Draft)? {
        Some(raw) => match DraftRecord::from_raw(raw) {
            Ok(draft) => Some(draft),
            Err(e) => {
                warn!(error = %e, "draft record is malformed, discarding");
                None
            }
        },
        None => None,
    };

    if policy.is_due(now) {
        let content = draft.map(|d| d.content).unwrap_or_default();
        info!(lock_date = %policy.lock_date(), "lock date reached, sealing journal");
        let sealed = seal(store, &content, policy.auto_passphrase(), now)?;
        return Ok(VaultState::Locked {
            locked_at: sealed.locked_at,
        });
    }

    Ok(match draft {
        Some(draft) => VaultState::Open {
            content: draft.content,
            last_updated: draft.last_updated,
        },
        None => VaultState::Open {
            content: String::new(),
            last_updated: now,
        },
    })
}
