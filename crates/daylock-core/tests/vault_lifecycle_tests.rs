//! End-to-end lifecycle tests: bootstrap, save, lock, unlock, export,
//! restore, and the one-record invariant across all of them.

use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tempfile::TempDir;

use daylock_core::store::Slot;
use daylock_core::{FileStore, LockPolicy, MemoryStore, RecordStore, Vault, VaultError, VaultState};

const AUTO_PASSPHRASE: &str = "fixed-auto-lock-passphrase";

fn policy(lock_date: &str) -> LockPolicy {
    LockPolicy::new(
        lock_date.parse().unwrap(),
        SecretString::from(AUTO_PASSPHRASE),
    )
}

/// A policy whose lock date is comfortably in the future.
fn open_policy() -> LockPolicy {
    policy("2099-01-01T00:00:00Z")
}

fn mem_vault() -> Vault {
    Vault::open(Box::new(MemoryStore::new()), &open_policy()).unwrap()
}

/// Read the raw state file back to check which slots exist on disk.
fn slots_on_disk(path: &std::path::Path) -> (bool, bool) {
    let store = FileStore::open(path).unwrap();
    (
        store.get(Slot::Draft).unwrap().is_some(),
        store.get(Slot::Sealed).unwrap().is_some(),
    )
}

#[test]
fn test_fresh_vault_is_open_and_empty() {
    let vault = mem_vault();
    match vault.state() {
        VaultState::Open { content, .. } => assert_eq!(content, ""),
        other => panic!("expected Open, got {other:?}"),
    }
}

#[test]
fn test_lock_then_unlock_returns_content_with_fresh_timestamp() {
    let vault = mem_vault();
    vault.save("hello").unwrap();

    let locked_at = vault.lock("abc").unwrap();
    assert_eq!(vault.state(), VaultState::Locked { locked_at });

    let before_unlock = Utc::now();
    let content = vault.unlock("abc").unwrap();
    assert_eq!(content, "hello");

    match vault.state() {
        VaultState::Open {
            content,
            last_updated,
        } => {
            assert_eq!(content, "hello");
            // lastUpdated is the unlock time, not the lock time.
            assert!(last_updated >= before_unlock);
            assert!(last_updated >= locked_at);
        }
        other => panic!("expected Open, got {other:?}"),
    }
}

#[test]
fn test_wrong_passphrase_leaves_sealed_record_unlockable() {
    let vault = mem_vault();
    vault.save("secret entry").unwrap();
    vault.lock("abc").unwrap();

    let err = vault.unlock("wrong").unwrap_err();
    assert!(matches!(err, VaultError::WrongPassphrase));
    assert!(vault.state().is_locked());

    // Still unlockable with the right passphrase afterwards.
    assert_eq!(vault.unlock("abc").unwrap(), "secret entry");
}

#[test]
fn test_lock_requires_open_and_unlock_requires_locked() {
    let vault = mem_vault();
    assert!(matches!(vault.unlock("abc"), Err(VaultError::NotLocked)));

    vault.lock("abc").unwrap();
    assert!(matches!(vault.lock("abc"), Err(VaultError::NotOpen)));
}

#[test]
fn test_save_outside_open_is_ignored_not_an_error() {
    let vault = mem_vault();
    vault.save("entry").unwrap();
    vault.lock("abc").unwrap();

    // A debounced editor flush arriving after the lock won the race.
    vault.save("late flush").unwrap();
    assert!(vault.state().is_locked());

    assert_eq!(vault.unlock("abc").unwrap(), "entry");
}

#[test]
fn test_failed_commit_keeps_vault_open_and_draft_intact() {
    let mut store = MemoryStore::new();
    store.fail_after(1);
    let vault = Vault::open(Box::new(store), &open_policy()).unwrap();
    vault.save("precious").unwrap();

    let err = vault.lock("abc").unwrap_err();
    assert!(matches!(err, VaultError::Commit(_)));

    // Still open with the draft, no sealed record anywhere.
    match vault.state() {
        VaultState::Open { content, .. } => assert_eq!(content, "precious"),
        other => panic!("expected Open, got {other:?}"),
    }
    assert!(matches!(vault.export(), Err(VaultError::NotLocked)));

    // The injected fault was one-shot; the retry goes through cleanly.
    vault.lock("abc").unwrap();
    assert_eq!(vault.unlock("abc").unwrap(), "precious");
}

#[test]
fn test_one_record_invariant_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");

    let vault = Vault::open(
        Box::new(FileStore::open(&path).unwrap()),
        &open_policy(),
    )
    .unwrap();

    vault.save("entry").unwrap();
    assert_eq!(slots_on_disk(&path), (true, false));

    vault.lock("abc").unwrap();
    assert_eq!(slots_on_disk(&path), (false, true));

    vault.unlock("abc").unwrap();
    assert_eq!(slots_on_disk(&path), (true, false));
}

#[test]
fn test_draft_survives_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");

    {
        let vault = Vault::open(
            Box::new(FileStore::open(&path).unwrap()),
            &open_policy(),
        )
        .unwrap();
        vault.save("first").unwrap();
        vault.save("first, revised").unwrap();
    }

    let vault = Vault::open(
        Box::new(FileStore::open(&path).unwrap()),
        &open_policy(),
    )
    .unwrap();
    match vault.state() {
        VaultState::Open { content, .. } => assert_eq!(content, "first, revised"),
        other => panic!("expected Open, got {other:?}"),
    }
}

#[test]
fn test_locked_vault_stays_locked_across_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");

    let locked_at = {
        let vault = Vault::open(
            Box::new(FileStore::open(&path).unwrap()),
            &open_policy(),
        )
        .unwrap();
        vault.save("entry").unwrap();
        vault.lock("abc").unwrap()
    };

    let vault = Vault::open(
        Box::new(FileStore::open(&path).unwrap()),
        &open_policy(),
    )
    .unwrap();
    assert_eq!(vault.state(), VaultState::Locked { locked_at });
    assert_eq!(vault.unlock("abc").unwrap(), "entry");
}

#[test]
fn test_bootstrap_past_lock_date_seals_existing_draft() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");

    // A draft written before the lock date...
    {
        let vault = Vault::open(
            Box::new(FileStore::open(&path).unwrap()),
            &open_policy(),
        )
        .unwrap();
        vault.save("diary entry").unwrap();
    }

    // ...and a bootstrap with the clock past the fixed date.
    let due = policy("2026-01-01T00:00:00Z");
    let now: DateTime<Utc> = "2026-06-01T12:00:00Z".parse().unwrap();
    let vault = Vault::open_at(Box::new(FileStore::open(&path).unwrap()), &due, now).unwrap();

    assert_eq!(vault.state(), VaultState::Locked { locked_at: now });
    assert_eq!(slots_on_disk(&path), (false, true));

    // The fixed auto-lock passphrase recovers the text.
    assert_eq!(vault.unlock(AUTO_PASSPHRASE).unwrap(), "diary entry");
}

#[test]
fn test_bootstrap_refuses_to_seal_over_damaged_sealed_record() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    {
        let vault = Vault::open(
            Box::new(FileStore::open(&path).unwrap()),
            &open_policy(),
        )
        .unwrap();
        vault.save("diary entry").unwrap();
        vault.lock("abc").unwrap();
    }

    // Damage the iv on disk; the ciphertext bytes stay intact.
    let mut doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    doc["sealed"]["iv"] = serde_json::json!("AAAAAAAAAAA=");
    std::fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();
    let damaged = std::fs::read_to_string(&path).unwrap();

    // Bootstrap past the lock date surfaces the damage instead of
    // auto-locking over the only remaining copy of the journal.
    let due = policy("2026-01-01T00:00:00Z");
    let now: DateTime<Utc> = "2026-06-01T12:00:00Z".parse().unwrap();
    let err = Vault::open_at(Box::new(FileStore::open(&path).unwrap()), &due, now).unwrap_err();
    assert!(matches!(err, VaultError::Malformed(_)));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), damaged);
}

#[test]
fn test_bootstrap_past_lock_date_with_no_draft_seals_empty_journal() {
    let due = policy("2026-01-01T00:00:00Z");
    let now: DateTime<Utc> = "2026-06-01T12:00:00Z".parse().unwrap();
    let vault = Vault::open_at(Box::new(MemoryStore::new()), &due, now).unwrap();

    assert!(vault.state().is_locked());
    assert_eq!(vault.unlock(AUTO_PASSPHRASE).unwrap(), "");
}

#[test]
fn test_two_locks_never_share_salt_or_nonce() {
    let vault = mem_vault();
    vault.save("entry").unwrap();

    vault.lock("abc").unwrap();
    let first = vault.export().unwrap();
    vault.unlock("abc").unwrap();

    vault.lock("abc").unwrap();
    let second = vault.export().unwrap();

    let first: serde_json::Value = serde_json::from_slice(&first).unwrap();
    let second: serde_json::Value = serde_json::from_slice(&second).unwrap();
    assert_ne!(first["salt"], second["salt"]);
    assert_ne!(first["iv"], second["iv"]);
    // Same plaintext, same passphrase, different ciphertext.
    assert_ne!(first["ciphertext"], second["ciphertext"]);
}

#[test]
fn test_export_restore_roundtrip_into_fresh_store() {
    let vault = mem_vault();
    vault.save("portable entry").unwrap();
    let locked_at = vault.lock("abc").unwrap();
    let backup = vault.export().unwrap();

    // A brand-new store, as after data loss or a device move.
    let fresh = mem_vault();
    fresh.save("doomed scratch text").unwrap();
    let restored_at = fresh.restore(&backup).unwrap();
    assert_eq!(restored_at, locked_at);
    assert_eq!(fresh.state(), VaultState::Locked { locked_at });

    assert_eq!(fresh.unlock("abc").unwrap(), "portable entry");
}

#[test]
fn test_restore_refuses_to_overwrite_sealed_record() {
    let vault = mem_vault();
    vault.save("entry").unwrap();
    vault.lock("abc").unwrap();
    let backup = vault.export().unwrap();

    let other = mem_vault();
    other.save("other journal").unwrap();
    other.lock("different-pass").unwrap();

    assert!(matches!(
        other.restore(&backup),
        Err(VaultError::AlreadyLocked)
    ));
    // Unharmed.
    assert_eq!(other.unlock("different-pass").unwrap(), "other journal");
}

#[test]
fn test_restore_rejects_garbage() {
    let vault = mem_vault();
    assert!(matches!(
        vault.restore(b"not a backup"),
        Err(VaultError::BadBackup(_))
    ));
    assert!(matches!(
        vault.restore(br#"{"ciphertext": "AAAA"}"#),
        Err(VaultError::BadBackup(_))
    ));
}

#[test]
fn test_export_requires_locked() {
    let vault = mem_vault();
    assert!(matches!(vault.export(), Err(VaultError::NotLocked)));
}

#[test]
fn test_unlock_with_timeout_zero_deadline_times_out_cleanly() {
    let vault = mem_vault();
    vault.save("entry").unwrap();
    vault.lock("abc").unwrap();

    let err = vault
        .unlock_with_timeout("abc", Duration::ZERO)
        .unwrap_err();
    assert!(matches!(err, VaultError::Timeout));

    // No partial writes: still cleanly locked and unlockable.
    assert!(vault.state().is_locked());
    assert_eq!(
        vault
            .unlock_with_timeout("abc", Duration::from_secs(60))
            .unwrap(),
        "entry"
    );
}

#[test]
fn test_unicode_content_roundtrip() {
    let vault = mem_vault();
    let text = "今日の日記 — ça va très bien 🎉\nline two";
    vault.save(text).unwrap();
    vault.lock("clé-déposée").unwrap();
    assert_eq!(vault.unlock("clé-déposée").unwrap(), text);
}
