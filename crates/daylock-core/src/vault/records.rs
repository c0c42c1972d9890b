//! Typed records and the portable backup format.
//!
//! Records are validated at the storage boundary: a [`RawRecord`] either
//! deserializes into the typed shape or it is rejected whole. Byte fields
//! persist as base64 strings so the sealed record and the portable backup
//! file are the same JSON object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::base64::Base64;
use serde_with::serde_as;

use crate::crypto::{NONCE_LEN, SALT_LEN};
use crate::store::RawRecord;

/// The plaintext draft. Exists only while the vault is open.
///
/// Each save writes a whole new record; drafts are superseded, never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    pub content: String,
    pub last_updated: DateTime<Utc>,
}

impl DraftRecord {
    pub fn new(content: impl Into<String>, last_updated: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            last_updated,
        }
    }

    /// Validate a raw stored record.
    pub fn from_raw(raw: RawRecord) -> Result<Self, serde_json::Error> {
        serde_json::from_value(raw)
    }

    pub fn to_raw(&self) -> Result<RawRecord, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// The sealed journal. Exists only while the vault is locked.
///
/// `ciphertext`, `nonce`, and `salt` are produced together by one lock
/// operation and are only meaningful as a unit: the GCM tag embedded in the
/// ciphertext authenticates the pair it was created with and nothing else.
/// Deserialization enforces the 96-bit nonce and 128-bit salt lengths.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedRecord {
    #[serde_as(as = "Base64")]
    pub ciphertext: Vec<u8>,
    /// Persisted as `iv`, the GCM initialization vector.
    #[serde_as(as = "Base64")]
    #[serde(rename = "iv")]
    pub nonce: [u8; NONCE_LEN],
    #[serde_as(as = "Base64")]
    pub salt: [u8; SALT_LEN],
    pub locked_at: DateTime<Utc>,
}

impl SealedRecord {
    /// Validate a raw stored record.
    pub fn from_raw(raw: RawRecord) -> Result<Self, serde_json::Error> {
        serde_json::from_value(raw)
    }

    pub fn to_raw(&self) -> Result<RawRecord, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Serialize as the portable backup file: a JSON object with exactly the
    /// four record fields, byte fields base64-encoded.
    pub fn to_portable(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    /// Parse a portable backup file produced by [`to_portable`](Self::to_portable).
    pub fn from_portable(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
