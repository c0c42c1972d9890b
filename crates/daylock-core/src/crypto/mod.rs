//! Cryptographic primitives for sealing and opening the journal.

pub mod cipher;

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
///
/// `Authentication` is the expected, frequent failure mode (wrong
/// passphrase). It is deliberately indistinguishable from corrupted or
/// tampered ciphertext: both produce the same GCM tag mismatch, and
/// collapsing them hides which one occurred from an observer.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// The system's secure random source could not produce bytes.
    ///
    /// Fatal for any lock operation. There is no fallback to a weaker
    /// source; a vault sealed with a predictable salt or nonce is not
    /// sealed at all.
    #[error("secure random source unavailable: {0}")]
    RandomSource(String),

    /// AEAD authentication failed: wrong passphrase, or the ciphertext,
    /// nonce, or salt were corrupted or tampered with.
    #[error("authentication failed - incorrect passphrase or corrupted data")]
    Authentication,

    /// Encryption itself failed. Should not happen with valid parameters.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// The authenticated plaintext is not valid UTF-8.
    ///
    /// The sealing side only ever encrypts UTF-8 text, so this indicates a
    /// record produced by something other than this crate.
    #[error("decrypted payload is not valid UTF-8: {0}")]
    Plaintext(#[from] std::string::FromUtf8Error),
}

pub use cipher::{decrypt, derive_key, encrypt, generate_nonce, generate_salt};
pub use cipher::{KEY_LEN, NONCE_LEN, SALT_LEN};
