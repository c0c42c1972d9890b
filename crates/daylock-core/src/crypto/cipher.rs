//! Passphrase-based key derivation and authenticated encryption.
//!
//! One sealed journal is one `(ciphertext, nonce, salt)` triple: the salt
//! feeds PBKDF2-HMAC-SHA256 to derive a 256-bit key from the passphrase,
//! and the nonce feeds AES-256-GCM. Salt and nonce are drawn fresh from the
//! system RNG on every seal, so two locks of the same text with the same
//! passphrase share nothing observable.

use std::num::NonZeroU32;

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretBox};
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

use super::CryptoError;

/// Salt length in bytes (128 bits).
pub const SALT_LEN: usize = 16;
/// GCM nonce length in bytes (96 bits).
pub const NONCE_LEN: usize = 12;
/// Derived key length in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Default PBKDF2 iteration count.
const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

/// Fast iteration count for testing (~100x cheaper).
///
/// Enable by setting the `DAYLOCK_FAST_KDF` environment variable to `1`.
/// Never use outside tests.
const FAST_PBKDF2_ITERATIONS: u32 = 1_000;

/// Check if fast KDF mode is enabled via environment variable.
#[inline]
fn is_fast_kdf_enabled() -> bool {
    std::env::var("DAYLOCK_FAST_KDF")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn pbkdf2_iterations() -> NonZeroU32 {
    let n = if is_fast_kdf_enabled() {
        FAST_PBKDF2_ITERATIONS
    } else {
        DEFAULT_PBKDF2_ITERATIONS
    };
    NonZeroU32::new(n).expect("iteration constants are non-zero")
}

/// Generate a fresh random salt for key derivation.
///
/// # Errors
///
/// `CryptoError::RandomSource` if the system RNG fails. This is fatal for
/// the caller's lock operation.
pub fn generate_salt() -> Result<[u8; SALT_LEN], CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| CryptoError::RandomSource("failed to generate salt".to_string()))?;
    Ok(salt)
}

/// Generate a fresh random GCM nonce.
///
/// # Errors
///
/// `CryptoError::RandomSource` if the system RNG fails.
pub fn generate_nonce() -> Result<[u8; NONCE_LEN], CryptoError> {
    let mut nonce = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce)
        .map_err(|_| CryptoError::RandomSource("failed to generate nonce".to_string()))?;
    Ok(nonce)
}

/// Derive a 256-bit AEAD key from a passphrase and salt.
///
/// The passphrase is NFC-normalized first, so composed and decomposed
/// Unicode spellings of the same text derive the same key. The same
/// passphrase and salt always yield the same key; different salts yield
/// unlinkable keys even for identical passphrases.
///
/// PBKDF2-HMAC-SHA256 at 100,000 iterations; deliberately slow.
pub fn derive_key(passphrase: &str, salt: &[u8; SALT_LEN]) -> SecretBox<[u8; KEY_LEN]> {
    let normalized = Zeroizing::new(passphrase.nfc().collect::<String>());

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        pbkdf2_iterations(),
        salt,
        normalized.as_bytes(),
        &mut key[..],
    );

    SecretBox::new(Box::new(*key))
}

/// Encrypt UTF-8 text under a derived key and fresh nonce.
///
/// The returned ciphertext has the 16-byte GCM tag appended; any later
/// corruption of ciphertext, nonce, or key is detected at decrypt time.
pub fn encrypt(
    plaintext: &str,
    key: &SecretBox<[u8; KEY_LEN]>,
    nonce: &[u8; NONCE_LEN],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.expose_secret()));
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext.as_bytes())
        .map_err(|e| CryptoError::Encryption(e.to_string()))
}

/// Decrypt and authenticate a sealed payload.
///
/// # Errors
///
/// `CryptoError::Authentication` if the tag does not verify under the given
/// key and nonce. This is the sole wrong-passphrase signal; callers must not
/// try to tell wrong-passphrase apart from tampering.
pub fn decrypt(
    ciphertext: &[u8],
    key: &SecretBox<[u8; KEY_LEN]>,
    nonce: &[u8; NONCE_LEN],
) -> Result<String, CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.expose_secret()));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Authentication)?;
    Ok(String::from_utf8(plaintext)?)
}
