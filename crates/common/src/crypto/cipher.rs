//! Passphrase-keyed envelopes using Argon2id and AES-256-GCM
//!
//! Both file payloads and content identifiers are sealed with the same
//! envelope. The passphrase is stretched with Argon2id under a fresh random
//! salt, and the derived key seals the text with AES-256-GCM:
//!
//! `base64(b"Salted__" || salt (8 bytes) || nonce (12 bytes) || ciphertext || tag (16 bytes))`
//!
//! Because of the fixed header every envelope renders with the same leading
//! characters, [`ENVELOPE_PREFIX`]. Fresh salt and nonce mean two encryptions
//! of the same text under the same passphrase never produce the same output.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use argon2::Argon2;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Leading bytes of every envelope
pub const ENVELOPE_HEADER: &[u8; 8] = b"Salted__";
/// Base64 rendering of [`ENVELOPE_HEADER`] as it appears at the start of every envelope
pub const ENVELOPE_PREFIX: &str = "U2FsdGVkX1";
/// Size of the key derivation salt in bytes
pub const SALT_SIZE: usize = 8;
/// Size of the AES-GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of the AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;
/// Size of the derived AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

const MIN_ENVELOPE_SIZE: usize = ENVELOPE_HEADER.len() + SALT_SIZE + NONCE_SIZE + TAG_SIZE;

/// Errors that can occur during encryption/decryption
///
/// `Malformed` means the input was never an envelope at all, while
/// `WrongKey` means it was one but the passphrase does not open it.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("not an encrypted envelope: {0}")]
    Malformed(String),
    #[error("wrong key or tampered ciphertext")]
    WrongKey,
    #[error("decrypted payload is not valid UTF-8")]
    NotUtf8,
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),
    #[error("failed to generate random bytes: {0}")]
    Random(#[from] getrandom::Error),
    #[error("encrypt error")]
    Encrypt,
}

impl CryptoError {
    pub fn is_wrong_key(&self) -> bool {
        matches!(self, CryptoError::WrongKey)
    }
}

/// Whether `value` carries the envelope signature
pub fn is_envelope(value: &str) -> bool {
    value.starts_with(ENVELOPE_PREFIX)
}

/// Seal `plaintext` under `passphrase`
///
/// # Errors
///
/// Returns an error only if the system RNG or key derivation fails.
pub fn encrypt(plaintext: &str, passphrase: &str) -> Result<String, CryptoError> {
    let mut salt = [0u8; SALT_SIZE];
    getrandom::getrandom(&mut salt)?;
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    getrandom::getrandom(&mut nonce_bytes)?;

    let cipher = cipher_for(passphrase, &salt)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
        .map_err(|_| CryptoError::Encrypt)?;

    let mut out = Vec::with_capacity(MIN_ENVELOPE_SIZE - TAG_SIZE + ciphertext.len());
    out.extend_from_slice(ENVELOPE_HEADER);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);

    Ok(STANDARD.encode(out))
}

/// Open an envelope produced by [`encrypt`]
///
/// # Errors
///
/// Returns an error if:
/// - The input is not base64, lacks the envelope header or is truncated (`Malformed`)
/// - Authentication fails, i.e. the passphrase is wrong or the data was altered (`WrongKey`)
/// - The authenticated plaintext is not UTF-8 (`NotUtf8`)
pub fn decrypt(envelope: &str, passphrase: &str) -> Result<String, CryptoError> {
    let data = STANDARD
        .decode(envelope.trim())
        .map_err(|e| CryptoError::Malformed(format!("invalid base64: {e}")))?;

    if data.len() < MIN_ENVELOPE_SIZE {
        return Err(CryptoError::Malformed(format!(
            "envelope too short: {} bytes",
            data.len()
        )));
    }
    let (header, rest) = data.split_at(ENVELOPE_HEADER.len());
    if header != ENVELOPE_HEADER {
        return Err(CryptoError::Malformed("missing envelope header".to_string()));
    }
    let (salt, rest) = rest.split_at(SALT_SIZE);
    let (nonce, ciphertext) = rest.split_at(NONCE_SIZE);

    let cipher = cipher_for(passphrase, salt)?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::WrongKey)?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::NotUtf8)
}

fn cipher_for(passphrase: &str, salt: &[u8]) -> Result<Aes256Gcm, CryptoError> {
    let mut key = [0u8; KEY_SIZE];
    Argon2::default()
        .hash_password_into(passphrase.as_bytes(), salt, &mut key)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key)))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let data = "hello world, this is a test message for encryption";

        let encrypted = encrypt(data, "k1").unwrap();
        let decrypted = decrypt(&encrypted, "k1").unwrap();

        assert_eq!(data, decrypted);
    }

    #[test]
    fn test_envelope_prefix() {
        let encrypted = encrypt("Qm123", "0xabc").unwrap();
        assert!(encrypted.starts_with(ENVELOPE_PREFIX));
        assert!(is_envelope(&encrypted));
        assert!(!is_envelope("QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG"));
    }

    #[test]
    fn test_encryption_is_randomized() {
        let a = encrypt("same text", "same key").unwrap();
        let b = encrypt("same text", "same key").unwrap();
        assert_ne!(a, b);
        assert_eq!(decrypt(&a, "same key").unwrap(), decrypt(&b, "same key").unwrap());
    }

    #[test]
    fn test_wrong_key_is_detected() {
        let encrypted = encrypt("secret payload", "right").unwrap();
        let err = decrypt(&encrypted, "wrong").unwrap_err();
        assert!(err.is_wrong_key(), "unexpected error: {err}");
    }

    #[test]
    fn test_not_ciphertext_is_malformed() {
        for input in ["", "not base64 at all!", "aGVsbG8gd29ybGQ=", "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG"] {
            let err = decrypt(input, "any").unwrap_err();
            assert!(
                matches!(err, CryptoError::Malformed(_)),
                "{input:?} gave {err}"
            );
        }
    }

    #[test]
    fn test_tampered_ciphertext_fails_authentication() {
        let encrypted = encrypt("integrity matters", "k").unwrap();
        let mut raw = STANDARD.decode(&encrypted).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;
        let tampered = STANDARD.encode(raw);

        assert!(decrypt(&tampered, "k").unwrap_err().is_wrong_key());
    }

    #[test]
    fn test_empty_plaintext() {
        let encrypted = encrypt("", "k").unwrap();
        assert_eq!(decrypt(&encrypted, "k").unwrap(), "");
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let encrypted = encrypt("payload", "k").unwrap();
        assert_eq!(decrypt(&format!("{encrypted}\n"), "k").unwrap(), "payload");
    }
}
