use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of random bytes in a generated key (128 bits)
pub const GENERATED_KEY_SIZE: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("encryption key cannot be empty")]
    Empty,
    #[error("failed to generate random key: {0}")]
    Random(#[from] getrandom::Error),
}

/// A file encryption key
///
/// Either 128 random bits rendered as 32 hex characters, or a
/// passphrase chosen by the user and used verbatim. The key never
/// leaves the device except through the user; the ledger only
/// ever sees ciphertext produced with it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptionKey(String);

impl EncryptionKey {
    /// Generate a new random key using a cryptographically secure RNG
    pub fn generate() -> Result<Self, KeyError> {
        let mut buff = [0u8; GENERATED_KEY_SIZE];
        getrandom::getrandom(&mut buff)?;
        Ok(Self(hex::encode(buff)))
    }

    /// Wrap a user-supplied key
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Empty`] if the key is empty or only whitespace.
    pub fn custom(key: impl Into<String>) -> Result<Self, KeyError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(KeyError::Empty);
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

impl FromStr for EncryptionKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::custom(s)
    }
}
