use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::account::AccountAddress;
use crate::crypto::{is_envelope, CryptoError};

#[derive(Debug, thiserror::Error)]
pub enum IdentifierError {
    #[error("invalid content identifier {0:?}")]
    InvalidContentId(String),
    #[error("failed to encrypt content identifier: {0}")]
    Encryption(#[source] CryptoError),
    #[error("cannot decrypt identifier with address {address}: {source}")]
    Decryption {
        address: AccountAddress,
        #[source]
        source: CryptoError,
    },
}

/// A content identifier assigned by the storage network
///
/// CIDs in the wild are base58btc (`Qm...`) or base32 (`b...`)
/// strings, so a valid identifier is a non-empty run of ASCII
/// alphanumerics. This is also what makes a decryption under the
/// wrong key distinguishable from a real identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(IdentifierError::InvalidContentId(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentId> for String {
    fn from(cid: ContentId) -> Self {
        cid.0
    }
}

/// A content identifier encrypted under one account address
///
/// This is what the ledger stores in place of the raw CID. Each
/// recipient of a file gets their own, distinct value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedIdentifier(String);

impl EncryptedIdentifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EncryptedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Heuristic: does `value` look like an [`EncryptedIdentifier`]?
///
/// True exactly when `value` starts with [`crate::crypto::ENVELOPE_PREFIX`], the
/// base64 rendering of the envelope header. Raw CIDs are alphanumeric
/// and never start with this prefix in practice, but the check is a
/// sniff, not a proof: callers must still handle decryption failure.
pub fn is_likely_encrypted_identifier(value: &str) -> bool {
    is_envelope(value)
}

/// Outcome of mapping a ledger-facing identifier back to a raw CID
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The identifier was an envelope and opened under the given address
    Decrypted(ContentId),
    /// The identifier did not open, but this device remembers its CID
    Cached(ContentId),
    /// The identifier was taken literally as a CID
    Literal(ContentId),
}

impl Resolution {
    pub fn cid(&self) -> &ContentId {
        match self {
            Resolution::Decrypted(cid) | Resolution::Cached(cid) | Resolution::Literal(cid) => cid,
        }
    }

    pub fn into_cid(self) -> ContentId {
        match self {
            Resolution::Decrypted(cid) | Resolution::Cached(cid) | Resolution::Literal(cid) => cid,
        }
    }
}
