//! Per-recipient encryption of content identifiers
//!
//! The ledger is public, so it never holds a raw CID. Instead each
//! account with access gets the CID sealed under its own address, and
//! only that account can map the ledger entry back to the storage
//! network. Addresses are public knowledge, so this hides identifiers
//! from casual observers of the ledger rather than from a determined
//! one who tries every address it has seen.

use crate::account::AccountAddress;
use crate::identifier::{ContentId, EncryptedIdentifier, IdentifierError};

use super::cipher;

/// Seal `cid` for the holder of `address`
pub fn encrypt_identifier(
    cid: &ContentId,
    address: &AccountAddress,
) -> Result<EncryptedIdentifier, IdentifierError> {
    let sealed = cipher::encrypt(cid.as_str(), address.as_str())
        .map_err(IdentifierError::Encryption)?;
    Ok(EncryptedIdentifier::new(sealed))
}

/// Recover the CID sealed for `address`
///
/// # Errors
///
/// Fails with [`IdentifierError::Decryption`] when `address` is not the
/// one the identifier was sealed for, and with
/// [`IdentifierError::InvalidContentId`] if the opened value is not a CID.
pub fn decrypt_identifier(
    encrypted: &EncryptedIdentifier,
    address: &AccountAddress,
) -> Result<ContentId, IdentifierError> {
    let opened = cipher::decrypt(encrypted.as_str(), address.as_str()).map_err(|source| {
        IdentifierError::Decryption {
            address: address.clone(),
            source,
        }
    })?;
    ContentId::parse(&opened)
}
