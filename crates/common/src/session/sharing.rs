//! Granting, withdrawing and deleting access on the ledger
//!
//! # Revocation
//!
//! Revoking access only removes the ledger grant. A recipient who
//! already fetched and decrypted the file keeps their copy, and one who
//! learned the raw CID and the key can still fetch the ciphertext from
//! any gateway. Revocation governs future access through the ledger and
//! nothing else.

use crate::account::{AccountAddress, AddressError};
use crate::crypto::{decrypt_identifier, encrypt_identifier};
use crate::identifier::{
    is_likely_encrypted_identifier, ContentId, EncryptedIdentifier, IdentifierError,
};
use crate::ledger::{Ledger, LedgerError, Receipt};
use crate::pinning::Pinner;

use super::Session;

#[derive(Debug, thiserror::Error)]
pub enum SharingError {
    #[error("invalid recipient: {0}")]
    InvalidAddress(#[from] AddressError),
    #[error("identifier error: {0}")]
    Identifier(#[from] IdentifierError),
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// What a confirmed share produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareReceipt {
    pub recipient: AccountAddress,
    /// The CID sealed for the recipient, as recorded on the ledger
    pub recipient_identifier: EncryptedIdentifier,
    pub receipt: Receipt,
}

impl<L: Ledger, P: Pinner> Session<L, P> {
    /// Grant `recipient` access to one of the connected account's files
    ///
    /// `identifier` is the file as the owner's ledger record lists it.
    /// The raw CID behind it is sealed again for the recipient, and
    /// the ledger records that second identifier in the recipient's
    /// shared list.
    ///
    /// # Errors
    ///
    /// Unlike retrieval, sharing does not fall back to treating an
    /// unopenable envelope as a CID: it fails with
    /// [`SharingError::Identifier`] instead, since the recipient would
    /// otherwise receive garbage.
    pub async fn share(
        &self,
        identifier: &str,
        recipient: &str,
    ) -> Result<ShareReceipt, SharingError> {
        let recipient = AccountAddress::parse(recipient)?;
        let identifier = identifier.trim();
        let cid = self.open_own_identifier(identifier)?;

        let recipient_identifier = encrypt_identifier(&cid, &recipient)?;
        tracing::debug!(%recipient, "granting access");
        let tx = self
            .ledger
            .update_access(identifier, &recipient, recipient_identifier.as_str())
            .await?;
        let receipt = self.ledger.confirm(tx).await?;

        self.remember(&recipient_identifier, &cid);
        tracing::info!(%recipient, tx = %receipt.tx_hash, "shared file");

        Ok(ShareReceipt {
            recipient,
            recipient_identifier,
            receipt,
        })
    }

    /// Withdraw `recipient`'s access to one of the connected account's files
    ///
    /// See the module docs: this does not reach copies the recipient
    /// already holds.
    pub async fn revoke(&self, identifier: &str, recipient: &str) -> Result<Receipt, SharingError> {
        let recipient = AccountAddress::parse(recipient)?;
        tracing::debug!(%recipient, "revoking access");
        let tx = self
            .ledger
            .remove_access(identifier.trim(), &recipient)
            .await?;
        let receipt = self.ledger.confirm(tx).await?;
        tracing::info!(%recipient, tx = %receipt.tx_hash, "revoked access");
        Ok(receipt)
    }

    /// Delete one of the connected account's files from the ledger
    ///
    /// Once the deletion is final, the device forgets the file's key and
    /// cached identifiers. The pinned ciphertext itself is left alone.
    pub async fn delete(&self, identifier: &str) -> Result<Receipt, DeleteError> {
        let identifier = identifier.trim();
        let cid = self
            .resolve_identifier(identifier)
            .ok()
            .map(|resolution| resolution.into_cid());

        let tx = self.ledger.delete_cid(identifier).await?;
        let receipt = self.ledger.confirm(tx).await?;
        tracing::info!(tx = %receipt.tx_hash, "deleted file");

        if let Some(cid) = cid {
            if let Err(e) = self.key_store.delete(&cid) {
                tracing::warn!(error = %e, %cid, "failed to remove key for deleted file");
            }
            if let Err(e) = self.identifiers.remove_cid(&cid) {
                tracing::warn!(error = %e, %cid, "failed to remove cached identifiers");
            }
        }

        Ok(receipt)
    }

    fn open_own_identifier(&self, identifier: &str) -> Result<ContentId, IdentifierError> {
        if is_likely_encrypted_identifier(identifier) {
            decrypt_identifier(&EncryptedIdentifier::new(identifier), self.account())
        } else {
            ContentId::parse(identifier)
        }
    }
}
