use std::fmt;

use crate::crypto::{self, encrypt_identifier, CryptoError};
use crate::identifier::{ContentId, EncryptedIdentifier, IdentifierError};
use crate::ledger::{Ledger, LedgerError, Receipt};
use crate::payload::{encode_data_url, FALLBACK_MIME};
use crate::pinning::{EncryptedBlob, Pinner, PinningError};
use crate::store::StoreError;

use super::Session;

/// Where an upload is, or where it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Selected,
    Encrypting,
    Uploading,
    IdentifierEncrypting,
    Recording,
    Done,
    Failed,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadStage::Selected => "selected",
            UploadStage::Encrypting => "encrypting",
            UploadStage::Uploading => "uploading",
            UploadStage::IdentifierEncrypting => "encrypting identifier",
            UploadStage::Recording => "recording",
            UploadStage::Done => "done",
            UploadStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("no encryption key is active; generate or set one first")]
    MissingKey,
    #[error("failed to encrypt file: {0}")]
    Encryption(#[source] CryptoError),
    #[error("pinning error: {0}")]
    Pinning(#[from] PinningError),
    #[error("failed to save encryption key: {0}")]
    KeyStore(#[from] StoreError),
    #[error("identifier error: {0}")]
    Identifier(#[from] IdentifierError),
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl UploadError {
    /// The stage the upload was in when it failed
    pub fn stage(&self) -> UploadStage {
        match self {
            UploadError::MissingKey => UploadStage::Selected,
            UploadError::Encryption(_) => UploadStage::Encrypting,
            UploadError::Pinning(_) | UploadError::KeyStore(_) => UploadStage::Uploading,
            UploadError::Identifier(_) => UploadStage::IdentifierEncrypting,
            UploadError::Ledger(_) => UploadStage::Recording,
        }
    }
}

/// A file picked for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub name: String,
    /// MIME type of the plaintext, empty if unknown
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    fn original_type(&self) -> &str {
        match self.mime.trim() {
            "" => FALLBACK_MIME,
            mime => mime,
        }
    }
}

/// What a finished upload produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Raw CID of the ciphertext on the storage network
    pub cid: ContentId,
    /// The CID sealed for the uploader, as recorded on the ledger
    pub encrypted_identifier: EncryptedIdentifier,
    pub receipt: Receipt,
}

impl<L: Ledger, P: Pinner> Session<L, P> {
    /// Encrypt, pin and record `file` under the active key
    pub async fn upload(&self, file: FileUpload) -> Result<UploadReceipt, UploadError> {
        self.upload_with_progress(file, |_| {}).await
    }

    /// [`Session::upload`], reporting each stage to `progress` as it is entered
    ///
    /// The ledger write comes last, so a failure at any earlier stage
    /// leaves nothing on the ledger. A key saved before a failed
    /// ledger write is kept: it still decrypts the pinned ciphertext.
    pub async fn upload_with_progress<F>(
        &self,
        file: FileUpload,
        mut progress: F,
    ) -> Result<UploadReceipt, UploadError>
    where
        F: FnMut(UploadStage),
    {
        progress(UploadStage::Selected);
        let result = self.run_upload(file, &mut progress).await;
        match &result {
            Ok(_) => progress(UploadStage::Done),
            Err(e) => {
                tracing::warn!(error = %e, stage = %e.stage(), "upload failed");
                progress(UploadStage::Failed);
            }
        }
        result
    }

    async fn run_upload<F>(
        &self,
        file: FileUpload,
        progress: &mut F,
    ) -> Result<UploadReceipt, UploadError>
    where
        F: FnMut(UploadStage),
    {
        let key = self.active_key().cloned().ok_or(UploadError::MissingKey)?;

        progress(UploadStage::Encrypting);
        tracing::debug!(name = %file.name, size = file.bytes.len(), "encrypting file");
        let original_type = file.original_type().to_string();
        let data_url = encode_data_url(&original_type, &file.bytes);
        let ciphertext =
            crypto::encrypt(&data_url, key.as_str()).map_err(UploadError::Encryption)?;

        progress(UploadStage::Uploading);
        let blob = EncryptedBlob {
            file_name: file.name.clone(),
            original_type: original_type.clone(),
            ciphertext,
        };
        let cid = self.pinner.pin(&blob).await?;
        self.key_store
            .save(&cid, key, original_type, file.name.clone())?;

        progress(UploadStage::IdentifierEncrypting);
        let encrypted_identifier = encrypt_identifier(&cid, self.account())?;

        progress(UploadStage::Recording);
        tracing::debug!(%cid, "recording file on ledger");
        let tx = self
            .ledger
            .store(encrypted_identifier.as_str(), &file.name)
            .await?;
        let receipt = self.ledger.confirm(tx).await?;

        self.remember(&encrypted_identifier, &cid);
        tracing::info!(%cid, name = %file.name, tx = %receipt.tx_hash, "uploaded file");

        Ok(UploadReceipt {
            cid,
            encrypted_identifier,
            receipt,
        })
    }
}
