use crate::crypto::{self, CryptoError, EncryptionKey};
use crate::gateway::GatewayError;
use crate::identifier::IdentifierError;
use crate::ledger::Ledger;
use crate::payload::DecryptedFile;
use crate::pinning::Pinner;

use super::Session;

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("cannot resolve identifier: {0}")]
    Unresolved(#[from] IdentifierError),
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error("retrieved empty content for {identifier}")]
    EmptyPayload { identifier: String },
    #[error("decryption key not provided")]
    MissingDecryptionKey,
    #[error("failed to decrypt file: {0}")]
    Decryption(#[source] CryptoError),
}

impl RetrievalError {
    /// Whether the caller should ask the user for a (different) key
    ///
    /// True when no key was given or the given key did not open the
    /// file. A payload that is not ciphertext at all is not something
    /// another key would fix.
    pub fn needs_key_prompt(&self) -> bool {
        match self {
            RetrievalError::MissingDecryptionKey => true,
            RetrievalError::Decryption(e) => e.is_wrong_key(),
            _ => false,
        }
    }
}

impl<L: Ledger, P: Pinner> Session<L, P> {
    /// Fetch and decrypt the file behind `identifier`
    ///
    /// `identifier` may be an encrypted identifier as listed on the
    /// ledger or a raw CID. An encrypted identifier that does not open
    /// for this account is still requested from the gateways as is,
    /// which is where it fails if it names nothing. The file key must
    /// always be passed in; keys in the local key store are never used
    /// implicitly, so the caller decides which key a view is attempted
    /// with.
    pub async fn retrieve(
        &self,
        identifier: &str,
        key: Option<&EncryptionKey>,
    ) -> Result<DecryptedFile, RetrievalError> {
        let identifier = identifier.trim();
        let (target, payload) = match self.resolve_identifier(identifier) {
            Ok(resolution) => {
                let cid = resolution.into_cid();
                tracing::debug!(%cid, "retrieving file");
                let payload = self.gateways.fetch(&cid).await?;
                (cid.to_string(), payload)
            }
            Err(IdentifierError::Decryption { address, source }) => {
                tracing::debug!(%address, error = %source, "identifier did not open, requesting it literally");
                let payload = self.gateways.fetch_literal(identifier).await?;
                (identifier.to_string(), payload)
            }
            Err(e) => return Err(e.into()),
        };

        if payload.is_empty() {
            return Err(RetrievalError::EmptyPayload { identifier: target });
        }
        // ciphertext is base64 text; anything else cannot be an envelope
        let ciphertext = std::str::from_utf8(&payload).map_err(|_| {
            RetrievalError::Decryption(CryptoError::Malformed(
                "payload is not text".to_string(),
            ))
        })?;

        let key = key.ok_or(RetrievalError::MissingDecryptionKey)?;
        let plaintext =
            crypto::decrypt(ciphertext, key.as_str()).map_err(RetrievalError::Decryption)?;

        let file = DecryptedFile::from_plaintext(plaintext);
        tracing::debug!(identifier = %target, category = %file.category, size = file.bytes.len(), "decrypted file");
        Ok(file)
    }
}
