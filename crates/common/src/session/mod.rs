//! A connected account and everything that acts on its behalf
//!
//! A [`Session`] is created when an account connects and torn down
//! when it disconnects. It holds the active encryption key, the
//! device-local key store and identifier cache, and the collaborators
//! the pipelines talk to: the ledger, the pinning service and the
//! retrieval gateways. Nothing here is global; two sessions for two
//! accounts can live side by side in one process.

mod retrieval;
mod sharing;
mod upload;

use crate::account::AccountAddress;
use crate::crypto::{decrypt_identifier, EncryptionKey, KeyError};
use crate::gateway::GatewayFetcher;
use crate::identifier::{
    is_likely_encrypted_identifier, ContentId, EncryptedIdentifier, IdentifierError, Resolution,
};
use crate::ledger::{Ledger, LedgerError, OwnedFile, SharedFile};
use crate::pinning::Pinner;
use crate::store::{IdentifierCache, KeyStore};

pub use retrieval::RetrievalError;
pub use sharing::{DeleteError, ShareReceipt, SharingError};
pub use upload::{FileUpload, UploadError, UploadReceipt, UploadStage};

/// Files visible to the connected account
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileListing {
    /// Files the account uploaded
    pub owned: Vec<OwnedFile>,
    /// Files other accounts granted it access to
    pub shared: Vec<SharedFile>,
}

#[derive(Debug)]
pub struct Session<L: Ledger, P: Pinner> {
    ledger: L,
    pinner: P,
    gateways: GatewayFetcher,
    key_store: KeyStore,
    identifiers: IdentifierCache,
    active_key: Option<EncryptionKey>,
}

impl<L: Ledger, P: Pinner> Session<L, P> {
    /// Start a session for the account `ledger` is bound to
    ///
    /// No key is active until one is generated or set.
    pub fn connect(
        ledger: L,
        pinner: P,
        gateways: GatewayFetcher,
        key_store: KeyStore,
        identifiers: IdentifierCache,
    ) -> Self {
        tracing::info!(account = %ledger.account(), "session connected");
        Self {
            ledger,
            pinner,
            gateways,
            key_store,
            identifiers,
            active_key: None,
        }
    }

    /// End the session, dropping the active key
    ///
    /// The key store and identifier cache are device state and stay
    /// on disk for the next session.
    pub fn disconnect(self) {
        tracing::info!(account = %self.ledger.account(), "session disconnected");
    }

    pub fn account(&self) -> &AccountAddress {
        self.ledger.account()
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn pinner(&self) -> &P {
        &self.pinner
    }

    pub fn gateways(&self) -> &GatewayFetcher {
        &self.gateways
    }

    pub fn key_store(&self) -> &KeyStore {
        &self.key_store
    }

    pub fn identifiers(&self) -> &IdentifierCache {
        &self.identifiers
    }

    /// The key new uploads are encrypted with, if any
    pub fn active_key(&self) -> Option<&EncryptionKey> {
        self.active_key.as_ref()
    }

    /// Generate a random key and make it the active one
    pub fn generate_key(&mut self) -> Result<&EncryptionKey, KeyError> {
        let key = EncryptionKey::generate()?;
        tracing::debug!("generated new encryption key");
        Ok(&*self.active_key.insert(key))
    }

    /// Make a user-chosen key the active one
    pub fn set_custom_key(&mut self, key: &str) -> Result<&EncryptionKey, KeyError> {
        let key = EncryptionKey::custom(key)?;
        tracing::debug!("set custom encryption key");
        Ok(&*self.active_key.insert(key))
    }

    /// Everything the account owns or has been granted access to
    pub async fn list_files(&self) -> Result<FileListing, LedgerError> {
        let owned = self.ledger.retrieve().await?;
        let shared = self.ledger.retrieve_shared_files().await?;
        Ok(FileListing { owned, shared })
    }

    /// Map an identifier as it appears on the ledger back to a raw CID
    ///
    /// Envelopes are opened with the connected address, falling back to
    /// the identifier cache. Anything else is taken as a literal CID.
    ///
    /// # Errors
    ///
    /// [`IdentifierError::Decryption`] for an envelope that neither opens
    /// for this account nor is cached, and
    /// [`IdentifierError::InvalidContentId`] for a non-envelope that is
    /// not a CID.
    pub fn resolve_identifier(&self, identifier: &str) -> Result<Resolution, IdentifierError> {
        let identifier = identifier.trim();
        if !is_likely_encrypted_identifier(identifier) {
            return ContentId::parse(identifier).map(Resolution::Literal);
        }

        let encrypted = EncryptedIdentifier::new(identifier);
        match decrypt_identifier(&encrypted, self.account()) {
            Ok(cid) => Ok(Resolution::Decrypted(cid)),
            Err(e) => match self.identifiers.get(&encrypted) {
                Some(cid) => Ok(Resolution::Cached(cid)),
                None => {
                    tracing::debug!(error = %e, "identifier did not open for this account");
                    Err(e)
                }
            },
        }
    }

    /// Remember which CID `encrypted` stands for
    ///
    /// The cache is a convenience, so failing to write it is logged
    /// and otherwise ignored.
    fn remember(&self, encrypted: &EncryptedIdentifier, cid: &ContentId) {
        if let Err(e) = self.identifiers.insert(encrypted.clone(), cid.clone()) {
            tracing::warn!(error = %e, %cid, "failed to update identifier cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::encrypt_identifier;
    use crate::ledger::MemoryLedger;
    use crate::pinning::{EncryptedBlob, PinningError};

    #[derive(Debug)]
    struct NoPinner;

    #[async_trait::async_trait]
    impl Pinner for NoPinner {
        async fn pin(&self, _blob: &EncryptedBlob) -> Result<ContentId, PinningError> {
            Err(PinningError::MissingHash {
                body: String::new(),
            })
        }
    }

    const OWNER: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
    const OTHER: &str = "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359";

    fn session(account: &str) -> Session<MemoryLedger, NoPinner> {
        let ledger = MemoryLedger::new(AccountAddress::parse(account).unwrap());
        Session::connect(
            ledger,
            NoPinner,
            GatewayFetcher::from_urls(&["http://127.0.0.1:1"]).unwrap(),
            KeyStore::in_memory(),
            IdentifierCache::in_memory(),
        )
    }

    #[test]
    fn test_key_lifecycle() {
        let mut session = session(OWNER);
        assert!(session.active_key().is_none());

        let generated = session.generate_key().unwrap().clone();
        assert_eq!(session.active_key(), Some(&generated));

        session.set_custom_key("k1").unwrap();
        assert_eq!(session.active_key().unwrap().as_str(), "k1");

        assert!(matches!(session.set_custom_key("  "), Err(KeyError::Empty)));
        // a rejected key leaves the previous one active
        assert_eq!(session.active_key().unwrap().as_str(), "k1");
    }

    #[test]
    fn test_resolve_own_identifier() {
        let session = session(OWNER);
        let cid = ContentId::parse("Qm123").unwrap();
        let sealed = encrypt_identifier(&cid, session.account()).unwrap();

        let resolved = session.resolve_identifier(sealed.as_str()).unwrap();
        assert_eq!(resolved, Resolution::Decrypted(cid));
    }

    #[test]
    fn test_resolve_falls_back_to_cache() {
        let session = session(OWNER);
        let cid = ContentId::parse("Qm123").unwrap();
        let other = AccountAddress::parse(OTHER).unwrap();
        let sealed = encrypt_identifier(&cid, &other).unwrap();

        // sealed for someone else and not cached: the decryption failure is kept
        assert!(matches!(
            session.resolve_identifier(sealed.as_str()),
            Err(IdentifierError::Decryption { address, .. }) if address.as_str() == OWNER
        ));

        session.remember(&sealed, &cid);
        assert_eq!(
            session.resolve_identifier(sealed.as_str()).unwrap(),
            Resolution::Cached(cid)
        );
    }

    #[test]
    fn test_resolve_literal() {
        let session = session(OWNER);
        assert_eq!(
            session.resolve_identifier(" Qm123 ").unwrap(),
            Resolution::Literal(ContentId::parse("Qm123").unwrap())
        );
        assert!(session.resolve_identifier("not a cid").is_err());
    }

    #[tokio::test]
    async fn test_list_files_empty() {
        let session = session(OWNER);
        assert_eq!(session.list_files().await.unwrap(), FileListing::default());
    }
}
