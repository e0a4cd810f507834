/**
 * Ledger account addresses.
 *  Validated, normalized `0x` addresses used both
 *  as ledger principals and as identifier keys.
 */
pub mod account;
/**
 * Cryptographic types and operations.
 *  - Passphrase-keyed content envelopes
 *  - File encryption keys
 *  - Address-keyed content identifier encryption
 */
pub mod crypto;
/**
 * Retrieval endpoints that resolve a content
 *  identifier to the bytes pinned under it.
 */
pub mod gateway;
/**
 * Content identifiers as handed out by the
 *  storage network, and their per-recipient
 *  encrypted form.
 */
pub mod identifier;
/**
 * The ledger collaborator: ownership and
 *  access-grant records for encrypted identifiers.
 */
pub mod ledger;
/**
 * Decrypted payload handling: data URLs and
 *  content classification for presentation.
 */
pub mod payload;
/**
 * Pinning service client used to persist
 *  ciphertext into the storage network.
 */
pub mod pinning;
/**
 * The session context and the upload, retrieval,
 *  sharing and deletion pipelines built on it.
 */
pub mod session;
/**
 * Device-local persistence: the key store and
 *  the encrypted identifier cache.
 */
pub mod store;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::account::{AccountAddress, AddressError};
    pub use crate::crypto::{CryptoError, EncryptionKey, KeyError};
    pub use crate::gateway::{GatewayError, GatewayFetcher};
    pub use crate::identifier::{
        is_likely_encrypted_identifier, ContentId, EncryptedIdentifier, IdentifierError,
    };
    pub use crate::ledger::{Ledger, LedgerError, MemoryLedger, OwnedFile, Receipt, SharedFile};
    pub use crate::payload::{ContentCategory, DecryptedFile};
    pub use crate::pinning::{PinataClient, Pinner, PinningError};
    pub use crate::session::{
        DeleteError, FileListing, FileUpload, RetrievalError, Session, ShareReceipt, SharingError,
        UploadError, UploadReceipt, UploadStage,
    };
    pub use crate::store::{IdentifierCache, KeyStore, KeyStoreEntry, StoreError};
    pub use crate::version::BuildInfo;
}
