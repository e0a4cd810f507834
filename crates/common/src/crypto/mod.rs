//! Cryptographic primitives for ipvault
//!
//! This module provides the client-side half of ipvault's security model:
//!
//! - **Content Encryption**: files are sealed under an [`EncryptionKey`] before
//!   they leave the device, so the pinning service and gateways only ever see
//!   ciphertext
//! - **Identifier Encryption**: content identifiers are sealed under each
//!   account address with access, so the public ledger never holds a raw CID
//!
//! # Envelope
//!
//! Both layers use the same passphrase envelope (see [`cipher`]): Argon2id
//! key derivation under a random salt, then AES-256-GCM. Authenticated
//! encryption is what lets decryption tell a wrong key apart from a
//! corrupt or foreign input instead of returning garbage.
//!
//! # Key Handling
//!
//! File keys are kept in the device-local key store and otherwise travel
//! only out of band, from the uploader to whoever should read the file.
//! Nothing in the ledger or on the storage network is enough to decrypt
//! a file without its key.

mod address_cipher;
pub mod cipher;
mod key;

pub use address_cipher::{decrypt_identifier, encrypt_identifier};
pub use cipher::{decrypt, encrypt, is_envelope, CryptoError, ENVELOPE_PREFIX};
pub use key::{EncryptionKey, KeyError, GENERATED_KEY_SIZE};
