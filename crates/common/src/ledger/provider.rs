use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::account::AccountAddress;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The ledger rejected the call
    #[error("transaction reverted: {0}")]
    Reverted(String),
    /// A transaction handle the ledger has no record of,
    ///  e.g. one that was already confirmed
    #[error("unknown transaction {0}")]
    UnknownTransaction(String),
    #[error("unhandled ledger provider error: {0}")]
    Provider(String),
}

/// A file record owned by the calling account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedFile {
    /// Identifier as stored on the ledger, normally an
    ///  encrypted identifier sealed for the owner
    pub cid: String,
    /// Unix timestamp (seconds) of the `store` call
    pub timestamp: u64,
    pub name: String,
    pub people_with_access: Vec<AccountAddress>,
}

/// A file record some other account shared with the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedFile {
    /// Identifier sealed for the caller
    pub cid: String,
    pub timestamp: u64,
    pub name: String,
    pub owner: AccountAddress,
}

/// A submitted, not yet final, mutating call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[must_use = "a transaction has no effect until it is confirmed"]
pub struct PendingTransaction {
    hash: String,
}

impl PendingTransaction {
    pub fn new(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }
}

/// Proof that a transaction reached finality
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: String,
    pub block: u64,
}

/// The ledger program holding file records and access grants
///
/// A handle is bound to one account, the sender of every call made
/// through it. Mutating calls only submit; nothing is final until
/// [`Ledger::confirm`] returns a receipt for the transaction.
///
/// Every submitted transaction must be passed to [`Ledger::confirm`].
/// A provider may hold the call until then, whatever the outcome.
#[async_trait]
pub trait Ledger: Send + Sync + Debug + Clone + 'static {
    /// The account calls are made as
    fn account(&self) -> &AccountAddress;

    /// Record a new file owned by the caller
    ///
    /// # Arguments
    /// * `cid` - The identifier to record (encrypted for the caller)
    /// * `name` - The original file name
    async fn store(&self, cid: &str, name: &str) -> Result<PendingTransaction, LedgerError>;

    /// List files owned by the caller
    async fn retrieve(&self) -> Result<Vec<OwnedFile>, LedgerError>;

    /// List files other accounts have shared with the caller
    async fn retrieve_shared_files(&self) -> Result<Vec<SharedFile>, LedgerError>;

    /// Grant `user` access to the caller's file `cid`
    ///
    /// # Arguments
    /// * `cid` - The file as recorded by the owner
    /// * `user` - The recipient
    /// * `user_cid` - The identifier re-encrypted for `user`
    async fn update_access(
        &self,
        cid: &str,
        user: &AccountAddress,
        user_cid: &str,
    ) -> Result<PendingTransaction, LedgerError>;

    /// Withdraw `user`'s access to the caller's file `cid`
    async fn remove_access(
        &self,
        cid: &str,
        user: &AccountAddress,
    ) -> Result<PendingTransaction, LedgerError>;

    /// Delete the caller's file `cid` along with every grant on it
    async fn delete_cid(&self, cid: &str) -> Result<PendingTransaction, LedgerError>;

    /// Wait for `tx` to reach finality
    ///
    /// Should fail with `Err(LedgerError::Reverted)` if the call
    /// could not be applied by the time it was included. Either way the
    /// provider forgets `tx` afterwards.
    async fn confirm(&self, tx: PendingTransaction) -> Result<Receipt, LedgerError>;
}
