use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::provider::{Ledger, LedgerError, OwnedFile, PendingTransaction, Receipt, SharedFile};
use crate::account::AccountAddress;
use crate::store::JsonFile;

/// In-process ledger implementing the file registry program
///
/// Every handle created through [`MemoryLedger::connect`] shares the same
/// records and calls as its own account. Mutations are validated when
/// submitted, staged, and applied (and re-validated) on confirmation.
/// When opened from a file the records are written back after every
/// confirmed transaction, which makes it usable as a local dev ledger.
///
/// Staged calls are held in memory until confirmed. A transaction that is
/// never passed to [`Ledger::confirm`] stays staged for the life of the
/// ledger; [`MemoryLedger::pending_transactions`] reports how many are.
#[derive(Debug, Clone)]
pub struct MemoryLedger {
    account: AccountAddress,
    inner: Arc<RwLock<MemoryLedgerInner>>,
}

#[derive(Debug, Default)]
struct MemoryLedgerInner {
    state: LedgerState,
    /// Submitted but unconfirmed calls, by transaction hash
    pending: HashMap<String, PendingCall>,
    nonce: u64,
    file: Option<JsonFile>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerState {
    block: u64,
    /// owner -> files in upload order
    owned: BTreeMap<AccountAddress, Vec<OwnedFile>>,
    /// recipient -> grants in grant order
    shared: BTreeMap<AccountAddress, Vec<SharedRecord>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SharedRecord {
    cid: String,
    timestamp: u64,
    name: String,
    owner: AccountAddress,
    /// The owner's identifier for the file this grant came from
    source_cid: String,
}

#[derive(Debug, Clone)]
struct PendingCall {
    sender: AccountAddress,
    call: Call,
}

#[derive(Debug, Clone)]
enum Call {
    Store {
        cid: String,
        name: String,
    },
    UpdateAccess {
        cid: String,
        user: AccountAddress,
        user_cid: String,
    },
    RemoveAccess {
        cid: String,
        user: AccountAddress,
    },
    DeleteCid {
        cid: String,
    },
}

impl LedgerState {
    fn owned_file(&self, owner: &AccountAddress, cid: &str) -> Result<&OwnedFile, LedgerError> {
        self.owned
            .get(owner)
            .and_then(|files| files.iter().find(|f| f.cid == cid))
            .ok_or_else(|| LedgerError::Reverted("file not found".to_string()))
    }

    fn check(&self, sender: &AccountAddress, call: &Call) -> Result<(), LedgerError> {
        match call {
            Call::Store { cid, .. } => {
                if cid.is_empty() {
                    return Err(LedgerError::Reverted("cid cannot be empty".to_string()));
                }
                if self.owned_file(sender, cid).is_ok() {
                    return Err(LedgerError::Reverted("file already stored".to_string()));
                }
            }
            Call::UpdateAccess { cid, user, user_cid } => {
                let file = self.owned_file(sender, cid)?;
                if user == sender {
                    return Err(LedgerError::Reverted(
                        "cannot share a file with its owner".to_string(),
                    ));
                }
                if user_cid.is_empty() {
                    return Err(LedgerError::Reverted("cid cannot be empty".to_string()));
                }
                if file.people_with_access.contains(user) {
                    return Err(LedgerError::Reverted("user already has access".to_string()));
                }
            }
            Call::RemoveAccess { cid, user } => {
                let file = self.owned_file(sender, cid)?;
                if !file.people_with_access.contains(user) {
                    return Err(LedgerError::Reverted(
                        "user does not have access".to_string(),
                    ));
                }
            }
            Call::DeleteCid { cid } => {
                self.owned_file(sender, cid)?;
            }
        }
        Ok(())
    }

    fn apply(&mut self, sender: &AccountAddress, call: Call, timestamp: u64) -> Result<(), LedgerError> {
        self.check(sender, &call)?;

        match call {
            Call::Store { cid, name } => {
                self.owned.entry(sender.clone()).or_default().push(OwnedFile {
                    cid,
                    timestamp,
                    name,
                    people_with_access: Vec::new(),
                });
            }
            Call::UpdateAccess { cid, user, user_cid } => {
                let file = self.owned_file_mut(sender, &cid)?;
                file.people_with_access.push(user.clone());
                let name = file.name.clone();
                self.shared.entry(user).or_default().push(SharedRecord {
                    cid: user_cid,
                    timestamp,
                    name,
                    owner: sender.clone(),
                    source_cid: cid,
                });
            }
            Call::RemoveAccess { cid, user } => {
                let file = self.owned_file_mut(sender, &cid)?;
                file.people_with_access.retain(|a| a != &user);
                self.drop_grant(&user, sender, &cid);
            }
            Call::DeleteCid { cid } => {
                let files = self.owned.entry(sender.clone()).or_default();
                let Some(index) = files.iter().position(|f| f.cid == cid) else {
                    return Err(LedgerError::Reverted("file not found".to_string()));
                };
                let removed = files.remove(index);
                for user in &removed.people_with_access {
                    self.drop_grant(user, sender, &cid);
                }
            }
        }

        self.block += 1;
        Ok(())
    }

    fn owned_file_mut(
        &mut self,
        owner: &AccountAddress,
        cid: &str,
    ) -> Result<&mut OwnedFile, LedgerError> {
        self.owned
            .get_mut(owner)
            .and_then(|files| files.iter_mut().find(|f| f.cid == cid))
            .ok_or_else(|| LedgerError::Reverted("file not found".to_string()))
    }

    fn drop_grant(&mut self, user: &AccountAddress, owner: &AccountAddress, source_cid: &str) {
        if let Some(grants) = self.shared.get_mut(user) {
            grants.retain(|g| !(g.owner == *owner && g.source_cid == source_cid));
        }
    }
}

impl MemoryLedger {
    /// A fresh, empty ledger with a handle for `account`
    pub fn new(account: AccountAddress) -> Self {
        Self {
            account,
            inner: Arc::new(RwLock::new(MemoryLedgerInner::default())),
        }
    }

    /// Load ledger records from `path` (empty if missing) and keep
    ///  writing them back there after each confirmed transaction
    pub fn open(path: impl Into<PathBuf>, account: AccountAddress) -> Result<Self, LedgerError> {
        let file = JsonFile::new(path);
        let state: LedgerState = file
            .load()
            .map_err(|e| LedgerError::Provider(e.to_string()))?;
        Ok(Self {
            account,
            inner: Arc::new(RwLock::new(MemoryLedgerInner {
                state,
                file: Some(file),
                ..Default::default()
            })),
        })
    }

    /// Another handle onto the same ledger, calling as `account`
    pub fn connect(&self, account: AccountAddress) -> Self {
        Self {
            account,
            inner: self.inner.clone(),
        }
    }

    /// Height of the last confirmed block
    pub fn block(&self) -> Result<u64, LedgerError> {
        Ok(self.read()?.state.block)
    }

    /// Number of submitted transactions not yet confirmed
    pub fn pending_transactions(&self) -> Result<usize, LedgerError> {
        Ok(self.read()?.pending.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryLedgerInner>, LedgerError> {
        self.inner.read().map_err(|e| {
            LedgerError::Provider(format!("failed to acquire read lock: {}", e))
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryLedgerInner>, LedgerError> {
        self.inner.write().map_err(|e| {
            LedgerError::Provider(format!("failed to acquire write lock: {}", e))
        })
    }

    fn submit(&self, call: Call) -> Result<PendingTransaction, LedgerError> {
        let mut inner = self.write()?;
        inner.state.check(&self.account, &call)?;

        inner.nonce += 1;
        let hash = transaction_hash(&self.account, inner.nonce, &call);
        tracing::debug!(tx = %hash, sender = %self.account, ?call, "submitted transaction");
        inner.pending.insert(
            hash.clone(),
            PendingCall {
                sender: self.account.clone(),
                call,
            },
        );

        Ok(PendingTransaction::new(hash))
    }
}

fn transaction_hash(sender: &AccountAddress, nonce: u64, call: &Call) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sender.as_str().as_bytes());
    hasher.update(nonce.to_be_bytes());
    hasher.update(format!("{call:?}").as_bytes());
    format!("0x{}", hex::encode(hasher.finalize()))
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[async_trait]
impl Ledger for MemoryLedger {
    fn account(&self) -> &AccountAddress {
        &self.account
    }

    async fn store(&self, cid: &str, name: &str) -> Result<PendingTransaction, LedgerError> {
        self.submit(Call::Store {
            cid: cid.to_string(),
            name: name.to_string(),
        })
    }

    async fn retrieve(&self) -> Result<Vec<OwnedFile>, LedgerError> {
        Ok(self
            .read()?
            .state
            .owned
            .get(&self.account)
            .cloned()
            .unwrap_or_default())
    }

    async fn retrieve_shared_files(&self) -> Result<Vec<SharedFile>, LedgerError> {
        Ok(self
            .read()?
            .state
            .shared
            .get(&self.account)
            .map(|grants| {
                grants
                    .iter()
                    .map(|g| SharedFile {
                        cid: g.cid.clone(),
                        timestamp: g.timestamp,
                        name: g.name.clone(),
                        owner: g.owner.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update_access(
        &self,
        cid: &str,
        user: &AccountAddress,
        user_cid: &str,
    ) -> Result<PendingTransaction, LedgerError> {
        self.submit(Call::UpdateAccess {
            cid: cid.to_string(),
            user: user.clone(),
            user_cid: user_cid.to_string(),
        })
    }

    async fn remove_access(
        &self,
        cid: &str,
        user: &AccountAddress,
    ) -> Result<PendingTransaction, LedgerError> {
        self.submit(Call::RemoveAccess {
            cid: cid.to_string(),
            user: user.clone(),
        })
    }

    async fn delete_cid(&self, cid: &str) -> Result<PendingTransaction, LedgerError> {
        self.submit(Call::DeleteCid {
            cid: cid.to_string(),
        })
    }

    async fn confirm(&self, tx: PendingTransaction) -> Result<Receipt, LedgerError> {
        let mut inner = self.write()?;
        let PendingCall { sender, call } = inner
            .pending
            .remove(tx.hash())
            .ok_or_else(|| LedgerError::UnknownTransaction(tx.hash().to_string()))?;

        let mut next = inner.state.clone();
        next.apply(&sender, call, now())?;
        if let Some(file) = &inner.file {
            file.flush(&next)
                .map_err(|e| LedgerError::Provider(e.to_string()))?;
        }
        inner.state = next;

        let block = inner.state.block;
        tracing::info!(tx = %tx.hash(), block, "transaction confirmed");
        Ok(Receipt {
            tx_hash: tx.hash().to_string(),
            block,
        })
    }
}
