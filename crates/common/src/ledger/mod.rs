mod memory;
mod provider;

pub use memory::MemoryLedger;
pub use provider::{Ledger, LedgerError, OwnedFile, PendingTransaction, Receipt, SharedFile};
