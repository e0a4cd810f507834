use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::json_file::JsonFile;
use super::StoreError;
use crate::crypto::EncryptionKey;
use crate::identifier::ContentId;

/// What the device remembers about a file it uploaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStoreEntry {
    pub key: EncryptionKey,
    pub original_type: String,
    pub original_name: String,
}

/// Device-local mapping from raw CID to the key that decrypts it
///
/// Handles are cheap to clone and share the same entries. With a backing
/// file every mutation is flushed before it returns, so a key is on disk
/// by the time the upload that produced it moves on.
#[derive(Debug, Clone)]
pub struct KeyStore {
    inner: Arc<Mutex<KeyStoreInner>>,
}

#[derive(Debug)]
struct KeyStoreInner {
    file: Option<JsonFile>,
    entries: BTreeMap<ContentId, KeyStoreEntry>,
}

impl KeyStore {
    /// A key store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::from_parts(None, BTreeMap::new())
    }

    /// Open (or start) the key store persisted at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let file = JsonFile::new(path);
        let entries = file.load()?;
        tracing::debug!(path = %file.path().display(), "loaded key store");
        Ok(Self::from_parts(Some(file), entries))
    }

    fn from_parts(file: Option<JsonFile>, entries: BTreeMap<ContentId, KeyStoreEntry>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(KeyStoreInner { file, entries })),
        }
    }

    pub fn save(
        &self,
        cid: &ContentId,
        key: EncryptionKey,
        original_type: impl Into<String>,
        original_name: impl Into<String>,
    ) -> Result<(), StoreError> {
        let entry = KeyStoreEntry {
            key,
            original_type: original_type.into(),
            original_name: original_name.into(),
        };
        self.mutate(|entries| {
            entries.insert(cid.clone(), entry);
        })
    }

    pub fn lookup(&self, cid: &ContentId) -> Option<KeyStoreEntry> {
        self.inner.lock().entries.get(cid).cloned()
    }

    /// Remove the entry for `cid`, returning it if there was one
    pub fn delete(&self, cid: &ContentId) -> Result<Option<KeyStoreEntry>, StoreError> {
        let mut removed = None;
        self.mutate(|entries| removed = entries.remove(cid))?;
        Ok(removed)
    }

    /// All entries, ordered by CID
    pub fn entries(&self) -> Vec<(ContentId, KeyStoreEntry)> {
        self.inner
            .lock()
            .entries
            .iter()
            .map(|(cid, entry)| (cid.clone(), entry.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // changes are only committed in memory once they are on disk
    fn mutate<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<ContentId, KeyStoreEntry>),
    {
        let mut inner = self.inner.lock();
        let mut next = inner.entries.clone();
        f(&mut next);
        if let Some(file) = &inner.file {
            file.flush(&next)?;
        }
        inner.entries = next;
        Ok(())
    }
}
