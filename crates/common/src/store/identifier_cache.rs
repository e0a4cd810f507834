use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use super::json_file::JsonFile;
use super::StoreError;
use crate::identifier::{ContentId, EncryptedIdentifier};

/// Local memo of which raw CID an encrypted identifier stands for
///
/// Purely a convenience: the ledger plus the account address can always
/// recompute these mappings, so losing the cache loses nothing.
#[derive(Debug, Clone)]
pub struct IdentifierCache {
    inner: Arc<Mutex<IdentifierCacheInner>>,
}

#[derive(Debug)]
struct IdentifierCacheInner {
    file: Option<JsonFile>,
    entries: BTreeMap<EncryptedIdentifier, ContentId>,
}

impl IdentifierCache {
    pub fn in_memory() -> Self {
        Self::from_parts(None, BTreeMap::new())
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let file = JsonFile::new(path);
        let entries = file.load()?;
        Ok(Self::from_parts(Some(file), entries))
    }

    fn from_parts(
        file: Option<JsonFile>,
        entries: BTreeMap<EncryptedIdentifier, ContentId>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(IdentifierCacheInner { file, entries })),
        }
    }

    pub fn insert(
        &self,
        encrypted: EncryptedIdentifier,
        cid: ContentId,
    ) -> Result<(), StoreError> {
        self.mutate(|entries| {
            entries.insert(encrypted, cid);
        })
    }

    pub fn get(&self, encrypted: &EncryptedIdentifier) -> Option<ContentId> {
        self.inner.lock().entries.get(encrypted).cloned()
    }

    pub fn remove(&self, encrypted: &EncryptedIdentifier) -> Result<Option<ContentId>, StoreError> {
        let mut removed = None;
        self.mutate(|entries| removed = entries.remove(encrypted))?;
        Ok(removed)
    }

    /// Drop every identifier that maps to `cid`, returning how many there were
    pub fn remove_cid(&self, cid: &ContentId) -> Result<usize, StoreError> {
        let mut removed = 0;
        self.mutate(|entries| {
            let before = entries.len();
            entries.retain(|_, mapped| mapped != cid);
            removed = before - entries.len();
        })?;
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn mutate<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<EncryptedIdentifier, ContentId>),
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

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(s: &str) -> ContentId {
        ContentId::parse(s).unwrap()
    }

    #[test]
    fn test_insert_get_remove() {
        let cache = IdentifierCache::in_memory();
        let e1 = EncryptedIdentifier::new("U2FsdGVkX1aaa");
        cache.insert(e1.clone(), cid("Qm123")).unwrap();

        assert_eq!(cache.get(&e1), Some(cid("Qm123")));
        assert_eq!(cache.remove(&e1).unwrap(), Some(cid("Qm123")));
        assert_eq!(cache.get(&e1), None);
    }

    #[test]
    fn test_remove_cid_drops_every_recipient() {
        let cache = IdentifierCache::in_memory();
        cache
            .insert(EncryptedIdentifier::new("U2FsdGVkX1owner"), cid("Qm123"))
            .unwrap();
        cache
            .insert(EncryptedIdentifier::new("U2FsdGVkX1recipient"), cid("Qm123"))
            .unwrap();
        cache
            .insert(EncryptedIdentifier::new("U2FsdGVkX1other"), cid("Qm456"))
            .unwrap();

        assert_eq!(cache.remove_cid(&cid("Qm123")).unwrap(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identifiers.json");
        let e1 = EncryptedIdentifier::new("U2FsdGVkX1aaa");

        IdentifierCache::open(&path)
            .unwrap()
            .insert(e1.clone(), cid("Qm123"))
            .unwrap();

        assert_eq!(IdentifierCache::open(&path).unwrap().get(&e1), Some(cid("Qm123")));
    }
}
