//! In-process document store.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::sync::store::RemoteStore;
use crate::sync::types::{Collection, Document, SyncError};

type Namespace = HashMap<(String, Collection), BTreeMap<String, Document>>;

/// [`RemoteStore`] kept in memory. Collections can be switched into a failing
/// state to exercise degraded loads and dropped writes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<Namespace>,
    failing: Mutex<HashSet<Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call touching `collection` fail until [`MemoryStore::heal`].
    pub fn fail(&self, collection: Collection) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(collection);
        }
    }

    pub fn heal(&self, collection: Collection) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.remove(&collection);
        }
    }

    /// Number of documents stored for `user` in `collection`.
    pub fn count(&self, user: &str, collection: Collection) -> usize {
        self.docs
            .lock()
            .map(|docs| docs.get(&(user.to_string(), collection)).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    fn check(&self, collection: Collection) -> Result<(), SyncError> {
        let failing = self
            .failing
            .lock()
            .map_err(|_| SyncError::Unavailable("memory store lock poisoned".into()))?;
        if failing.contains(&collection) {
            return Err(SyncError::Unavailable(format!("{collection} is offline")));
        }
        Ok(())
    }

    fn docs(&self) -> Result<MutexGuard<'_, Namespace>, SyncError> {
        self.docs
            .lock()
            .map_err(|_| SyncError::Unavailable("memory store lock poisoned".into()))
    }
}

impl RemoteStore for MemoryStore {
    fn list(&self, user: &str, collection: Collection) -> Result<Vec<Document>, SyncError> {
        self.check(collection)?;
        let docs = self.docs()?;
        Ok(docs
            .get(&(user.to_string(), collection))
            .map(|coll| coll.values().cloned().collect())
            .unwrap_or_default())
    }

    fn get(&self, user: &str, collection: Collection, id: &str) -> Result<Option<Document>, SyncError> {
        self.check(collection)?;
        let docs = self.docs()?;
        Ok(docs
            .get(&(user.to_string(), collection))
            .and_then(|coll| coll.get(id).cloned()))
    }

    fn put(&self, user: &str, collection: Collection, document: Document) -> Result<(), SyncError> {
        self.check(collection)?;
        let mut docs = self.docs()?;
        let coll = docs.entry((user.to_string(), collection)).or_default();
        let newer = coll
            .get(&document.id)
            .map_or(true, |existing| document.updated_at >= existing.updated_at);
        if newer {
            coll.insert(document.id.clone(), document);
        }
        Ok(())
    }

    fn delete(&self, user: &str, collection: Collection, id: &str) -> Result<(), SyncError> {
        self.check(collection)?;
        let mut docs = self.docs()?;
        if let Some(coll) = docs.get_mut(&(user.to_string(), collection)) {
            coll.remove(id);
        }
        Ok(())
    }

    fn delete_collection(&self, user: &str, collection: Collection) -> Result<(), SyncError> {
        self.check(collection)?;
        self.docs()?.remove(&(user.to_string(), collection));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn doc(id: &str, v: i64, at: chrono::DateTime<Utc>) -> Document {
        Document {
            id: id.to_string(),
            data: serde_json::json!({ "v": v }),
            updated_at: at,
        }
    }

    #[test]
    fn put_is_last_write_wins() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.put("u", Collection::Wallet, doc("current", 2, now)).unwrap();
        store
            .put("u", Collection::Wallet, doc("current", 1, now - Duration::seconds(5)))
            .unwrap();
        let stored = store.get("u", Collection::Wallet, "current").unwrap().unwrap();
        assert_eq!(stored.data["v"], 2);
    }

    #[test]
    fn namespaces_are_isolated() {
        let store = MemoryStore::new();
        store.put("alice", Collection::Habits, doc("h1", 1, Utc::now())).unwrap();
        assert_eq!(store.list("bob", Collection::Habits).unwrap().len(), 0);
        assert_eq!(store.count("alice", Collection::Habits), 1);
    }

    #[test]
    fn failing_collection_rejects_calls() {
        let store = MemoryStore::new();
        store.fail(Collection::Entries);
        assert!(store.list("u", Collection::Entries).is_err());
        assert!(store.list("u", Collection::Habits).is_ok());
        store.heal(Collection::Entries);
        assert!(store.list("u", Collection::Entries).is_ok());
    }

    #[test]
    fn delete_collection_empties_it() {
        let store = MemoryStore::new();
        store.put("u", Collection::Wagers, doc("w1", 1, Utc::now())).unwrap();
        store.put("u", Collection::Wagers, doc("w2", 1, Utc::now())).unwrap();
        store.delete_collection("u", Collection::Wagers).unwrap();
        assert_eq!(store.count("u", Collection::Wagers), 0);
    }
}
