//! Typed reads and writes against a [`RemoteStore`].
//!
//! Every call blocks. The economy moves them onto the blocking pool; the
//! gateway itself knows nothing about tokio.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::model::{AppSettings, CurrencyWallet, Habit, HabitEntry, InventoryCounts, InventoryState, PurchasedItem, Wager};
use crate::sync::store::RemoteStore;
use crate::sync::types::{Collection, Document, SyncError, UserIdentity, WriteOp, SINGLETON_ID};

/// Body of a membership document in the cosmetic sub-collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedKey {
    pub key: String,
}

/// Remote access scoped to one signed-in user.
#[derive(Clone)]
pub struct RemoteSyncGateway {
    store: Arc<dyn RemoteStore>,
    user: UserIdentity,
}

impl std::fmt::Debug for RemoteSyncGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSyncGateway").field("user", &self.user).finish()
    }
}

impl RemoteSyncGateway {
    pub fn new(store: Arc<dyn RemoteStore>, user: UserIdentity) -> Self {
        Self { store, user }
    }

    pub fn user(&self) -> &UserIdentity {
        &self.user
    }

    fn uid(&self) -> &str {
        &self.user.uid
    }

    /// Decode every document in `collection`, skipping ones that do not parse.
    fn list_decoded<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>, SyncError> {
        let documents = self.store.list(self.uid(), collection)?;
        let mut values = Vec::with_capacity(documents.len());
        for document in documents {
            match document.decode::<T>() {
                Ok(value) => values.push(value),
                Err(e) => warn!(%collection, id = %document.id, error = %e, "skipping undecodable document"),
            }
        }
        Ok(values)
    }

    fn singleton<T: DeserializeOwned + Default>(&self, collection: Collection) -> Result<T, SyncError> {
        match self.store.get(self.uid(), collection, SINGLETON_ID)? {
            Some(document) => match document.decode() {
                Ok(value) => Ok(value),
                Err(e) => {
                    warn!(%collection, error = %e, "undecodable singleton, using defaults");
                    Ok(T::default())
                }
            },
            None => Ok(T::default()),
        }
    }

    fn key_set(&self, collection: Collection) -> Result<BTreeSet<String>, SyncError> {
        Ok(self
            .list_decoded::<OwnedKey>(collection)?
            .into_iter()
            .map(|owned| owned.key)
            .collect())
    }

    pub fn load_habits(&self) -> Result<Vec<Habit>, SyncError> {
        let mut habits: Vec<Habit> = self.list_decoded(Collection::Habits)?;
        habits.sort_by_key(|habit| habit.created_at);
        Ok(habits)
    }

    /// All entries, oldest day first.
    pub fn load_entries(&self) -> Result<Vec<HabitEntry>, SyncError> {
        let mut entries: Vec<HabitEntry> = self.list_decoded(Collection::Entries)?;
        entries.sort_by_key(|entry| entry.date);
        Ok(entries)
    }

    pub fn load_wallet(&self) -> Result<CurrencyWallet, SyncError> {
        self.singleton(Collection::Wallet)
    }

    pub fn load_settings(&self) -> Result<AppSettings, SyncError> {
        self.singleton(Collection::Settings)
    }

    /// Inventory counts plus the cosmetic sub-collections.
    ///
    /// `fresh` supplies the counts used when no inventory document exists yet.
    /// A sub-collection that fails to load is left empty; only a failure on
    /// the counts document fails the whole load.
    pub fn load_inventory(&self, fresh: InventoryState) -> Result<InventoryState, SyncError> {
        let counts = match self.store.get(self.uid(), Collection::Inventory, SINGLETON_ID)? {
            Some(document) => document.decode::<InventoryCounts>().unwrap_or_else(|e| {
                warn!(error = %e, "undecodable inventory, using fresh counts");
                fresh.counts.clone()
            }),
            None => fresh.counts.clone(),
        };

        let mut state = InventoryState { counts, ..fresh };
        let sets = [
            (Collection::OwnedFlameColors, &mut state.owned_flame_colors),
            (Collection::UnlockedBadges, &mut state.unlocked_badges),
            (Collection::OwnedThemes, &mut state.owned_themes),
        ];
        for (collection, target) in sets {
            match self.key_set(collection) {
                Ok(keys) => *target = keys,
                Err(e) => warn!(%collection, error = %e, "inventory sub-collection unavailable"),
            }
        }
        match self.list_decoded::<PurchasedItem>(Collection::PurchasedItems) {
            Ok(mut items) => {
                items.sort_by_key(|item| item.purchased_at);
                state.purchased_items = items;
            }
            Err(e) => warn!(error = %e, "purchase history unavailable"),
        }
        Ok(state)
    }

    /// Wagers, newest start date first.
    pub fn load_wagers(&self) -> Result<Vec<Wager>, SyncError> {
        let mut wagers: Vec<Wager> = self.list_decoded(Collection::Wagers)?;
        wagers.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(wagers)
    }

    /// Apply one write.
    pub fn apply(&self, op: &WriteOp) -> Result<(), SyncError> {
        debug!(key = %op.key(), "remote write");
        match op {
            WriteOp::Put { collection, document } => self.store.put(self.uid(), *collection, document.clone()),
            WriteOp::Delete { collection, id } => self.store.delete(self.uid(), *collection, id),
        }
    }

    pub fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, SyncError> {
        self.store.get(self.uid(), collection, id)
    }

    /// Delete every collection for this user.
    ///
    /// Keeps going after a failure so as much as possible is removed, then
    /// reports the collections that could not be deleted.
    pub fn delete_account(&self) -> Result<(), SyncError> {
        let mut failed = Vec::new();
        for collection in Collection::ALL {
            if let Err(e) = self.store.delete_collection(self.uid(), collection) {
                warn!(%collection, error = %e, "failed to delete collection");
                failed.push(collection);
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            Err(SyncError::PartialDelete { failed })
        }
    }
}
