//! In-memory session state.
//!
//! The cache is the single source of truth hosts read from. Only the
//! [`Economy`](crate::economy::Economy) mutates it; everything outside the
//! crate gets shared references.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

use crate::model::{AppSettings, CurrencyWallet, Habit, HabitEntry, InventoryState, Wager};

/// Everything a full load produces, in the shape the cache stores it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub habits: Vec<Habit>,
    pub entries: Vec<HabitEntry>,
    pub wallet: CurrencyWallet,
    pub settings: AppSettings,
    pub inventory: InventoryState,
    pub wagers: Vec<Wager>,
}

#[derive(Debug, Clone, Default)]
pub struct LocalCache {
    pub(crate) habits: Vec<Habit>,
    /// At most one entry per habit and day.
    pub(crate) entries: BTreeMap<(Uuid, NaiveDate), HabitEntry>,
    pub(crate) wallet: CurrencyWallet,
    pub(crate) settings: AppSettings,
    pub(crate) inventory: InventoryState,
    /// Newest start date first.
    pub(crate) wagers: Vec<Wager>,
    pub(crate) loaded: bool,
}

impl LocalCache {
    pub fn new(inventory: InventoryState) -> Self {
        Self {
            inventory,
            ..Default::default()
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    /// Habits that have not been extinguished.
    pub fn active_habits(&self) -> impl Iterator<Item = &Habit> {
        self.habits.iter().filter(|habit| habit.is_active())
    }

    pub fn active_habit_ids(&self) -> HashSet<Uuid> {
        self.active_habits().map(|habit| habit.id).collect()
    }

    pub fn habit(&self, id: Uuid) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id == id)
    }

    pub(crate) fn habit_mut(&mut self, id: Uuid) -> Option<&mut Habit> {
        self.habits.iter_mut().find(|habit| habit.id == id)
    }

    /// All entries, grouped by habit then ordered by day.
    pub fn entries(&self) -> impl Iterator<Item = &HabitEntry> {
        self.entries.values()
    }

    pub fn entry(&self, habit_id: Uuid, day: NaiveDate) -> Option<&HabitEntry> {
        self.entries.get(&(habit_id, day))
    }

    /// Entries for one habit, oldest first.
    pub fn entries_for(&self, habit_id: Uuid) -> impl Iterator<Item = &HabitEntry> {
        self.entries
            .range((habit_id, NaiveDate::MIN)..=(habit_id, NaiveDate::MAX))
            .map(|(_, entry)| entry)
    }

    pub fn wallet(&self) -> &CurrencyWallet {
        &self.wallet
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn inventory(&self) -> &InventoryState {
        &self.inventory
    }

    pub fn wagers(&self) -> &[Wager] {
        &self.wagers
    }

    pub fn active_wagers(&self) -> impl Iterator<Item = &Wager> {
        self.wagers.iter().filter(|wager| wager.is_active)
    }

    /// Insert `entry`, or overwrite the existing entry for its habit and day
    /// while keeping that entry's id. Returns the stored entry.
    pub(crate) fn upsert_entry(&mut self, mut entry: HabitEntry) -> &HabitEntry {
        match self.entries.entry((entry.habit_id, entry.date)) {
            Entry::Occupied(mut slot) => {
                entry.id = slot.get().id;
                slot.insert(entry);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(entry),
        }
    }

    /// Remove a habit and every entry that belongs to it.
    pub(crate) fn remove_habit(&mut self, id: Uuid) -> Option<(Habit, Vec<HabitEntry>)> {
        let index = self.habits.iter().position(|habit| habit.id == id)?;
        let habit = self.habits.remove(index);
        let keys: Vec<(Uuid, NaiveDate)> = self.entries_for(id).map(|entry| (entry.habit_id, entry.date)).collect();
        let entries = keys.iter().filter_map(|key| self.entries.remove(key)).collect();
        Some((habit, entries))
    }

    pub(crate) fn insert_wager(&mut self, wager: Wager) {
        let at = self
            .wagers
            .iter()
            .position(|existing| existing.start_date <= wager.start_date)
            .unwrap_or(self.wagers.len());
        self.wagers.insert(at, wager);
    }

    /// Replace all state with `snapshot` and mark the cache loaded.
    pub(crate) fn apply(&mut self, snapshot: CacheSnapshot) {
        self.habits = snapshot.habits;
        self.entries = snapshot
            .entries
            .into_iter()
            .map(|entry| ((entry.habit_id, entry.date), entry))
            .collect();
        self.wallet = snapshot.wallet;
        self.settings = snapshot.settings;
        self.inventory = snapshot.inventory;
        self.wagers = snapshot.wagers;
        self.wagers.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        self.loaded = true;
    }

    /// Drop all session state. `inventory` is the fresh inventory to start from.
    pub(crate) fn clear(&mut self, inventory: InventoryState) {
        *self = Self::new(inventory);
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            habits: self.habits.clone(),
            entries: self.entries.values().cloned().collect(),
            wallet: self.wallet,
            settings: self.settings.clone(),
            inventory: self.inventory.clone(),
            wagers: self.wagers.clone(),
        }
    }
}
