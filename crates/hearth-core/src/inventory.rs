//! Consumable counts, multiplier activation and cosmetic unlocks.
//!
//! Every operation either applies completely to the [`InventoryState`] it is
//! handed or returns an [`EconomyError`] without touching it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EconomyError;
use crate::model::{
    Consumable, Cosmetic, Habit, InventoryState, MultiplierTier, MultiplierWindow, BASE_HABIT_SLOTS,
    DEFAULT_FLAME_COLOR, DEFAULT_THEME,
};

/// Days restored by one recovery pass.
pub const RECOVERY_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryConfig {
    #[serde(default = "default_base_slots")]
    pub base_habit_slots: u32,
    #[serde(default = "default_max_slots")]
    pub max_habit_slots: u32,
    /// Upper bound for any single consumable count.
    #[serde(default = "default_consumable_cap")]
    pub consumable_cap: u32,
}

fn default_base_slots() -> u32 {
    BASE_HABIT_SLOTS
}
fn default_max_slots() -> u32 {
    10
}
fn default_consumable_cap() -> u32 {
    99
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            base_habit_slots: default_base_slots(),
            max_habit_slots: default_max_slots(),
            consumable_cap: default_consumable_cap(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InventoryManager {
    config: InventoryConfig,
}

impl InventoryManager {
    pub fn new(config: InventoryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    /// Inventory for a user who has never bought anything.
    pub fn fresh_state(&self) -> InventoryState {
        InventoryState::with_slots(self.config.base_habit_slots)
    }

    /// Add `n` units of `kind`, refusing to exceed the consumable cap.
    pub fn add_consumable(&self, inventory: &mut InventoryState, kind: Consumable, n: u32) -> Result<u32, EconomyError> {
        let count = inventory.counts.count_mut(kind);
        let next = count.saturating_add(n);
        if next > self.config.consumable_cap {
            return Err(EconomyError::ConsumableCapReached {
                kind,
                max: self.config.consumable_cap,
            });
        }
        *count = next;
        Ok(next)
    }

    pub fn add_freeze(&self, inventory: &mut InventoryState, n: u32) -> Result<u32, EconomyError> {
        self.add_consumable(inventory, Consumable::StreakFreeze, n)
    }

    /// Spend one freeze if any are held.
    pub fn consume_freeze_if_available(&self, inventory: &mut InventoryState) -> bool {
        let freezes = &mut inventory.counts.streak_freezes;
        if *freezes == 0 {
            return false;
        }
        *freezes -= 1;
        debug!(remaining = *freezes, "streak freeze consumed");
        true
    }

    /// Start a multiplier window, replacing whatever window was running.
    pub fn activate_multiplier(
        &self,
        inventory: &mut InventoryState,
        now: DateTime<Utc>,
        hours: i64,
        strength: f64,
    ) -> MultiplierWindow {
        let window = MultiplierWindow::starting_at(now, hours, strength);
        inventory.counts.active_multiplier = Some(window);
        window
    }

    /// Spend one charge of `tier` and start its window.
    pub fn use_charge(
        &self,
        inventory: &mut InventoryState,
        tier: MultiplierTier,
        now: DateTime<Utc>,
    ) -> Result<MultiplierWindow, EconomyError> {
        let kind = Consumable::Multiplier(tier);
        take_one(inventory, kind)?;
        Ok(self.activate_multiplier(inventory, now, tier.hours(), tier.strength()))
    }

    /// Restore up to seven days of streak, never past the best streak.
    ///
    /// Refused when no pass is held or the habit is already done for `today`.
    pub fn use_streak_recovery(
        &self,
        inventory: &mut InventoryState,
        habit: &mut Habit,
        today: NaiveDate,
    ) -> Result<u32, EconomyError> {
        if inventory.counts.streak_recovery_passes == 0 {
            return Err(EconomyError::NoneLeft(Consumable::StreakRecovery));
        }
        if habit.completed_on(today) {
            return Err(EconomyError::AlreadyCompletedToday);
        }
        inventory.counts.streak_recovery_passes -= 1;
        habit.current_streak = habit
            .best_streak
            .min(habit.current_streak.saturating_add(RECOVERY_DAYS));
        Ok(habit.current_streak)
    }

    /// Spend one auto-complete pass. The caller then checks in every active habit.
    pub fn take_auto_complete_pass(&self, inventory: &mut InventoryState) -> Result<(), EconomyError> {
        take_one(inventory, Consumable::AutoCompletePass)
    }

    pub fn grant_habit_slot(&self, inventory: &mut InventoryState) -> Result<u32, EconomyError> {
        let slots = &mut inventory.counts.max_habit_slots;
        if *slots >= self.config.max_habit_slots {
            return Err(EconomyError::SlotCapReached {
                max: self.config.max_habit_slots,
            });
        }
        *slots += 1;
        Ok(*slots)
    }

    pub fn can_add_habit(&self, inventory: &InventoryState, habit_count: usize) -> bool {
        habit_count < inventory.counts.max_habit_slots as usize
    }

    /// Whether `cosmetic` is owned. Default color and theme are always owned.
    pub fn owns(&self, inventory: &InventoryState, cosmetic: &Cosmetic) -> bool {
        match cosmetic {
            Cosmetic::FlameColor(key) => key == DEFAULT_FLAME_COLOR || inventory.owned_flame_colors.contains(key),
            Cosmetic::Theme(key) => key == DEFAULT_THEME || inventory.owned_themes.contains(key),
            Cosmetic::Badge(key) => inventory.unlocked_badges.contains(key),
        }
    }

    /// Insert `cosmetic` into its ownership set. Returns false if it was already there.
    pub fn unlock_cosmetic(&self, inventory: &mut InventoryState, cosmetic: &Cosmetic) -> bool {
        let key = cosmetic.key().to_string();
        match cosmetic {
            Cosmetic::FlameColor(_) => inventory.owned_flame_colors.insert(key),
            Cosmetic::Theme(_) => inventory.owned_themes.insert(key),
            Cosmetic::Badge(_) => inventory.unlocked_badges.insert(key),
        }
    }
}

fn take_one(inventory: &mut InventoryState, kind: Consumable) -> Result<(), EconomyError> {
    let count = inventory.counts.count_mut(kind);
    if *count == 0 {
        return Err(EconomyError::NoneLeft(kind));
    }
    *count -= 1;
    Ok(())
}
