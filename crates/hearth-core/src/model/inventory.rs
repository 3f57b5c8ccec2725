use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::shop::PurchasedItem;

/// Habit slots every user starts with.
pub const BASE_HABIT_SLOTS: u32 = 3;

/// The three multiplier charge tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiplierTier {
    /// 24 hours at 1.5x
    Day,
    /// 7 days at 1.5x
    Week,
    /// 24 hours at 2.0x
    Mega,
}

impl MultiplierTier {
    pub const ALL: [MultiplierTier; 3] = [MultiplierTier::Day, MultiplierTier::Week, MultiplierTier::Mega];

    pub fn hours(self) -> i64 {
        match self {
            MultiplierTier::Day => 24,
            MultiplierTier::Week => 24 * 7,
            MultiplierTier::Mega => 24,
        }
    }

    pub fn strength(self) -> f64 {
        match self {
            MultiplierTier::Day | MultiplierTier::Week => 1.5,
            MultiplierTier::Mega => 2.0,
        }
    }
}

impl fmt::Display for MultiplierTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MultiplierTier::Day => "24h multiplier",
            MultiplierTier::Week => "7-day multiplier",
            MultiplierTier::Mega => "mega multiplier",
        };
        f.write_str(label)
    }
}

/// Anything held as a decrementing count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consumable {
    StreakFreeze,
    StreakRecovery,
    Multiplier(MultiplierTier),
    AutoCompletePass,
}

impl fmt::Display for Consumable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Consumable::StreakFreeze => f.write_str("streak freezes"),
            Consumable::StreakRecovery => f.write_str("streak recovery passes"),
            Consumable::Multiplier(tier) => write!(f, "{tier} charges"),
            Consumable::AutoCompletePass => f.write_str("auto-complete passes"),
        }
    }
}

/// The single active reward multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiplierWindow {
    pub until: DateTime<Utc>,
    pub strength: f64,
}

impl MultiplierWindow {
    pub fn starting_at(now: DateTime<Utc>, hours: i64, strength: f64) -> Self {
        Self {
            until: now + Duration::hours(hours),
            strength,
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.until
    }
}

fn default_slots() -> u32 {
    BASE_HABIT_SLOTS
}

/// Scalar inventory fields, stored remotely as one `inventory` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryCounts {
    #[serde(default)]
    pub streak_freezes: u32,
    #[serde(default)]
    pub streak_recovery_passes: u32,
    #[serde(default)]
    pub multiplier_24h: u32,
    #[serde(default)]
    pub multiplier_7d: u32,
    #[serde(default)]
    pub mega_multipliers: u32,
    #[serde(default)]
    pub auto_complete_passes: u32,
    #[serde(default = "default_slots")]
    pub max_habit_slots: u32,
    #[serde(default)]
    pub active_multiplier: Option<MultiplierWindow>,
    /// Flame color applied to habits without their own override.
    #[serde(default)]
    pub active_flame_color: Option<String>,
}

impl InventoryCounts {
    pub fn with_slots(max_habit_slots: u32) -> Self {
        Self {
            streak_freezes: 0,
            streak_recovery_passes: 0,
            multiplier_24h: 0,
            multiplier_7d: 0,
            mega_multipliers: 0,
            auto_complete_passes: 0,
            max_habit_slots,
            active_multiplier: None,
            active_flame_color: None,
        }
    }

    pub fn count(&self, kind: Consumable) -> u32 {
        match kind {
            Consumable::StreakFreeze => self.streak_freezes,
            Consumable::StreakRecovery => self.streak_recovery_passes,
            Consumable::Multiplier(MultiplierTier::Day) => self.multiplier_24h,
            Consumable::Multiplier(MultiplierTier::Week) => self.multiplier_7d,
            Consumable::Multiplier(MultiplierTier::Mega) => self.mega_multipliers,
            Consumable::AutoCompletePass => self.auto_complete_passes,
        }
    }

    pub fn count_mut(&mut self, kind: Consumable) -> &mut u32 {
        match kind {
            Consumable::StreakFreeze => &mut self.streak_freezes,
            Consumable::StreakRecovery => &mut self.streak_recovery_passes,
            Consumable::Multiplier(MultiplierTier::Day) => &mut self.multiplier_24h,
            Consumable::Multiplier(MultiplierTier::Week) => &mut self.multiplier_7d,
            Consumable::Multiplier(MultiplierTier::Mega) => &mut self.mega_multipliers,
            Consumable::AutoCompletePass => &mut self.auto_complete_passes,
        }
    }
}

impl Default for InventoryCounts {
    fn default() -> Self {
        Self::with_slots(BASE_HABIT_SLOTS)
    }
}

/// Everything the user holds: consumable counts plus owned cosmetics.
///
/// Cosmetics are set memberships; the sets are stored remotely as separate
/// sub-collections so unlocking one never rewrites the others.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryState {
    pub counts: InventoryCounts,
    #[serde(default)]
    pub owned_flame_colors: BTreeSet<String>,
    #[serde(default)]
    pub unlocked_badges: BTreeSet<String>,
    #[serde(default)]
    pub owned_themes: BTreeSet<String>,
    #[serde(default)]
    pub purchased_items: Vec<PurchasedItem>,
}

impl InventoryState {
    pub fn with_slots(max_habit_slots: u32) -> Self {
        Self {
            counts: InventoryCounts::with_slots(max_habit_slots),
            ..Default::default()
        }
    }

    pub fn count(&self, kind: Consumable) -> u32 {
        self.counts.count(kind)
    }

    /// The multiplier window, if it is still running at `now`.
    pub fn live_multiplier(&self, now: DateTime<Utc>) -> Option<&MultiplierWindow> {
        self.counts
            .active_multiplier
            .as_ref()
            .filter(|window| window.is_active(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_match_catalog_terms() {
        assert_eq!(MultiplierTier::Day.hours(), 24);
        assert_eq!(MultiplierTier::Week.hours(), 168);
        assert_eq!(MultiplierTier::Mega.strength(), 2.0);
        assert_eq!(MultiplierTier::Week.strength(), 1.5);
    }

    #[test]
    fn window_expires_at_until() {
        let now = Utc::now();
        let window = MultiplierWindow::starting_at(now, 24, 1.5);
        assert!(window.is_active(now));
        assert!(!window.is_active(now + Duration::hours(24)));
    }

    #[test]
    fn count_mut_addresses_each_tier() {
        let mut counts = InventoryCounts::default();
        for tier in MultiplierTier::ALL {
            *counts.count_mut(Consumable::Multiplier(tier)) += 1;
        }
        assert_eq!(counts.multiplier_24h, 1);
        assert_eq!(counts.multiplier_7d, 1);
        assert_eq!(counts.mega_multipliers, 1);
        assert_eq!(counts.max_habit_slots, BASE_HABIT_SLOTS);
    }
}
