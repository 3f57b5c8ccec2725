use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::inventory::{Consumable, MultiplierTier};
use super::settings::DEFAULT_THEME;

/// Flame color every habit starts with.
pub const DEFAULT_FLAME_COLOR: &str = "ember";

/// Closed set of shop item types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopItemKind {
    StreakFreeze,
    StreakRecovery,
    Multiplier24h,
    Multiplier7d,
    MegaMultiplier,
    AutoCompletePass,
    HabitSlot,
    FlameColor,
    Theme,
    Badge,
}

impl ShopItemKind {
    /// The counted consumable this item stocks, if any.
    pub fn consumable(self) -> Option<Consumable> {
        match self {
            ShopItemKind::StreakFreeze => Some(Consumable::StreakFreeze),
            ShopItemKind::StreakRecovery => Some(Consumable::StreakRecovery),
            ShopItemKind::Multiplier24h => Some(Consumable::Multiplier(MultiplierTier::Day)),
            ShopItemKind::Multiplier7d => Some(Consumable::Multiplier(MultiplierTier::Week)),
            ShopItemKind::MegaMultiplier => Some(Consumable::Multiplier(MultiplierTier::Mega)),
            ShopItemKind::AutoCompletePass => Some(Consumable::AutoCompletePass),
            ShopItemKind::HabitSlot
            | ShopItemKind::FlameColor
            | ShopItemKind::Theme
            | ShopItemKind::Badge => None,
        }
    }

    pub fn is_cosmetic(self) -> bool {
        matches!(
            self,
            ShopItemKind::FlameColor | ShopItemKind::Theme | ShopItemKind::Badge
        )
    }
}

/// A non-consumable unlock, identified by a stable key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum Cosmetic {
    FlameColor(String),
    Theme(String),
    Badge(String),
}

impl Cosmetic {
    pub fn key(&self) -> &str {
        match self {
            Cosmetic::FlameColor(key) | Cosmetic::Theme(key) | Cosmetic::Badge(key) => key,
        }
    }
}

fn default_quantity() -> u32 {
    1
}

/// Catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopItem {
    pub id: String,
    pub kind: ShopItemKind,
    pub name: String,
    pub price: u64,
    /// Units granted per purchase (consumables only).
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Key unlocked by cosmetic items.
    #[serde(default)]
    pub cosmetic_key: Option<String>,
}

impl ShopItem {
    fn consumable(id: &str, kind: ShopItemKind, name: &str, price: u64, quantity: u32) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            price,
            quantity,
            cosmetic_key: None,
        }
    }

    fn cosmetic_item(kind: ShopItemKind, key: &str, name: &str, price: u64) -> Self {
        let prefix = match kind {
            ShopItemKind::FlameColor => "flame",
            ShopItemKind::Theme => "theme",
            _ => "badge",
        };
        Self {
            id: format!("{prefix}_{key}"),
            kind,
            name: name.into(),
            price,
            quantity: 1,
            cosmetic_key: Some(key.into()),
        }
    }

    /// The cosmetic this item unlocks, if it is one.
    pub fn cosmetic(&self) -> Option<Cosmetic> {
        let key = self.cosmetic_key.clone()?;
        match self.kind {
            ShopItemKind::FlameColor => Some(Cosmetic::FlameColor(key)),
            ShopItemKind::Theme => Some(Cosmetic::Theme(key)),
            ShopItemKind::Badge => Some(Cosmetic::Badge(key)),
            _ => None,
        }
    }
}

/// Durable record of a cosmetic unlock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchasedItem {
    pub item_id: String,
    pub kind: ShopItemKind,
    #[serde(default)]
    pub cosmetic_key: Option<String>,
    pub price: u64,
    pub purchased_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlameColor {
    pub key: &'static str,
    pub name: &'static str,
    pub hex: &'static str,
    pub price: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub price: u64,
}

pub const FLAME_COLORS: &[FlameColor] = &[
    FlameColor { key: DEFAULT_FLAME_COLOR, name: "Ember", hex: "#ff7a1a", price: 0 },
    FlameColor { key: "azure", name: "Azure", hex: "#3b82f6", price: 150 },
    FlameColor { key: "jade", name: "Jade", hex: "#10b981", price: 150 },
    FlameColor { key: "violet", name: "Violet", hex: "#8b5cf6", price: 200 },
    FlameColor { key: "gold", name: "Gold", hex: "#f5c542", price: 300 },
];

/// `(key, name, price)`
pub const THEMES: &[(&str, &str, u64)] = &[
    (DEFAULT_THEME, "Classic", 0),
    ("midnight", "Midnight", 200),
    ("campfire", "Campfire", 250),
    ("aurora", "Aurora", 400),
];

pub const BADGES: &[Badge] = &[
    Badge { key: "kindling", name: "Kindling", description: "Bought your first badge", price: 100 },
    Badge { key: "torchbearer", name: "Torchbearer", description: "Keeper of the flame", price: 250 },
    Badge { key: "inferno", name: "Inferno", description: "Burning bright", price: 500 },
];

/// What the shop sells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    items: Vec<ShopItem>,
}

impl Catalog {
    pub fn new(items: Vec<ShopItem>) -> Self {
        Self { items }
    }

    /// The standard price list. Free defaults are not for sale.
    pub fn standard() -> Self {
        let mut items = vec![
            ShopItem::consumable("streak_freeze", ShopItemKind::StreakFreeze, "Streak Freeze", 50, 1),
            ShopItem::consumable("streak_freeze_pack", ShopItemKind::StreakFreeze, "Streak Freeze x3", 120, 3),
            ShopItem::consumable("streak_recovery", ShopItemKind::StreakRecovery, "Streak Recovery", 150, 1),
            ShopItem::consumable("multiplier_24h", ShopItemKind::Multiplier24h, "1.5x Coins (24h)", 100, 1),
            ShopItem::consumable("multiplier_7d", ShopItemKind::Multiplier7d, "1.5x Coins (7 days)", 400, 1),
            ShopItem::consumable("mega_multiplier", ShopItemKind::MegaMultiplier, "2x Coins (24h)", 250, 1),
            ShopItem::consumable("auto_complete_pass", ShopItemKind::AutoCompletePass, "Auto-Complete Pass", 120, 1),
            ShopItem::consumable("habit_slot", ShopItemKind::HabitSlot, "Extra Habit Slot", 200, 1),
        ];
        items.extend(
            FLAME_COLORS
                .iter()
                .filter(|color| color.price > 0)
                .map(|color| ShopItem::cosmetic_item(ShopItemKind::FlameColor, color.key, color.name, color.price)),
        );
        items.extend(
            THEMES
                .iter()
                .filter(|(_, _, price)| *price > 0)
                .map(|(key, name, price)| ShopItem::cosmetic_item(ShopItemKind::Theme, key, name, *price)),
        );
        items.extend(
            BADGES
                .iter()
                .map(|badge| ShopItem::cosmetic_item(ShopItemKind::Badge, badge.key, badge.name, badge.price)),
        );
        Self { items }
    }

    pub fn items(&self) -> &[ShopItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&ShopItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn standard_catalog_ids_are_unique() {
        let catalog = Catalog::standard();
        let ids: HashSet<_> = catalog.items().iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.items().len());
    }

    #[test]
    fn defaults_are_not_sold() {
        let catalog = Catalog::standard();
        assert!(catalog.get("flame_ember").is_none());
        assert!(catalog.get("theme_classic").is_none());
        assert!(catalog.get("flame_azure").is_some());
    }

    #[test]
    fn cosmetic_items_expose_their_unlock() {
        let catalog = Catalog::standard();
        let item = catalog.get("theme_midnight").unwrap();
        assert_eq!(item.cosmetic(), Some(Cosmetic::Theme("midnight".into())));
        assert!(catalog.get("streak_freeze").unwrap().cosmetic().is_none());
    }

    #[test]
    fn kinds_map_to_consumables() {
        assert_eq!(
            ShopItemKind::MegaMultiplier.consumable(),
            Some(Consumable::Multiplier(MultiplierTier::Mega))
        );
        assert!(ShopItemKind::HabitSlot.consumable().is_none());
        assert!(ShopItemKind::Badge.is_cosmetic());
    }
}
