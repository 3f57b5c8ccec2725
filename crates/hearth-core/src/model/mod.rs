//! Entity records shared by every engine component.
//!
//! These are plain value types: identity plus fields. Mutation rules live in
//! the engines (`streak`, `inventory`, `wager`) and the economy facade.

mod habit;
mod inventory;
mod settings;
mod shop;
mod wager;
mod wallet;

pub use habit::{Habit, HabitEntry, DEFAULT_BRIGHTNESS};
pub use inventory::{
    Consumable, InventoryCounts, InventoryState, MultiplierTier, MultiplierWindow, BASE_HABIT_SLOTS,
};
pub use settings::{AppSettings, DEFAULT_THEME};
pub use shop::{
    Badge, Catalog, Cosmetic, FlameColor, PurchasedItem, ShopItem, ShopItemKind, BADGES,
    DEFAULT_FLAME_COLOR, FLAME_COLORS, THEMES,
};
pub use wager::{Wager, WagerStatus};
pub use wallet::CurrencyWallet;
