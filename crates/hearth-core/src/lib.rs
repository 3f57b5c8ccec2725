//! # Hearth Core Library
//!
//! The progress-and-economy engine behind Hearth, a habit tracker that turns
//! daily check-ins into streaks, coins, consumable items and wagers. The
//! `hearth` CLI is a thin host over this crate.
//!
//! ## Architecture
//!
//! - **Engines**: pure rules for streaks ([`StreakEngine`]), coin rewards
//!   ([`RewardCalculator`]), inventory ([`InventoryManager`]) and wagers
//!   ([`WagerEngine`])
//! - **Economy**: the [`Economy`] facade sequences the engines, owns the
//!   [`LocalCache`] and pushes changes to the remote store in the background
//! - **Sync**: a per-user document store behind [`RemoteStore`], with
//!   in-memory and SQLite implementations
//! - **Storage**: TOML configuration ([`EngineConfig`]) and a SQLite
//!   key-value mirror ([`LocalMirror`]) for offline cold starts

pub mod cache;
pub mod clock;
pub mod config;
pub mod economy;
pub mod error;
pub mod events;
pub mod inventory;
pub mod mirror;
pub mod model;
pub mod reward;
pub mod streak;
pub mod sync;
pub mod wager;

pub use cache::{CacheSnapshot, LocalCache};
pub use clock::{Calendar, CalendarConfig, Clock, FixedClock, SystemClock};
pub use config::{data_dir, EngineConfig, SyncConfig};
pub use economy::{
    CheckInOutcome, Economy, ItemEffect, LoadReport, LoadSource, OutboxFlush, Purchase, UseItem, WagerVerdict,
};
pub use error::{ConfigError, CoreError, EconomyError, Result};
pub use events::{EconomyEvent, EventBus};
pub use inventory::{InventoryConfig, InventoryManager};
pub use mirror::{LocalMirror, MirrorState};
pub use reward::{RewardCalculator, RewardConfig};
pub use streak::{CheckIn, StreakConfig, StreakEngine, StreakState};
pub use sync::{Collection, MemoryStore, Outbox, RemoteStore, RemoteSyncGateway, SqliteStore, SyncError, SyncPolicy, UserIdentity};
pub use wager::{Settlement, WagerConfig, WagerEngine};
