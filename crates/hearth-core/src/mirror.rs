//! Local key-value mirror for cold starts without a remote identity.
//!
//! Only a handful of scalar fields are mirrored. Once a gateway is attached
//! the remote store is authoritative and the mirror is write-only.

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::cache::LocalCache;
use crate::model::MultiplierWindow;

const KEY_BALANCE: &str = "wallet.balance";
const KEY_TOTAL_EARNED: &str = "wallet.total_earned";
const KEY_THEME: &str = "settings.theme_key";
const KEY_NOTIFICATIONS: &str = "settings.notifications";
const KEY_FREEZES: &str = "inventory.streak_freezes";
const KEY_MULTIPLIER: &str = "inventory.active_multiplier";
const KEY_FLAME_COLOR: &str = "inventory.active_flame_color";

/// SQLite-backed key-value store.
pub struct LocalMirror {
    conn: Connection,
}

impl LocalMirror {
    /// Open the mirror at `path`, creating the schema if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, rusqlite::Error> {
        let mirror = Self {
            conn: Connection::open(path)?,
        };
        mirror.migrate()?;
        Ok(mirror)
    }

    pub fn open_memory() -> Result<Self, rusqlite::Error> {
        let mirror = Self {
            conn: Connection::open_in_memory()?,
        };
        mirror.migrate()?;
        Ok(mirror)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
    }

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Read the mirrored fields. Missing or malformed keys read as `None`.
    pub fn read_state(&self) -> Result<MirrorState, rusqlite::Error> {
        Ok(MirrorState {
            balance: self.parsed(KEY_BALANCE)?,
            total_earned: self.parsed(KEY_TOTAL_EARNED)?,
            theme_key: self.kv_get(KEY_THEME)?,
            notifications: self.json(KEY_NOTIFICATIONS)?,
            streak_freezes: self.parsed(KEY_FREEZES)?,
            active_multiplier: self.json(KEY_MULTIPLIER)?,
            active_flame_color: self.kv_get(KEY_FLAME_COLOR)?,
        })
    }

    /// Overwrite the mirrored fields with `state`.
    pub fn write_state(&self, state: &MirrorState) -> Result<(), rusqlite::Error> {
        let tx = self.conn.unchecked_transaction()?;
        self.put(KEY_BALANCE, state.balance.map(|v| v.to_string()))?;
        self.put(KEY_TOTAL_EARNED, state.total_earned.map(|v| v.to_string()))?;
        self.put(KEY_THEME, state.theme_key.clone())?;
        self.put(KEY_NOTIFICATIONS, to_json(&state.notifications))?;
        self.put(KEY_FREEZES, state.streak_freezes.map(|v| v.to_string()))?;
        self.put(KEY_MULTIPLIER, to_json(&state.active_multiplier))?;
        self.put(KEY_FLAME_COLOR, state.active_flame_color.clone())?;
        tx.commit()
    }

    fn put(&self, key: &str, value: Option<String>) -> Result<(), rusqlite::Error> {
        match value {
            Some(value) => self.kv_set(key, &value),
            None => self.kv_delete(key),
        }
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>, rusqlite::Error> {
        Ok(self.kv_get(key)?.and_then(|raw| match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(key, raw = %raw, "ignoring malformed mirror value");
                None
            }
        }))
    }

    fn json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>, rusqlite::Error> {
        Ok(self.kv_get(key)?.and_then(|raw| match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "ignoring malformed mirror value");
                None
            }
        }))
    }
}

fn to_json<T: Serialize>(value: &Option<T>) -> Option<String> {
    value.as_ref().and_then(|v| serde_json::to_string(v).ok())
}

/// Notification preference as mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirroredNotifications {
    pub enabled: bool,
    pub hour: u32,
    pub minute: u32,
}

/// The subset of session state kept in the mirror.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MirrorState {
    pub balance: Option<u64>,
    pub total_earned: Option<u64>,
    pub theme_key: Option<String>,
    pub notifications: Option<MirroredNotifications>,
    pub streak_freezes: Option<u32>,
    pub active_multiplier: Option<MultiplierWindow>,
    pub active_flame_color: Option<String>,
}

impl MirrorState {
    pub fn capture(cache: &LocalCache) -> Self {
        let settings = cache.settings();
        let counts = &cache.inventory().counts;
        Self {
            balance: Some(cache.wallet().balance),
            total_earned: Some(cache.wallet().total_earned),
            theme_key: Some(settings.theme_key.clone()),
            notifications: Some(MirroredNotifications {
                enabled: settings.notifications_enabled,
                hour: settings.notification_hour,
                minute: settings.notification_minute,
            }),
            streak_freezes: Some(counts.streak_freezes),
            active_multiplier: counts.active_multiplier,
            active_flame_color: counts.active_flame_color.clone(),
        }
    }

    /// Copy every present field onto `cache`.
    pub fn apply_to(&self, cache: &mut LocalCache) {
        if let Some(balance) = self.balance {
            cache.wallet.balance = balance;
        }
        if let Some(total) = self.total_earned {
            cache.wallet.total_earned = total.max(cache.wallet.balance);
        }
        if let Some(theme) = &self.theme_key {
            cache.settings.theme_key = theme.clone();
        }
        if let Some(n) = self.notifications {
            cache.settings.notifications_enabled = n.enabled;
            cache.settings.notification_hour = n.hour;
            cache.settings.notification_minute = n.minute;
        }
        if let Some(freezes) = self.streak_freezes {
            cache.inventory.counts.streak_freezes = freezes;
        }
        if self.active_multiplier.is_some() {
            cache.inventory.counts.active_multiplier = self.active_multiplier;
        }
        if self.active_flame_color.is_some() {
            cache.inventory.counts.active_flame_color = self.active_flame_color.clone();
        }
    }
}
