//! TOML-based engine configuration.
//!
//! Tunables for every engine plus the day boundary and the remote sync
//! policy. Stored at `<data_dir>/config.toml`; any missing field falls back
//! to its default, so a partial file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::clock::CalendarConfig;
use crate::error::ConfigError;
use crate::inventory::InventoryConfig;
use crate::reward::RewardConfig;
use crate::streak::StreakConfig;
use crate::sync::SyncPolicy;
use crate::wager::WagerConfig;

/// Remote sync configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub policy: SyncPolicy,
}

/// Engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub streak: StreakConfig,
    #[serde(default)]
    pub reward: RewardConfig,
    #[serde(default)]
    pub inventory: InventoryConfig,
    #[serde(default)]
    pub wager: WagerConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

impl EngineConfig {
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from `<data_dir>/config.toml`, writing the defaults if it is missing.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Load from an explicit path. The file must exist.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let cfg: Self = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to `<data_dir>/config.toml`.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Reject combinations the engines cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| {
            Err(ConfigError::InvalidValue {
                key: key.into(),
                message: message.into(),
            })
        };
        let streak = &self.streak;
        if !(0.0..=1.0).contains(&streak.min_brightness)
            || !(0.0..=1.0).contains(&streak.max_brightness)
            || streak.min_brightness > streak.max_brightness
        {
            return invalid("streak.min_brightness", "brightness bounds must satisfy 0 <= min <= max <= 1");
        }
        if self.inventory.base_habit_slots > self.inventory.max_habit_slots {
            return invalid("inventory.base_habit_slots", "must not exceed inventory.max_habit_slots");
        }
        if self.wager.min_days == 0 || self.wager.min_days > self.wager.max_days {
            return invalid("wager.min_days", "must be at least 1 and not above wager.max_days");
        }
        if self.wager.early_loss_cutoff_hour > 23 {
            return invalid("wager.early_loss_cutoff_hour", "must be an hour between 0 and 23");
        }
        Ok(())
    }
}

/// Returns the data directory, creating it.
///
/// `HEARTH_DATA_DIR` wins when set. Otherwise `~/.config/hearth`, or
/// `~/.config/hearth-dev` when `HEARTH_ENV=dev`.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("HEARTH_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("HEARTH_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("hearth-dev")
            } else {
                base_dir.join("hearth")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = EngineConfig::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: EngineConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: EngineConfig = toml::from_str(
            r#"
            [reward]
            base = 5

            [sync]
            policy = "outbox"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.reward.base, 5);
        assert_eq!(parsed.reward.streak_cap, 10);
        assert_eq!(parsed.sync.policy, SyncPolicy::Outbox);
        assert_eq!(parsed.wager.max_days, 30);
        assert!(parsed.wager.early_loss);
        assert_eq!(parsed.wager.early_loss_cutoff_hour, 22);
        assert_eq!(parsed.inventory.max_habit_slots, 10);
    }

    #[test]
    fn config_default_values() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.streak.brightness_gain, 0.15);
        assert_eq!(cfg.streak.min_brightness, 0.2);
        assert_eq!(cfg.inventory.base_habit_slots, 3);
        assert_eq!(cfg.wager.min_days, 1);
        assert_eq!(cfg.calendar.day_offset_minutes, 0);
        assert_eq!(cfg.sync.policy, SyncPolicy::BestEffort);
    }

    #[test]
    fn load_from_rejects_inverted_bounds() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[wager]\nmin_days = 10\nmax_days = 5\n").unwrap();
        assert!(matches!(
            EngineConfig::load_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn save_then_load_from() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = EngineConfig::default();
        cfg.calendar.day_offset_minutes = -300;
        cfg.save_to(&path).unwrap();
        assert_eq!(EngineConfig::load_from(&path).unwrap(), cfg);
    }
}
