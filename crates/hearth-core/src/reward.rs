//! Coin rewards for completed check-ins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::MultiplierWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Coins for any completion.
    #[serde(default = "default_base")]
    pub base: u64,
    /// Streak length at which the streak bonus stops growing.
    #[serde(default = "default_streak_cap")]
    pub streak_cap: u32,
}

fn default_base() -> u64 {
    10
}
fn default_streak_cap() -> u32 {
    10
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            base: default_base(),
            streak_cap: default_streak_cap(),
        }
    }
}

/// Side-effect free; previews and real check-ins both go through [`RewardCalculator::reward`].
#[derive(Debug, Clone, Default)]
pub struct RewardCalculator {
    config: RewardConfig,
}

impl RewardCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RewardConfig) -> Self {
        Self { config }
    }

    /// Reward before any multiplier.
    pub fn base_reward(&self, streak: u32) -> u64 {
        self.config.base + u64::from(streak.min(self.config.streak_cap))
    }

    /// Reward for reaching `streak`, scaled by `multiplier` if it is live at `now`.
    pub fn reward(&self, streak: u32, multiplier: Option<&MultiplierWindow>, now: DateTime<Utc>) -> u64 {
        let base = self.base_reward(streak);
        match multiplier.filter(|window| window.is_active(now)) {
            Some(window) => (base as f64 * window.strength).floor() as u64,
            None => base,
        }
    }
}
