//! Wager placement and settlement.
//!
//! A wager moves from active to won or lost exactly once. Settling a wager
//! that already reached a verdict is a no-op.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::EconomyError;
use crate::model::{CurrencyWallet, HabitEntry, Wager};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WagerConfig {
    #[serde(default = "default_min_days")]
    pub min_days: u32,
    #[serde(default = "default_max_days")]
    pub max_days: u32,
    /// How many wagers may run at once.
    #[serde(default = "default_max_active")]
    pub max_active: usize,
    /// Forfeit policy. When enabled, an unfinished day inside the wager
    /// loses it as soon as the local hour reaches `early_loss_cutoff_hour`.
    /// When disabled the verdict waits for the end date.
    #[serde(default = "default_early_loss")]
    pub early_loss: bool,
    #[serde(default = "default_cutoff")]
    pub early_loss_cutoff_hour: u32,
}

fn default_min_days() -> u32 {
    1
}
fn default_max_days() -> u32 {
    30
}
fn default_max_active() -> usize {
    1
}
fn default_early_loss() -> bool {
    true
}
fn default_cutoff() -> u32 {
    22
}

impl Default for WagerConfig {
    fn default() -> Self {
        Self {
            min_days: default_min_days(),
            max_days: default_max_days(),
            max_active: default_max_active(),
            early_loss: default_early_loss(),
            early_loss_cutoff_hour: default_cutoff(),
        }
    }
}

/// Result of one settlement pass over a wager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Settlement {
    /// Still running.
    Pending,
    /// Every day fully completed; `payout` is owed to the wallet.
    Won { payout: u64 },
    /// `day` was not fully completed.
    Lost { day: NaiveDate },
    /// Verdict was reached earlier.
    AlreadySettled,
}

#[derive(Debug, Clone, Default)]
pub struct WagerEngine {
    config: WagerConfig,
}

impl WagerEngine {
    pub fn new(config: WagerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WagerConfig {
        &self.config
    }

    /// The early-loss hour, if that policy is on.
    pub fn cutoff(&self) -> Option<u32> {
        self.config.early_loss.then_some(self.config.early_loss_cutoff_hour)
    }

    pub fn validate(
        &self,
        wallet: &CurrencyWallet,
        amount: u64,
        target_days: u32,
        active_wagers: usize,
        active_habits: usize,
    ) -> Result<(), EconomyError> {
        if amount == 0 {
            return Err(EconomyError::InvalidWagerAmount);
        }
        if target_days < self.config.min_days || target_days > self.config.max_days {
            return Err(EconomyError::InvalidWagerDuration {
                days: target_days,
                min: self.config.min_days,
                max: self.config.max_days,
            });
        }
        if active_wagers >= self.config.max_active {
            return Err(EconomyError::WagerAlreadyActive);
        }
        if active_habits == 0 {
            return Err(EconomyError::NoActiveHabits);
        }
        if !wallet.can_afford(amount) {
            return Err(EconomyError::InsufficientFunds {
                needed: amount,
                available: wallet.balance,
            });
        }
        Ok(())
    }

    /// Validate, debit the stake and open the wager starting `today`.
    ///
    /// The stake is gone regardless of the outcome.
    pub fn place(
        &self,
        wallet: &mut CurrencyWallet,
        amount: u64,
        target_days: u32,
        today: NaiveDate,
        active_wagers: usize,
        active_habits: usize,
    ) -> Result<Wager, EconomyError> {
        self.validate(wallet, amount, target_days, active_wagers, active_habits)?;
        wallet.debit(amount)?;
        let wager = Wager::new(amount, target_days, today);
        info!(wager_id = %wager.id, amount, target_days, "wager placed");
        Ok(wager)
    }

    /// Evaluate `wager` against the recorded entries.
    ///
    /// A day counts as done when every habit in `active_habits` has a
    /// completed entry for it. An empty `active_habits` completes no day. `hour` is the local hour of "now", used only by
    /// the early-loss policy.
    pub fn settle<'a>(
        &self,
        wager: &mut Wager,
        entries: impl IntoIterator<Item = &'a HabitEntry>,
        active_habits: &HashSet<Uuid>,
        today: NaiveDate,
        hour: u32,
    ) -> Settlement {
        if !wager.is_active || wager.is_won.is_some() {
            return Settlement::AlreadySettled;
        }

        // With nothing left to complete, no day can be completed.
        let completed = completed_by_day(wager, entries, active_habits);
        let fully_done = |day: NaiveDate| {
            !active_habits.is_empty() && completed.get(&day).map_or(0, HashSet::len) >= active_habits.len()
        };

        if today > wager.end_date {
            let missed = wager.days().find(|day| !fully_done(*day));
            return match missed {
                Some(day) => lose(wager, day),
                None => win(wager),
            };
        }

        if let Some(cutoff) = self.cutoff() {
            if today >= wager.start_date {
                let missed = wager
                    .days()
                    .take_while(|day| *day < today)
                    .find(|day| !fully_done(*day));
                if let Some(day) = missed {
                    return lose(wager, day);
                }
                if hour >= cutoff && !fully_done(today) {
                    debug!(wager_id = %wager.id, hour, cutoff, "early-loss cutoff reached");
                    return lose(wager, today);
                }
            }
        }

        Settlement::Pending
    }
}

fn completed_by_day<'a>(
    wager: &Wager,
    entries: impl IntoIterator<Item = &'a HabitEntry>,
    active_habits: &HashSet<Uuid>,
) -> BTreeMap<NaiveDate, HashSet<Uuid>> {
    let mut by_day: BTreeMap<NaiveDate, HashSet<Uuid>> = BTreeMap::new();
    for entry in entries {
        if entry.did_complete
            && entry.date >= wager.start_date
            && entry.date <= wager.end_date
            && active_habits.contains(&entry.habit_id)
        {
            by_day.entry(entry.date).or_default().insert(entry.habit_id);
        }
    }
    by_day
}

fn win(wager: &mut Wager) -> Settlement {
    wager.is_active = false;
    wager.is_won = Some(true);
    let payout = wager.amount.saturating_mul(2);
    info!(wager_id = %wager.id, payout, "wager won");
    Settlement::Won { payout }
}

fn lose(wager: &mut Wager, day: NaiveDate) -> Settlement {
    wager.is_active = false;
    wager.is_won = Some(false);
    info!(wager_id = %wager.id, %day, "wager lost");
    Settlement::Lost { day }
}
