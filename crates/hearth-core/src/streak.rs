//! Streak and brightness transitions.
//!
//! A miss never zeroes the streak on its own. Breakage is detected lazily:
//! the next completion looks at the gap since the last completed day and
//! either continues the streak (gap of exactly one day) or restarts it at 1.
//! Until that completion arrives the stale streak stays visible, and reward
//! previews depend on that timing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::Habit;

/// Brightness tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreakConfig {
    #[serde(default = "default_gain")]
    pub brightness_gain: f64,
    #[serde(default = "default_loss")]
    pub brightness_loss: f64,
    #[serde(default = "default_min")]
    pub min_brightness: f64,
    #[serde(default = "default_max")]
    pub max_brightness: f64,
}

fn default_gain() -> f64 {
    0.15
}
fn default_loss() -> f64 {
    0.1
}
fn default_min() -> f64 {
    0.2
}
fn default_max() -> f64 {
    1.0
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            brightness_gain: default_gain(),
            brightness_loss: default_loss(),
            min_brightness: default_min(),
            max_brightness: default_max(),
        }
    }
}

/// What happened on a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckIn {
    Completed,
    /// Not done, no freeze available.
    Missed,
    /// Not done, covered by a streak freeze.
    MissedWithFreeze,
}

/// The streak-related slice of a [`Habit`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreakState {
    pub current_streak: u32,
    pub best_streak: u32,
    pub brightness: f64,
    pub last_check_in_date: Option<NaiveDate>,
}

impl StreakState {
    pub fn of(habit: &Habit) -> Self {
        Self {
            current_streak: habit.current_streak,
            best_streak: habit.best_streak,
            brightness: habit.brightness,
            last_check_in_date: habit.last_check_in_date,
        }
    }

    pub fn apply_to(self, habit: &mut Habit) {
        habit.current_streak = self.current_streak;
        habit.best_streak = self.best_streak;
        habit.brightness = self.brightness;
        habit.last_check_in_date = self.last_check_in_date;
    }
}

/// Pure streak calculator.
#[derive(Debug, Clone, Default)]
pub struct StreakEngine {
    config: StreakConfig,
}

impl StreakEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StreakConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StreakConfig {
        &self.config
    }

    /// Next state after `check_in` on `day`.
    ///
    /// A completion dated before the last completed day is a backfill and
    /// leaves the state as it is.
    pub fn next_streak_state(&self, prior: &StreakState, check_in: CheckIn, day: NaiveDate) -> StreakState {
        match check_in {
            CheckIn::Completed if prior.last_check_in_date.is_some_and(|last| day < last) => *prior,
            CheckIn::Completed => {
                let current_streak = match prior.last_check_in_date {
                    Some(last) if last == day => prior.current_streak,
                    Some(last) if day.pred_opt() == Some(last) => prior.current_streak.saturating_add(1),
                    _ => 1,
                };
                StreakState {
                    current_streak,
                    best_streak: prior.best_streak.max(current_streak),
                    brightness: (prior.brightness + self.config.brightness_gain).min(self.config.max_brightness),
                    last_check_in_date: Some(day),
                }
            }
            CheckIn::Missed => StreakState {
                brightness: (prior.brightness - self.config.brightness_loss).max(self.config.min_brightness),
                ..*prior
            },
            CheckIn::MissedWithFreeze => *prior,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn fresh() -> StreakState {
        StreakState::of(&Habit::new("Run", "shoe", Utc::now()))
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn first_completion_starts_streak() {
        let engine = StreakEngine::new();
        let next = engine.next_streak_state(&fresh(), CheckIn::Completed, day(1));
        assert_eq!(next.current_streak, 1);
        assert_eq!(next.best_streak, 1);
        assert_eq!(next.last_check_in_date, Some(day(1)));
    }

    #[test]
    fn consecutive_day_increments() {
        let engine = StreakEngine::new();
        let d1 = engine.next_streak_state(&fresh(), CheckIn::Completed, day(1));
        let d2 = engine.next_streak_state(&d1, CheckIn::Completed, day(2));
        assert_eq!(d2.current_streak, 2);
        assert_eq!(d2.best_streak, 2);
    }

    #[test]
    fn same_day_recheck_is_idempotent_for_streak() {
        let engine = StreakEngine::new();
        let once = engine.next_streak_state(&fresh(), CheckIn::Completed, day(1));
        let twice = engine.next_streak_state(&once, CheckIn::Completed, day(1));
        assert_eq!(twice.current_streak, once.current_streak);
        assert_eq!(twice.best_streak, once.best_streak);
    }

    #[test]
    fn gap_resets_to_one_but_keeps_best() {
        let engine = StreakEngine::new();
        let mut state = fresh();
        for d in 1..=4 {
            state = engine.next_streak_state(&state, CheckIn::Completed, day(d));
        }
        let after_gap = engine.next_streak_state(&state, CheckIn::Completed, day(7));
        assert_eq!(after_gap.current_streak, 1);
        assert_eq!(after_gap.best_streak, 4);
    }

    #[test]
    fn backfilled_completion_keeps_current_run() {
        let engine = StreakEngine::new();
        let mut state = fresh();
        for d in [1, 2, 4, 5, 6] {
            state = engine.next_streak_state(&state, CheckIn::Completed, day(d));
        }
        assert_eq!(state.current_streak, 3);

        let backfilled = engine.next_streak_state(&state, CheckIn::Completed, day(3));
        assert_eq!(backfilled, state);
        assert_eq!(backfilled.last_check_in_date, Some(day(6)));

        let d7 = engine.next_streak_state(&backfilled, CheckIn::Completed, day(7));
        assert_eq!(d7.current_streak, 4);
    }

    #[test]
    fn misses_leave_streak_stale_until_next_completion() {
        let engine = StreakEngine::new();
        let d1 = engine.next_streak_state(&fresh(), CheckIn::Completed, day(1));
        let d2 = engine.next_streak_state(&d1, CheckIn::Completed, day(2));
        let d3 = engine.next_streak_state(&d2, CheckIn::Missed, day(3));
        let d4 = engine.next_streak_state(&d3, CheckIn::Missed, day(4));
        assert_eq!(d4.current_streak, 2);
        assert_eq!(d4.last_check_in_date, Some(day(2)));
        assert!(close(d4.brightness, 0.8));

        let d5 = engine.next_streak_state(&d4, CheckIn::Completed, day(5));
        assert_eq!(d5.current_streak, 1);
    }

    #[test]
    fn freeze_leaves_everything_untouched() {
        let engine = StreakEngine::new();
        let d1 = engine.next_streak_state(&fresh(), CheckIn::Completed, day(1));
        let frozen = engine.next_streak_state(&d1, CheckIn::MissedWithFreeze, day(2));
        assert_eq!(frozen, d1);
    }

    #[test]
    fn brightness_is_clamped() {
        let engine = StreakEngine::new();
        let mut state = fresh();
        for d in 1..=12 {
            state = engine.next_streak_state(&state, CheckIn::Missed, day(d));
        }
        assert!(close(state.brightness, 0.2));

        let lit = engine.next_streak_state(&state, CheckIn::Completed, day(13));
        assert!(close(lit.brightness, 0.35));
        let mut state = lit;
        for d in 14..=25 {
            state = engine.next_streak_state(&state, CheckIn::Completed, day(d));
        }
        assert!(close(state.brightness, 1.0));
    }

    #[test]
    fn apply_writes_back_onto_habit() {
        let mut habit = Habit::new("Stretch", "yoga", Utc::now());
        let next = StreakEngine::new().next_streak_state(&StreakState::of(&habit), CheckIn::Completed, day(9));
        next.apply_to(&mut habit);
        assert_eq!(habit.current_streak, 1);
        assert_eq!(habit.last_check_in_date, Some(day(9)));
    }
}
