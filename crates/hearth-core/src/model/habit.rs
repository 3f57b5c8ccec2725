use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Brightness of a freshly lit habit.
pub const DEFAULT_BRIGHTNESS: f64 = 1.0;

fn default_brightness() -> f64 {
    DEFAULT_BRIGHTNESS
}

/// A tracked habit ("flame").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: Uuid,
    pub name: String,
    pub icon: String,
    pub created_at: DateTime<Utc>,
    /// Soft-deleted. Extinguished habits keep their history but take no check-ins.
    #[serde(default)]
    pub is_extinguished: bool,
    #[serde(default)]
    pub last_check_in_date: Option<NaiveDate>,
    #[serde(default)]
    pub current_streak: u32,
    /// Always `>= current_streak`.
    #[serde(default)]
    pub best_streak: u32,
    /// Health signal in `[0.2, 1.0]`.
    #[serde(default = "default_brightness")]
    pub brightness: f64,
    #[serde(default)]
    pub flame_color_id: Option<String>,
}

impl Habit {
    pub fn new(name: impl Into<String>, icon: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            icon: icon.into(),
            created_at,
            is_extinguished: false,
            last_check_in_date: None,
            current_streak: 0,
            best_streak: 0,
            brightness: DEFAULT_BRIGHTNESS,
            flame_color_id: None,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.is_extinguished
    }

    /// Whether the last completion landed on `day`.
    pub fn completed_on(&self, day: NaiveDate) -> bool {
        self.last_check_in_date == Some(day)
    }
}

/// One day's record for one habit. At most one exists per `(habit_id, date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitEntry {
    pub id: Uuid,
    pub habit_id: Uuid,
    pub date: NaiveDate,
    pub did_complete: bool,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub note: Option<String>,
    /// Set once the day's completion has been paid. Survives a later miss so
    /// completing the day again pays nothing.
    #[serde(default)]
    pub rewarded: bool,
}

impl HabitEntry {
    pub fn new(habit_id: Uuid, date: NaiveDate, did_complete: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            habit_id,
            date,
            did_complete,
            value: None,
            note: None,
            rewarded: false,
        }
    }

    /// Whether completing this day would pay nothing.
    pub fn is_paid(&self) -> bool {
        self.did_complete || self.rewarded
    }
}
