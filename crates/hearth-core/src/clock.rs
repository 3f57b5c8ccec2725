//! Wall-clock access and day arithmetic.
//!
//! Nothing in the engine reads the system time directly: it asks a [`Clock`]
//! for "now" and a [`Calendar`] for the day that instant belongs to. Tests
//! drive both through [`FixedClock`].

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to an instant that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Clock set to `hour:00` UTC on `day`.
    pub fn at(day: NaiveDate, hour: u32) -> Self {
        let time = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
        Self::new(Utc.from_utc_datetime(&day.and_time(time)))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Day-boundary configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Offset of the user's day from UTC, in minutes east.
    #[serde(default)]
    pub day_offset_minutes: i32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            day_offset_minutes: 0,
        }
    }
}

/// Maps instants onto days using a fixed offset.
#[derive(Debug, Clone, Copy)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Calendar {
    pub fn new(config: CalendarConfig) -> Self {
        let seconds = config.day_offset_minutes.clamp(-1439, 1439) * 60;
        let offset = FixedOffset::east_opt(seconds).unwrap_or_else(|| Utc.fix());
        Self { offset }
    }

    /// Calendar whose days start at UTC midnight.
    pub fn utc() -> Self {
        Self::new(CalendarConfig::default())
    }

    /// The day `instant` falls on.
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Local hour of day for `instant` (0-23).
    pub fn hour_of(&self, instant: DateTime<Utc>) -> u32 {
        instant.with_timezone(&self.offset).hour()
    }

    /// First instant of `day`.
    pub fn start_of_day(&self, day: NaiveDate) -> DateTime<Utc> {
        let local = day.and_time(NaiveTime::MIN);
        match self.offset.from_local_datetime(&local).single() {
            Some(start) => start.with_timezone(&Utc),
            None => Utc.from_utc_datetime(&local),
        }
    }

    pub fn today(&self, clock: &dyn Clock) -> NaiveDate {
        self.day_of(clock.now())
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}
