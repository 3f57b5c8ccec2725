use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Observable wager state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WagerStatus {
    Pending,
    Won,
    Lost,
}

/// Coins staked on completing every active habit for a run of days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wager {
    pub id: Uuid,
    pub amount: u64,
    pub target_days: u32,
    pub start_date: NaiveDate,
    /// `start_date + target_days`
    pub end_date: NaiveDate,
    pub is_active: bool,
    /// `None` while pending.
    #[serde(default)]
    pub is_won: Option<bool>,
}

impl Wager {
    pub fn new(amount: u64, target_days: u32, start_date: NaiveDate) -> Self {
        let end_date = start_date
            .checked_add_days(Days::new(u64::from(target_days)))
            .unwrap_or(NaiveDate::MAX);
        Self {
            id: Uuid::new_v4(),
            amount,
            target_days,
            start_date,
            end_date,
            is_active: true,
            is_won: None,
        }
    }

    pub fn status(&self) -> WagerStatus {
        match self.is_won {
            None => WagerStatus::Pending,
            Some(true) => WagerStatus::Won,
            Some(false) => WagerStatus::Lost,
        }
    }

    /// Every day in `[start_date, end_date]`.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end_date;
        self.start_date.iter_days().take_while(move |day| *day <= end)
    }
}
