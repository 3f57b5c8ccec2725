use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::model::{Consumable, Cosmetic};
use crate::wager::Settlement;

/// Every successful mutation publishes one of these.
/// Hosts subscribe and re-read the cache instead of polling it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EconomyEvent {
    Loaded {
        /// Collections that fell back to defaults.
        degraded: Vec<String>,
        at: DateTime<Utc>,
    },
    HabitCreated {
        habit_id: Uuid,
        at: DateTime<Utc>,
    },
    HabitExtinguished {
        habit_id: Uuid,
        at: DateTime<Utc>,
    },
    HabitDeleted {
        habit_id: Uuid,
        at: DateTime<Utc>,
    },
    CheckedIn {
        habit_id: Uuid,
        day: NaiveDate,
        did_complete: bool,
        current_streak: u32,
        coins: u64,
        freeze_used: bool,
        at: DateTime<Utc>,
    },
    NoteSaved {
        habit_id: Uuid,
        day: NaiveDate,
        at: DateTime<Utc>,
    },
    Purchased {
        item_id: String,
        price: u64,
        balance: u64,
        at: DateTime<Utc>,
    },
    ItemUsed {
        item: Consumable,
        at: DateTime<Utc>,
    },
    CosmeticApplied {
        cosmetic: Cosmetic,
        habit_id: Option<Uuid>,
        at: DateTime<Utc>,
    },
    SettingsChanged {
        at: DateTime<Utc>,
    },
    WagerPlaced {
        wager_id: Uuid,
        amount: u64,
        target_days: u32,
        at: DateTime<Utc>,
    },
    WagerSettled {
        wager_id: Uuid,
        settlement: Settlement,
        at: DateTime<Utc>,
    },
    SessionCleared {
        at: DateTime<Utc>,
    },
    AccountDeleted {
        at: DateTime<Utc>,
    },
}

/// Fan-out channel for [`EconomyEvent`]s.
///
/// Publishing never fails: with no subscribers the event is dropped, and a
/// subscriber that falls more than `capacity` events behind sees a lag error
/// on its next receive.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EconomyEvent>,
}

impl EventBus {
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EconomyEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: EconomyEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
