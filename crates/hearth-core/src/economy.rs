//! The economy facade.
//!
//! [`Economy`] is the only public entry point that mutates session state.
//! Each operation runs the pure engines, commits the result to the
//! [`LocalCache`] before returning, then hands the matching remote writes to
//! the background writer without waiting for them. Validation failures come
//! back as [`EconomyError`] with nothing changed.
//!
//! The facade is a single-owner object: hosts that share it across threads
//! wrap it in their own mutex.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{CacheSnapshot, LocalCache};
use crate::clock::{Calendar, Clock};
use crate::config::EngineConfig;
use crate::error::EconomyError;
use crate::events::{EconomyEvent, EventBus};
use crate::inventory::InventoryManager;
use crate::mirror::{LocalMirror, MirrorState};
use crate::model::{
    AppSettings, Catalog, Consumable, Cosmetic, CurrencyWallet, Habit, HabitEntry, MultiplierTier,
    MultiplierWindow, PurchasedItem, ShopItemKind, Wager,
};
use crate::reward::RewardCalculator;
use crate::streak::{CheckIn, StreakEngine, StreakState};
use crate::sync::{
    Collection, Outbox, OwnedKey, RemoteSyncGateway, RemoteWriter, SyncError, WriteOp, SINGLETON_ID,
};
use crate::wager::{Settlement, WagerEngine};

/// Result of one check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInOutcome {
    pub habit: Habit,
    pub entry: HabitEntry,
    /// Coins credited by this call.
    pub coins: u64,
    pub freeze_used: bool,
    /// False when the call changed nothing because the day was already missed.
    pub changed: bool,
}

/// Result of a successful purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub item_id: String,
    pub price: u64,
    pub balance: u64,
}

/// An inventory item to spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum UseItem {
    Multiplier { tier: MultiplierTier },
    StreakRecovery { habit_id: Uuid },
    AutoCompletePass,
}

/// What spending an item did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum ItemEffect {
    Multiplier { window: MultiplierWindow },
    StreakRecovered { habit_id: Uuid, current_streak: u32 },
    AutoCompleted { check_ins: Vec<CheckInOutcome> },
}

/// Outcome of settling one wager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WagerVerdict {
    pub wager_id: Uuid,
    pub settlement: Settlement,
}

/// Where [`Economy::load_all`] got its state from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadSource {
    Remote,
    Mirror,
    Defaults,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub source: LoadSource,
    /// Collections whose read failed and were replaced by defaults.
    pub degraded: Vec<Collection>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.degraded.is_empty()
    }
}

/// Result of replaying the outbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxFlush {
    pub applied: usize,
    pub remaining: usize,
}

struct Remote {
    gateway: RemoteSyncGateway,
    writer: RemoteWriter,
}

pub struct Economy {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    calendar: Calendar,
    runtime: Handle,
    streaks: StreakEngine,
    rewards: RewardCalculator,
    inventory: InventoryManager,
    wagers: WagerEngine,
    catalog: Catalog,
    cache: LocalCache,
    remote: Option<Remote>,
    mirror: Option<LocalMirror>,
    outbox: Arc<Mutex<Outbox>>,
    events: EventBus,
}

impl Economy {
    /// Economy with no remote and no mirror. Background work runs on `runtime`.
    pub fn new(config: EngineConfig, clock: Arc<dyn Clock>, runtime: Handle) -> Self {
        let inventory = InventoryManager::new(config.inventory);
        let cache = LocalCache::new(inventory.fresh_state());
        Self {
            calendar: Calendar::new(config.calendar),
            streaks: StreakEngine::with_config(config.streak),
            rewards: RewardCalculator::with_config(config.reward),
            wagers: WagerEngine::new(config.wager),
            inventory,
            catalog: Catalog::standard(),
            cache,
            remote: None,
            mirror: None,
            outbox: Arc::new(Mutex::new(Outbox::new())),
            events: EventBus::default(),
            clock,
            runtime,
            config,
        }
    }

    /// Attach the remote store and start its writer task.
    pub fn with_gateway(mut self, gateway: RemoteSyncGateway) -> Self {
        let writer = RemoteWriter::spawn(
            &self.runtime,
            gateway.clone(),
            self.config.sync.policy,
            self.outbox.clone(),
            self.clock.clone(),
        );
        self.remote = Some(Remote { gateway, writer });
        self
    }

    pub fn with_mirror(mut self, mirror: LocalMirror) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Use `outbox` (for example one loaded from disk) for failed writes.
    pub fn with_outbox(self, outbox: Outbox) -> Self {
        match self.outbox.lock() {
            Ok(mut slot) => *slot = outbox,
            Err(_) => warn!("outbox lock poisoned, keeping the empty outbox"),
        }
        self
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.calendar.today(self.clock.as_ref())
    }

    pub fn is_signed_in(&self) -> bool {
        self.remote.is_some()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EconomyEvent> {
        self.events.subscribe()
    }

    pub fn pending_outbox(&self) -> usize {
        self.outbox.lock().map(|outbox| outbox.len()).unwrap_or(0)
    }

    /// Load every collection.
    ///
    /// With a gateway, the six reads run concurrently and this returns once
    /// all of them have finished; a read that fails is replaced by its default
    /// and listed in the report. Without a gateway the mirror (if any) seeds
    /// the cache.
    pub async fn load_all(&mut self) -> LoadReport {
        let gateway = self.remote.as_ref().map(|remote| remote.gateway.clone());
        let report = match gateway {
            Some(gateway) => {
                let (snapshot, degraded) = self.load_remote(gateway).await;
                self.cache.apply(snapshot);
                LoadReport {
                    source: LoadSource::Remote,
                    degraded,
                }
            }
            None => self.load_local(),
        };

        info!(
            source = ?report.source,
            habits = self.cache.habits().len(),
            degraded = report.degraded.len(),
            "session loaded"
        );
        self.write_mirror();
        self.events.publish(EconomyEvent::Loaded {
            degraded: report.degraded.iter().map(|c| c.name().to_string()).collect(),
            at: self.clock.now(),
        });
        report
    }

    async fn load_remote(&self, gateway: RemoteSyncGateway) -> (CacheSnapshot, Vec<Collection>) {
        let fresh = self.inventory.fresh_state();
        let rt = &self.runtime;

        let gw = gateway.clone();
        let habits = rt.spawn_blocking(move || gw.load_habits());
        let gw = gateway.clone();
        let entries = rt.spawn_blocking(move || gw.load_entries());
        let gw = gateway.clone();
        let wallet = rt.spawn_blocking(move || gw.load_wallet());
        let gw = gateway.clone();
        let settings = rt.spawn_blocking(move || gw.load_settings());
        let gw = gateway.clone();
        let seed = fresh.clone();
        let inventory = rt.spawn_blocking(move || gw.load_inventory(seed));
        let gw = gateway;
        let wagers = rt.spawn_blocking(move || gw.load_wagers());

        let (habits, entries, wallet, settings, inventory, wagers) =
            tokio::join!(habits, entries, wallet, settings, inventory, wagers);

        let mut degraded = Vec::new();
        let snapshot = CacheSnapshot {
            habits: or_default(Collection::Habits, habits, Vec::new, &mut degraded),
            entries: or_default(Collection::Entries, entries, Vec::new, &mut degraded),
            wallet: or_default(Collection::Wallet, wallet, CurrencyWallet::default, &mut degraded),
            settings: or_default(Collection::Settings, settings, AppSettings::default, &mut degraded),
            inventory: or_default(Collection::Inventory, inventory, || fresh, &mut degraded),
            wagers: or_default(Collection::Wagers, wagers, Vec::new, &mut degraded),
        };
        (snapshot, degraded)
    }

    fn load_local(&mut self) -> LoadReport {
        let mut cache = LocalCache::new(self.inventory.fresh_state());
        let source = match self.mirror.as_ref().map(LocalMirror::read_state) {
            Some(Ok(state)) => {
                state.apply_to(&mut cache);
                LoadSource::Mirror
            }
            Some(Err(e)) => {
                warn!(error = %e, "mirror unreadable, starting from defaults");
                LoadSource::Defaults
            }
            None => LoadSource::Defaults,
        };
        cache.loaded = true;
        self.cache = cache;
        LoadReport {
            source,
            degraded: Vec::new(),
        }
    }

    /// Drop session state. The gateway stays attached.
    pub fn clear_session(&mut self) {
        self.cache.clear(self.inventory.fresh_state());
        info!("session cleared");
        self.events.publish(EconomyEvent::SessionCleared { at: self.clock.now() });
    }

    /// Wait until every write issued so far has been attempted.
    ///
    /// Failures are not reported here; they were logged (and queued under the
    /// outbox policy) by the writer.
    pub async fn settle_writes(&self) {
        if let Some(remote) = &self.remote {
            remote.writer.settle().await;
        }
    }

    /// Retry every queued write once.
    pub async fn flush_outbox(&mut self) -> Result<OutboxFlush, SyncError> {
        let gateway = match &self.remote {
            Some(remote) => {
                remote.writer.settle().await;
                remote.gateway.clone()
            }
            None => return Err(SyncError::NotSignedIn),
        };

        let pending = {
            let mut outbox = self.lock_outbox()?;
            let n = outbox.len();
            outbox.drain_up_to(n)
        };
        let attempted = pending.len();
        if attempted == 0 {
            return Ok(OutboxFlush {
                applied: 0,
                remaining: 0,
            });
        }

        let failed = self
            .runtime
            .spawn_blocking(move || {
                pending
                    .into_iter()
                    .filter(|pending| match gateway.apply(&pending.op) {
                        Ok(()) => false,
                        Err(e) => {
                            warn!(key = %pending.op.key(), error = %e, "outbox replay failed");
                            true
                        }
                    })
                    .collect::<Vec<_>>()
            })
            .await?;

        let applied = attempted - failed.len();
        let mut outbox = self.lock_outbox()?;
        for pending in failed {
            outbox.requeue(pending);
        }
        outbox.persist()?;
        let remaining = outbox.len();
        info!(applied, remaining, "outbox flushed");
        Ok(OutboxFlush { applied, remaining })
    }

    fn lock_outbox(&self) -> Result<std::sync::MutexGuard<'_, Outbox>, SyncError> {
        self.outbox
            .lock()
            .map_err(|_| SyncError::Unavailable("outbox lock poisoned".into()))
    }

    /// Erase every remote collection for the signed-in user.
    ///
    /// Waits for pending writes first so none of them recreate data after
    /// the delete. Local state is cleared only when every collection was
    /// removed; otherwise the failed collections are reported.
    pub async fn delete_account(&mut self) -> Result<(), SyncError> {
        let gateway = match &self.remote {
            Some(remote) => {
                remote.writer.settle().await;
                remote.gateway.clone()
            }
            None => return Err(SyncError::NotSignedIn),
        };

        self.runtime.spawn_blocking(move || gateway.delete_account()).await??;

        if let Ok(mut outbox) = self.outbox.lock() {
            *outbox = Outbox::new();
        }
        self.cache.clear(self.inventory.fresh_state());
        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.write_state(&MirrorState::default()) {
                warn!(error = %e, "failed to clear mirror");
            }
        }
        info!("account deleted");
        self.events.publish(EconomyEvent::AccountDeleted { at: self.clock.now() });
        Ok(())
    }

    pub fn create_habit(&mut self, name: &str, icon: &str) -> Result<Habit, EconomyError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EconomyError::InvalidSetting("habit name must not be empty".into()));
        }
        let active = self.cache.active_habits().count();
        if !self.inventory.can_add_habit(&self.cache.inventory, active) {
            return Err(EconomyError::HabitLimitReached {
                max: self.cache.inventory.counts.max_habit_slots,
            });
        }

        let now = self.clock.now();
        let habit = Habit::new(name, icon, now);
        self.cache.habits.push(habit.clone());
        info!(habit_id = %habit.id, name, "habit created");

        self.persist(self.habit_op(&habit).into_iter().collect());
        self.events.publish(EconomyEvent::HabitCreated { habit_id: habit.id, at: now });
        Ok(habit)
    }

    /// Soft delete. The habit keeps its history but no longer counts as active.
    pub fn extinguish_habit(&mut self, habit_id: Uuid) -> Result<(), EconomyError> {
        let habit = self.cache.habit_mut(habit_id).ok_or(EconomyError::HabitNotFound(habit_id))?;
        if habit.is_extinguished {
            return Ok(());
        }
        habit.is_extinguished = true;
        let habit = habit.clone();
        info!(%habit_id, "habit extinguished");

        self.persist(self.habit_op(&habit).into_iter().collect());
        self.events.publish(EconomyEvent::HabitExtinguished {
            habit_id,
            at: self.clock.now(),
        });
        Ok(())
    }

    /// Hard delete: removes the habit and all of its entries.
    pub fn delete_habit(&mut self, habit_id: Uuid) -> Result<(), EconomyError> {
        let (habit, entries) = self.cache.remove_habit(habit_id).ok_or(EconomyError::HabitNotFound(habit_id))?;
        info!(%habit_id, entries = entries.len(), "habit deleted");

        let mut ops = vec![WriteOp::delete(Collection::Habits, habit.id.to_string())];
        ops.extend(
            entries
                .iter()
                .map(|entry| WriteOp::delete(Collection::Entries, entry.id.to_string())),
        );
        self.persist(ops);
        self.events.publish(EconomyEvent::HabitDeleted {
            habit_id,
            at: self.clock.now(),
        });
        Ok(())
    }

    /// Record today's result for a habit.
    pub fn check_in(&mut self, habit_id: Uuid, did_complete: bool) -> Result<CheckInOutcome, EconomyError> {
        let today = self.today();
        self.check_in_on(habit_id, did_complete, today)
    }

    /// Record the result for an explicit day.
    ///
    /// Coins are paid only when the day's entry turns completed, so repeating
    /// a completed check-in pays nothing. A miss on a completed day marks the
    /// entry missed without refunding or touching the streak, and completing
    /// that day again pays nothing. Completing a day older than the habit's last
    /// completed day pays and records it without touching the streak.
    pub fn check_in_on(
        &mut self,
        habit_id: Uuid,
        did_complete: bool,
        day: NaiveDate,
    ) -> Result<CheckInOutcome, EconomyError> {
        let (outcome, ops) = self.apply_check_in(habit_id, did_complete, day)?;
        self.persist(ops);
        self.publish_check_in(&outcome);
        Ok(outcome)
    }

    fn apply_check_in(
        &mut self,
        habit_id: Uuid,
        did_complete: bool,
        day: NaiveDate,
    ) -> Result<(CheckInOutcome, Vec<WriteOp>), EconomyError> {
        let now = self.clock.now();
        let habit = self
            .cache
            .habit(habit_id)
            .filter(|habit| habit.is_active())
            .ok_or(EconomyError::HabitNotFound(habit_id))?
            .clone();
        let existing = self.cache.entry(habit_id, day).cloned();

        if !did_complete {
            if let Some(entry) = existing {
                return Ok(self.overwrite_with_miss(habit, entry));
            }
        }

        let already_completed = existing.as_ref().is_some_and(|entry| entry.did_complete);
        let coins = if did_complete {
            self.completion_reward(&habit, day, now)
        } else {
            0
        };
        let freeze_used = !did_complete && self.inventory.consume_freeze_if_available(&mut self.cache.inventory);
        let event = match (did_complete, freeze_used) {
            (true, _) => CheckIn::Completed,
            (false, true) => CheckIn::MissedWithFreeze,
            (false, false) => CheckIn::Missed,
        };

        let next = self.streaks.next_streak_state(&StreakState::of(&habit), event, day);
        let habit = match self.cache.habit_mut(habit_id) {
            Some(stored) => {
                next.apply_to(stored);
                stored.clone()
            }
            None => return Err(EconomyError::HabitNotFound(habit_id)),
        };

        let mut entry = existing.unwrap_or_else(|| HabitEntry::new(habit_id, day, did_complete));
        entry.did_complete = did_complete;
        entry.rewarded |= did_complete;
        let entry = self.cache.upsert_entry(entry).clone();

        if coins > 0 {
            self.cache.wallet.credit(coins);
        }
        debug!(
            %habit_id, %day, ?event, streak = habit.current_streak, coins, already_completed,
            "check-in applied"
        );

        let mut ops: Vec<WriteOp> = [self.habit_op(&habit), self.entry_op(&entry)]
            .into_iter()
            .flatten()
            .collect();
        if coins > 0 {
            ops.extend(self.wallet_op());
        }
        if freeze_used {
            ops.extend(self.inventory_op());
        }

        Ok((
            CheckInOutcome {
                habit,
                entry,
                coins,
                freeze_used,
                changed: true,
            },
            ops,
        ))
    }

    /// A miss on a day that already has an entry. A completed entry flips to
    /// missed but keeps its paid marker; the streak, brightness and freezes
    /// are left alone. A missed entry stays as it is.
    fn overwrite_with_miss(&mut self, habit: Habit, mut entry: HabitEntry) -> (CheckInOutcome, Vec<WriteOp>) {
        let unchanged = |entry: HabitEntry| CheckInOutcome {
            habit: habit.clone(),
            entry,
            coins: 0,
            freeze_used: false,
            changed: false,
        };
        if !entry.did_complete {
            debug!(habit_id = %habit.id, day = %entry.date, "day already missed");
            return (unchanged(entry), Vec::new());
        }

        entry.rewarded = true;
        entry.did_complete = false;
        let entry = self.cache.upsert_entry(entry).clone();
        debug!(habit_id = %habit.id, day = %entry.date, "completed day overwritten with a miss");
        let ops = self.entry_op(&entry).into_iter().collect();
        (
            CheckInOutcome {
                changed: true,
                ..unchanged(entry)
            },
            ops,
        )
    }

    /// Coins a completion on `day` would pay. Zero when the day was already paid.
    fn completion_reward(&self, habit: &Habit, day: NaiveDate, now: DateTime<Utc>) -> u64 {
        let done = self.cache.entry(habit.id, day).is_some_and(HabitEntry::is_paid);
        if done {
            return 0;
        }
        let next = self
            .streaks
            .next_streak_state(&StreakState::of(habit), CheckIn::Completed, day);
        self.rewards
            .reward(next.current_streak, self.cache.inventory.counts.active_multiplier.as_ref(), now)
    }

    /// Coins a completed check-in today would pay, without changing anything.
    pub fn estimate_reward(&self, habit_id: Uuid) -> Result<u64, EconomyError> {
        let habit = self
            .cache
            .habit(habit_id)
            .filter(|habit| habit.is_active())
            .ok_or(EconomyError::HabitNotFound(habit_id))?;
        Ok(self.completion_reward(habit, self.today(), self.clock.now()))
    }

    /// Attach a note and optional measured value to a day's entry, creating
    /// an incomplete entry when the day has none yet.
    pub fn save_note(
        &mut self,
        habit_id: Uuid,
        day: NaiveDate,
        note: Option<String>,
        value: Option<f64>,
    ) -> Result<HabitEntry, EconomyError> {
        if self.cache.habit(habit_id).is_none() {
            return Err(EconomyError::HabitNotFound(habit_id));
        }
        let mut entry = self
            .cache
            .entry(habit_id, day)
            .cloned()
            .unwrap_or_else(|| HabitEntry::new(habit_id, day, false));
        entry.note = note.filter(|text| !text.trim().is_empty());
        entry.value = value;
        let entry = self.cache.upsert_entry(entry).clone();

        self.persist(self.entry_op(&entry).into_iter().collect());
        self.events.publish(EconomyEvent::NoteSaved {
            habit_id,
            day,
            at: self.clock.now(),
        });
        Ok(entry)
    }

    fn publish_check_in(&self, outcome: &CheckInOutcome) {
        if !outcome.changed {
            return;
        }
        self.events.publish(EconomyEvent::CheckedIn {
            habit_id: outcome.habit.id,
            day: outcome.entry.date,
            did_complete: outcome.entry.did_complete,
            current_streak: outcome.habit.current_streak,
            coins: outcome.coins,
            freeze_used: outcome.freeze_used,
            at: self.clock.now(),
        });
    }

    /// Buy a catalog item.
    ///
    /// The debit and the effect are applied together or not at all: on any
    /// refusal the wallet and inventory are exactly as before.
    pub fn purchase(&mut self, item_id: &str) -> Result<Purchase, EconomyError> {
        let item = self
            .catalog
            .get(item_id)
            .cloned()
            .ok_or_else(|| EconomyError::UnknownItem(item_id.to_string()))?;
        let cosmetic = item.cosmetic();
        if let Some(cosmetic) = &cosmetic {
            if self.inventory.owns(&self.cache.inventory, cosmetic) {
                return Err(EconomyError::AlreadyOwned(cosmetic.key().to_string()));
            }
        }

        let now = self.clock.now();
        let mut wallet = self.cache.wallet;
        let mut inventory = self.cache.inventory.clone();
        wallet.debit(item.price)?;

        let mut ops = Vec::new();
        match (item.kind.consumable(), &cosmetic) {
            (Some(kind), _) => {
                self.inventory.add_consumable(&mut inventory, kind, item.quantity)?;
            }
            (None, Some(cosmetic)) => {
                self.inventory.unlock_cosmetic(&mut inventory, cosmetic);
                let record = PurchasedItem {
                    item_id: item.id.clone(),
                    kind: item.kind,
                    cosmetic_key: Some(cosmetic.key().to_string()),
                    price: item.price,
                    purchased_at: now,
                };
                ops.extend(self.owned_op(cosmetic));
                ops.extend(self.op(Collection::PurchasedItems, Uuid::new_v4().to_string(), &record));
                inventory.purchased_items.push(record);
            }
            (None, None) if item.kind == ShopItemKind::HabitSlot => {
                for _ in 0..item.quantity.max(1) {
                    self.inventory.grant_habit_slot(&mut inventory)?;
                }
            }
            (None, None) => return Err(EconomyError::UnknownItem(item.id)),
        }

        self.cache.wallet = wallet;
        self.cache.inventory = inventory;
        info!(item_id = %item.id, price = item.price, balance = wallet.balance, "purchase complete");

        ops.extend(self.wallet_op());
        ops.extend(self.inventory_op());
        self.persist(ops);
        self.events.publish(EconomyEvent::Purchased {
            item_id: item.id.clone(),
            price: item.price,
            balance: wallet.balance,
            at: now,
        });
        Ok(Purchase {
            item_id: item.id,
            price: item.price,
            balance: wallet.balance,
        })
    }

    /// Spend one inventory item.
    pub fn use_inventory_item(&mut self, item: UseItem) -> Result<ItemEffect, EconomyError> {
        let now = self.clock.now();
        let (consumed, effect, ops) = match item {
            UseItem::Multiplier { tier } => {
                let window = self.inventory.use_charge(&mut self.cache.inventory, tier, now)?;
                info!(%tier, until = %window.until, strength = window.strength, "multiplier activated");
                (
                    Consumable::Multiplier(tier),
                    ItemEffect::Multiplier { window },
                    self.inventory_op().into_iter().collect(),
                )
            }
            UseItem::StreakRecovery { habit_id } => {
                let today = self.today();
                let mut habit = self
                    .cache
                    .habit(habit_id)
                    .filter(|habit| habit.is_active())
                    .ok_or(EconomyError::HabitNotFound(habit_id))?
                    .clone();
                let mut inventory = self.cache.inventory.clone();
                let current_streak = self.inventory.use_streak_recovery(&mut inventory, &mut habit, today)?;
                self.cache.inventory = inventory;
                if let Some(stored) = self.cache.habit_mut(habit_id) {
                    *stored = habit.clone();
                }
                info!(%habit_id, current_streak, "streak recovered");
                let ops = [self.habit_op(&habit), self.inventory_op()].into_iter().flatten().collect();
                (
                    Consumable::StreakRecovery,
                    ItemEffect::StreakRecovered {
                        habit_id,
                        current_streak,
                    },
                    ops,
                )
            }
            UseItem::AutoCompletePass => {
                let targets: Vec<Uuid> = self.cache.active_habits().map(|habit| habit.id).collect();
                if targets.is_empty() {
                    return Err(EconomyError::NoActiveHabits);
                }
                self.inventory.take_auto_complete_pass(&mut self.cache.inventory)?;

                let today = self.today();
                let mut check_ins = Vec::with_capacity(targets.len());
                let mut ops: Vec<WriteOp> = self.inventory_op().into_iter().collect();
                for habit_id in targets {
                    let (outcome, writes) = self.apply_check_in(habit_id, true, today)?;
                    self.publish_check_in(&outcome);
                    ops.extend(writes);
                    check_ins.push(outcome);
                }
                info!(habits = check_ins.len(), "auto-complete pass used");
                (
                    Consumable::AutoCompletePass,
                    ItemEffect::AutoCompleted { check_ins },
                    ops,
                )
            }
        };

        self.persist(ops);
        self.events.publish(EconomyEvent::ItemUsed { item: consumed, at: now });
        Ok(effect)
    }

    /// Set or clear a habit's own flame color. The color must be owned.
    pub fn assign_flame_color(&mut self, habit_id: Uuid, color: Option<&str>) -> Result<Habit, EconomyError> {
        if let Some(key) = color {
            self.require_owned(&Cosmetic::FlameColor(key.to_string()))?;
        }
        let habit = self.cache.habit_mut(habit_id).ok_or(EconomyError::HabitNotFound(habit_id))?;
        habit.flame_color_id = color.map(str::to_string);
        let habit = habit.clone();

        self.persist(self.habit_op(&habit).into_iter().collect());
        if let Some(key) = color {
            self.events.publish(EconomyEvent::CosmeticApplied {
                cosmetic: Cosmetic::FlameColor(key.to_string()),
                habit_id: Some(habit_id),
                at: self.clock.now(),
            });
        }
        Ok(habit)
    }

    /// Set or clear the default flame color for all habits.
    pub fn set_active_flame_color(&mut self, color: Option<&str>) -> Result<(), EconomyError> {
        if let Some(key) = color {
            self.require_owned(&Cosmetic::FlameColor(key.to_string()))?;
        }
        self.cache.inventory.counts.active_flame_color = color.map(str::to_string);

        self.persist(self.inventory_op().into_iter().collect());
        if let Some(key) = color {
            self.events.publish(EconomyEvent::CosmeticApplied {
                cosmetic: Cosmetic::FlameColor(key.to_string()),
                habit_id: None,
                at: self.clock.now(),
            });
        }
        Ok(())
    }

    pub fn set_theme(&mut self, theme_key: &str) -> Result<(), EconomyError> {
        let settings = AppSettings {
            theme_key: theme_key.to_string(),
            ..self.cache.settings.clone()
        };
        self.update_settings(settings)
    }

    pub fn set_notifications(&mut self, enabled: bool, hour: u32, minute: u32) -> Result<(), EconomyError> {
        let settings = AppSettings {
            notifications_enabled: enabled,
            notification_hour: hour,
            notification_minute: minute,
            ..self.cache.settings.clone()
        };
        self.update_settings(settings)
    }

    /// Replace all settings. The theme must be owned and the reminder time valid.
    pub fn update_settings(&mut self, settings: AppSettings) -> Result<(), EconomyError> {
        self.require_owned(&Cosmetic::Theme(settings.theme_key.clone()))?;
        if settings.notification_hour > 23 || settings.notification_minute > 59 {
            return Err(EconomyError::InvalidSetting(format!(
                "notification time {:02}:{:02} is not a valid time of day",
                settings.notification_hour, settings.notification_minute
            )));
        }
        if settings == self.cache.settings {
            return Ok(());
        }
        self.cache.settings = settings;

        self.persist(self.settings_op().into_iter().collect());
        self.events.publish(EconomyEvent::SettingsChanged { at: self.clock.now() });
        Ok(())
    }

    /// Whether `cosmetic` is owned. The default flame color and theme always are.
    pub fn owns(&self, cosmetic: &Cosmetic) -> bool {
        self.inventory.owns(&self.cache.inventory, cosmetic)
    }

    fn require_owned(&self, cosmetic: &Cosmetic) -> Result<(), EconomyError> {
        if self.owns(cosmetic) {
            Ok(())
        } else {
            Err(EconomyError::NotUnlocked(cosmetic.key().to_string()))
        }
    }

    /// Stake `amount` coins that every active habit is completed each day for
    /// `target_days` days starting today. The stake is debited immediately.
    pub fn place_wager(&mut self, amount: u64, target_days: u32) -> Result<Wager, EconomyError> {
        let today = self.today();
        let active_wagers = self.cache.active_wagers().count();
        let active_habits = self.cache.active_habits().count();

        let mut wallet = self.cache.wallet;
        let wager = self
            .wagers
            .place(&mut wallet, amount, target_days, today, active_wagers, active_habits)?;
        self.cache.wallet = wallet;
        self.cache.insert_wager(wager.clone());

        let ops = [self.wager_op(&wager), self.wallet_op()].into_iter().flatten().collect();
        self.persist(ops);
        self.events.publish(EconomyEvent::WagerPlaced {
            wager_id: wager.id,
            amount,
            target_days,
            at: self.clock.now(),
        });
        Ok(wager)
    }

    /// Settle every running wager against the recorded entries.
    pub fn settle_wagers_for_today(&mut self) -> Vec<WagerVerdict> {
        let now = self.clock.now();
        let today = self.calendar.day_of(now);
        let hour = self.calendar.hour_of(now);
        let active_habits = self.cache.active_habit_ids();

        let mut verdicts = Vec::new();
        let mut settled = Vec::new();
        let mut payout = 0u64;
        for wager in self.cache.wagers.iter_mut().filter(|wager| wager.is_active) {
            let settlement = self
                .wagers
                .settle(wager, self.cache.entries.values(), &active_habits, today, hour);
            if let Settlement::Won { payout: coins } = settlement {
                payout = payout.saturating_add(coins);
            }
            if matches!(settlement, Settlement::Won { .. } | Settlement::Lost { .. }) {
                settled.push(wager.clone());
            }
            verdicts.push(WagerVerdict {
                wager_id: wager.id,
                settlement,
            });
        }

        if payout > 0 {
            self.cache.wallet.credit(payout);
        }
        if settled.is_empty() {
            return verdicts;
        }

        let mut ops: Vec<WriteOp> = settled.iter().filter_map(|wager| self.wager_op(wager)).collect();
        if payout > 0 {
            ops.extend(self.wallet_op());
        }
        self.persist(ops);
        for verdict in verdicts.iter().filter(|v| v.settlement != Settlement::Pending) {
            self.events.publish(EconomyEvent::WagerSettled {
                wager_id: verdict.wager_id,
                settlement: verdict.settlement,
                at: now,
            });
        }
        verdicts
    }

    /// Hand `ops` to the remote writer and refresh the mirror.
    fn persist(&self, ops: Vec<WriteOp>) {
        if let Some(remote) = &self.remote {
            remote.writer.submit(ops);
        }
        self.write_mirror();
    }

    fn write_mirror(&self) {
        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.write_state(&MirrorState::capture(&self.cache)) {
                warn!(error = %e, "failed to update local mirror");
            }
        }
    }

    fn op<T: Serialize>(&self, collection: Collection, id: impl Into<String>, value: &T) -> Option<WriteOp> {
        match WriteOp::put(collection, id, value, self.clock.now()) {
            Ok(op) => Some(op),
            Err(e) => {
                warn!(%collection, error = %e, "failed to encode document");
                None
            }
        }
    }

    fn habit_op(&self, habit: &Habit) -> Option<WriteOp> {
        self.op(Collection::Habits, habit.id.to_string(), habit)
    }

    fn entry_op(&self, entry: &HabitEntry) -> Option<WriteOp> {
        self.op(Collection::Entries, entry.id.to_string(), entry)
    }

    fn wager_op(&self, wager: &Wager) -> Option<WriteOp> {
        self.op(Collection::Wagers, wager.id.to_string(), wager)
    }

    fn wallet_op(&self) -> Option<WriteOp> {
        self.op(Collection::Wallet, SINGLETON_ID, &self.cache.wallet)
    }

    fn settings_op(&self) -> Option<WriteOp> {
        self.op(Collection::Settings, SINGLETON_ID, &self.cache.settings)
    }

    fn inventory_op(&self) -> Option<WriteOp> {
        self.op(Collection::Inventory, SINGLETON_ID, &self.cache.inventory.counts)
    }

    fn owned_op(&self, cosmetic: &Cosmetic) -> Option<WriteOp> {
        let collection = match cosmetic {
            Cosmetic::FlameColor(_) => Collection::OwnedFlameColors,
            Cosmetic::Theme(_) => Collection::OwnedThemes,
            Cosmetic::Badge(_) => Collection::UnlockedBadges,
        };
        let key = cosmetic.key().to_string();
        self.op(collection, key.clone(), &OwnedKey { key })
    }
}

/// Unwrap one concurrent read, substituting `fallback` on any failure.
fn or_default<T>(
    collection: Collection,
    joined: Result<Result<T, SyncError>, JoinError>,
    fallback: impl FnOnce() -> T,
    degraded: &mut Vec<Collection>,
) -> T {
    match joined {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            warn!(%collection, error = %e, "remote read failed, using defaults");
            degraded.push(collection);
            fallback()
        }
        Err(e) => {
            warn!(%collection, error = %e, "remote read task failed, using defaults");
            degraded.push(collection);
            fallback()
        }
    }
}
