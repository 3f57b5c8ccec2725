//! End-to-end tests for the economy facade.
//!
//! Every test drives [`Economy`] against an in-memory remote store and a
//! fixed clock, then checks both the cache and what reached the store.

use chrono::{Duration, NaiveDate};
use hearth_core::model::{CurrencyWallet, MultiplierTier};
use hearth_core::sync::{WriteOp, SINGLETON_ID};
use hearth_core::{
    Clock, Collection, Economy, EconomyError, EconomyEvent, EngineConfig, FixedClock, ItemEffect, LoadSource, LocalMirror,
    MemoryStore, RemoteSyncGateway, Settlement, SyncError, SyncPolicy, UseItem, UserIdentity,
};
use std::sync::Arc;
use tokio::runtime::Handle;

// ============================================================================
// Test Helpers
// ============================================================================

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

struct Harness {
    store: Arc<MemoryStore>,
    clock: Arc<FixedClock>,
    economy: Economy,
}

impl Harness {
    fn gateway(&self) -> RemoteSyncGateway {
        RemoteSyncGateway::new(self.store.clone(), UserIdentity::new("tester"))
    }

    /// Move the clock to 09:00 on `d`.
    fn go_to(&self, d: u32) {
        self.clock.set(FixedClock::at(day(d), 9).now());
    }

    /// A second economy over the same store, not yet loaded.
    fn fresh(&self) -> Economy {
        Economy::new(EngineConfig::default(), self.clock.clone(), Handle::current()).with_gateway(self.gateway())
    }

    /// A second economy over the same store, as after an app restart.
    async fn reopen(&self) -> Economy {
        let mut economy = self.fresh();
        economy.load_all().await;
        economy
    }
}

/// Stamped at midnight so every write the economy makes later wins.
fn seed_wallet(store: &Arc<MemoryStore>, balance: u64) {
    let gateway = RemoteSyncGateway::new(store.clone(), UserIdentity::new("tester"));
    let stamp = FixedClock::at(day(1), 0).now();
    let op = WriteOp::put(Collection::Wallet, SINGLETON_ID, &CurrencyWallet::new(balance), stamp).unwrap();
    gateway.apply(&op).unwrap();
}

async fn harness_with(config: EngineConfig, balance: u64) -> Harness {
    let store = Arc::new(MemoryStore::new());
    if balance > 0 {
        seed_wallet(&store, balance);
    }
    let clock = Arc::new(FixedClock::at(day(1), 9));
    let gateway = RemoteSyncGateway::new(store.clone(), UserIdentity::new("tester"));
    let mut economy = Economy::new(config, clock.clone(), Handle::current()).with_gateway(gateway);
    let report = economy.load_all().await;
    assert!(report.is_complete());
    Harness { store, clock, economy }
}

async fn harness(balance: u64) -> Harness {
    harness_with(EngineConfig::default(), balance).await
}

// ============================================================================
// Check-ins and streaks
// ============================================================================

#[tokio::test]
async fn streak_lifecycle_with_lazy_break() {
    let mut h = harness(0).await;
    let habit = h.economy.create_habit("Meditate", "lotus").unwrap();

    let d1 = h.economy.check_in(habit.id, true).unwrap();
    assert_eq!(d1.habit.current_streak, 1);
    assert_eq!(d1.coins, 11);

    h.go_to(2);
    let d2 = h.economy.check_in(habit.id, true).unwrap();
    assert_eq!(d2.habit.current_streak, 2);
    assert_eq!(d2.coins, 12);

    h.go_to(3);
    let d3 = h.economy.check_in(habit.id, false).unwrap();
    assert!(!d3.freeze_used);
    assert_eq!(d3.coins, 0);
    assert_eq!(d3.habit.current_streak, 2);
    assert!(d3.habit.brightness < d2.habit.brightness);

    h.go_to(5);
    let d5 = h.economy.check_in(habit.id, true).unwrap();
    assert_eq!(d5.habit.current_streak, 1);
    assert_eq!(d5.habit.best_streak, 2);
    assert_eq!(d5.coins, 11);
    assert_eq!(h.economy.cache().wallet().balance, 34);

    h.economy.settle_writes().await;
    let reopened = h.reopen().await;
    let stored = reopened.cache().habit(habit.id).unwrap();
    assert_eq!(stored.current_streak, 1);
    assert_eq!(stored.best_streak, 2);
    assert_eq!(reopened.cache().wallet().balance, 34);
    assert_eq!(reopened.cache().wallet().total_earned, 34);
    assert_eq!(reopened.cache().entries_for(habit.id).count(), 4);
}

#[tokio::test]
async fn same_day_recheck_pays_once() {
    let mut h = harness(0).await;
    let habit = h.economy.create_habit("Read", "book").unwrap();

    let first = h.economy.check_in(habit.id, true).unwrap();
    let second = h.economy.check_in(habit.id, true).unwrap();
    assert_eq!(first.coins, 11);
    assert_eq!(second.coins, 0);
    assert_eq!(second.habit.current_streak, 1);
    assert_eq!(second.entry.id, first.entry.id);
    assert_eq!(h.economy.cache().wallet().balance, 11);
    assert_eq!(h.economy.cache().entries().count(), 1);
}

#[tokio::test]
async fn miss_overwrites_completed_day_without_refund() {
    let mut h = harness(0).await;
    let habit = h.economy.create_habit("Read", "book").unwrap();
    let done = h.economy.check_in(habit.id, true).unwrap();

    let miss = h.economy.check_in(habit.id, false).unwrap();
    assert!(miss.changed);
    assert!(!miss.entry.did_complete);
    assert_eq!(miss.entry.id, done.entry.id);
    assert_eq!(miss.habit.current_streak, 1);
    assert_eq!(h.economy.cache().wallet().balance, 11);

    let again = h.economy.check_in(habit.id, false).unwrap();
    assert!(!again.changed);

    let redone = h.economy.check_in(habit.id, true).unwrap();
    assert!(redone.entry.did_complete);
    assert_eq!(redone.coins, 0);
    assert_eq!(redone.habit.current_streak, 1);
    assert_eq!(h.economy.cache().wallet().balance, 11);
    assert_eq!(h.economy.cache().entries().count(), 1);
}

#[tokio::test]
async fn backfilled_day_pays_but_keeps_the_streak() {
    let mut h = harness(0).await;
    let habit = h.economy.create_habit("Run", "shoe").unwrap();
    for d in [1, 2, 4, 5, 6] {
        h.go_to(d);
        h.economy.check_in(habit.id, true).unwrap();
    }
    let before = h.economy.cache().wallet().balance;

    let backfill = h.economy.check_in_on(habit.id, true, day(3)).unwrap();
    assert_eq!(backfill.habit.current_streak, 3);
    assert_eq!(backfill.habit.best_streak, 3);
    assert_eq!(backfill.habit.last_check_in_date, Some(day(6)));
    assert_eq!(backfill.coins, 13);
    assert!(backfill.entry.did_complete);
    assert_eq!(h.economy.cache().wallet().balance, before + 13);

    h.go_to(7);
    let d7 = h.economy.check_in(habit.id, true).unwrap();
    assert_eq!(d7.habit.current_streak, 4);
    assert_eq!(d7.habit.best_streak, 4);
    assert_eq!(h.economy.cache().entries_for(habit.id).count(), 7);
}

#[tokio::test]
async fn freeze_covers_a_miss() {
    let mut h = harness(100).await;
    let habit = h.economy.create_habit("Swim", "wave").unwrap();
    h.economy.check_in(habit.id, true).unwrap();
    h.economy.purchase("streak_freeze").unwrap();
    assert_eq!(h.economy.cache().inventory().counts.streak_freezes, 1);

    h.go_to(2);
    let before = h.economy.cache().habit(habit.id).unwrap().clone();
    let missed = h.economy.check_in(habit.id, false).unwrap();
    assert!(missed.freeze_used);
    assert_eq!(missed.habit.brightness, before.brightness);
    assert_eq!(missed.habit.current_streak, before.current_streak);
    assert_eq!(h.economy.cache().inventory().counts.streak_freezes, 0);

    h.go_to(3);
    let dimmed = h.economy.check_in(habit.id, false).unwrap();
    assert!(!dimmed.freeze_used);
    assert!(dimmed.habit.brightness < before.brightness);
}

#[tokio::test]
async fn extinguished_habits_cannot_check_in() {
    let mut h = harness(0).await;
    let habit = h.economy.create_habit("Journal", "pen").unwrap();
    h.economy.extinguish_habit(habit.id).unwrap();
    assert_eq!(
        h.economy.check_in(habit.id, true),
        Err(EconomyError::HabitNotFound(habit.id))
    );
    assert_eq!(h.economy.cache().active_habits().count(), 0);
}

#[tokio::test]
async fn delete_habit_purges_remote_entries() {
    let mut h = harness(0).await;
    let habit = h.economy.create_habit("Stretch", "yoga").unwrap();
    h.economy.check_in(habit.id, true).unwrap();
    h.go_to(2);
    h.economy.check_in(habit.id, true).unwrap();
    h.economy.settle_writes().await;
    assert_eq!(h.store.count("tester", Collection::Entries), 2);

    h.economy.delete_habit(habit.id).unwrap();
    h.economy.settle_writes().await;
    assert_eq!(h.store.count("tester", Collection::Habits), 0);
    assert_eq!(h.store.count("tester", Collection::Entries), 0);
}

#[tokio::test]
async fn notes_attach_to_the_day_entry() {
    let mut h = harness(0).await;
    let habit = h.economy.create_habit("Run", "shoe").unwrap();
    let done = h.economy.check_in(habit.id, true).unwrap();

    let noted = h
        .economy
        .save_note(habit.id, day(1), Some("5k in the rain".into()), Some(5.0))
        .unwrap();
    assert_eq!(noted.id, done.entry.id);
    assert!(noted.did_complete);
    assert_eq!(noted.value, Some(5.0));

    let fresh = h.economy.save_note(habit.id, day(2), Some("planned".into()), None).unwrap();
    assert!(!fresh.did_complete);
    assert_eq!(h.economy.cache().entries_for(habit.id).count(), 2);
}

// ============================================================================
// Shop and inventory
// ============================================================================

#[tokio::test]
async fn purchase_beyond_balance_fails_and_changes_nothing() {
    let mut h = harness(100).await;
    let before = h.economy.cache().inventory().clone();

    let err = h.economy.purchase("streak_recovery").unwrap_err();
    assert_eq!(
        err,
        EconomyError::InsufficientFunds {
            needed: 150,
            available: 100
        }
    );
    assert!(err.to_string().contains("insufficient funds"));
    assert_eq!(h.economy.cache().wallet().balance, 100);
    assert_eq!(h.economy.cache().inventory(), &before);
}

#[tokio::test]
async fn cosmetics_are_bought_once() {
    let mut h = harness(400).await;
    let receipt = h.economy.purchase("flame_azure").unwrap();
    assert_eq!(receipt.balance, 250);
    assert_eq!(
        h.economy.purchase("flame_azure"),
        Err(EconomyError::AlreadyOwned("azure".into()))
    );
    assert_eq!(h.economy.cache().wallet().balance, 250);
    assert_eq!(h.economy.cache().inventory().purchased_items.len(), 1);

    h.economy.settle_writes().await;
    assert_eq!(h.store.count("tester", Collection::OwnedFlameColors), 1);
    assert_eq!(h.store.count("tester", Collection::PurchasedItems), 1);

    let reopened = h.reopen().await;
    assert!(reopened.cache().inventory().owned_flame_colors.contains("azure"));
    assert_eq!(reopened.cache().wallet().balance, 250);
}

#[tokio::test]
async fn flame_colors_and_themes_require_ownership() {
    let mut h = harness(300).await;
    let habit = h.economy.create_habit("Cook", "pan").unwrap();

    assert_eq!(
        h.economy.assign_flame_color(habit.id, Some("violet")).unwrap_err(),
        EconomyError::NotUnlocked("violet".into())
    );
    h.economy.purchase("flame_violet").unwrap();
    let habit = h.economy.assign_flame_color(habit.id, Some("violet")).unwrap();
    assert_eq!(habit.flame_color_id.as_deref(), Some("violet"));
    h.economy.set_active_flame_color(Some("ember")).unwrap();

    assert_eq!(
        h.economy.set_theme("aurora"),
        Err(EconomyError::NotUnlocked("aurora".into()))
    );
    h.economy.set_theme("classic").unwrap();
    assert!(matches!(
        h.economy.set_notifications(true, 24, 0),
        Err(EconomyError::InvalidSetting(_))
    ));
    h.economy.set_notifications(true, 7, 30).unwrap();
    assert_eq!(h.economy.cache().settings().notification_minute, 30);
}

#[tokio::test]
async fn multiplier_preview_matches_check_in() {
    let mut h = harness(100).await;
    let habit = h.economy.create_habit("Walk", "shoe").unwrap();
    h.economy.purchase("multiplier_24h").unwrap();

    let effect = h
        .economy
        .use_inventory_item(UseItem::Multiplier {
            tier: MultiplierTier::Day,
        })
        .unwrap();
    assert!(matches!(effect, ItemEffect::Multiplier { .. }));

    let preview = h.economy.estimate_reward(habit.id).unwrap();
    assert_eq!(preview, 16);
    let outcome = h.economy.check_in(habit.id, true).unwrap();
    assert_eq!(outcome.coins, preview);
    assert_eq!(h.economy.estimate_reward(habit.id).unwrap(), 0);

    assert_eq!(
        h.economy.use_inventory_item(UseItem::Multiplier {
            tier: MultiplierTier::Day
        }),
        Err(EconomyError::NoneLeft(hearth_core::model::Consumable::Multiplier(
            MultiplierTier::Day
        )))
    );

    h.clock.advance(Duration::hours(25));
    let late = h.economy.create_habit("Floss", "tooth").unwrap();
    assert_eq!(h.economy.estimate_reward(late.id).unwrap(), 11);
}

#[tokio::test]
async fn streak_recovery_caps_at_best_and_refuses_completed_days() {
    let mut h = harness(500).await;
    let habit = h.economy.create_habit("Code", "laptop").unwrap();
    for d in 1..=3 {
        h.go_to(d);
        h.economy.check_in(habit.id, true).unwrap();
    }
    h.go_to(6);
    h.economy.check_in(habit.id, true).unwrap();
    h.economy.purchase("streak_recovery").unwrap();
    h.economy.purchase("streak_recovery").unwrap();

    let refused = h
        .economy
        .use_inventory_item(UseItem::StreakRecovery { habit_id: habit.id });
    assert_eq!(refused, Err(EconomyError::AlreadyCompletedToday));
    assert_eq!(h.economy.cache().inventory().counts.streak_recovery_passes, 2);

    h.go_to(7);
    let effect = h
        .economy
        .use_inventory_item(UseItem::StreakRecovery { habit_id: habit.id })
        .unwrap();
    assert_eq!(
        effect,
        ItemEffect::StreakRecovered {
            habit_id: habit.id,
            current_streak: 3
        }
    );
    assert_eq!(h.economy.cache().inventory().counts.streak_recovery_passes, 1);
}

#[tokio::test]
async fn recovered_streak_still_breaks_on_a_gapped_completion() {
    let mut h = harness(500).await;
    let habit = h.economy.create_habit("Code", "laptop").unwrap();
    for d in [1, 2, 3, 4, 6] {
        h.go_to(d);
        h.economy.check_in(habit.id, true).unwrap();
    }
    h.economy.purchase("streak_recovery").unwrap();

    h.go_to(8);
    let effect = h
        .economy
        .use_inventory_item(UseItem::StreakRecovery { habit_id: habit.id })
        .unwrap();
    assert_eq!(
        effect,
        ItemEffect::StreakRecovered {
            habit_id: habit.id,
            current_streak: 4
        }
    );
    assert_eq!(h.economy.cache().habit(habit.id).unwrap().last_check_in_date, Some(day(6)));

    let after = h.economy.check_in(habit.id, true).unwrap();
    assert_eq!(after.habit.current_streak, 1);
    assert_eq!(after.habit.best_streak, 4);
}

#[tokio::test]
async fn auto_complete_pass_checks_in_every_active_habit() {
    let mut h = harness(500).await;
    h.economy.purchase("auto_complete_pass").unwrap();
    assert_eq!(
        h.economy.use_inventory_item(UseItem::AutoCompletePass),
        Err(EconomyError::NoActiveHabits)
    );
    assert_eq!(h.economy.cache().inventory().counts.auto_complete_passes, 1);

    let a = h.economy.create_habit("A", "a").unwrap();
    let b = h.economy.create_habit("B", "b").unwrap();
    let gone = h.economy.create_habit("C", "c").unwrap();
    h.economy.extinguish_habit(gone.id).unwrap();

    let balance = h.economy.cache().wallet().balance;
    match h.economy.use_inventory_item(UseItem::AutoCompletePass).unwrap() {
        ItemEffect::AutoCompleted { check_ins } => {
            let ids: Vec<_> = check_ins.iter().map(|c| c.habit.id).collect();
            assert_eq!(ids, vec![a.id, b.id]);
        }
        other => panic!("unexpected effect {other:?}"),
    }
    assert_eq!(h.economy.cache().wallet().balance, balance + 22);
    assert_eq!(h.economy.cache().inventory().counts.auto_complete_passes, 0);
}

#[tokio::test]
async fn habit_slots_gate_creation() {
    let mut h = harness(500).await;
    for name in ["one", "two", "three"] {
        h.economy.create_habit(name, "dot").unwrap();
    }
    assert_eq!(
        h.economy.create_habit("four", "dot"),
        Err(EconomyError::HabitLimitReached { max: 3 })
    );
    h.economy.purchase("habit_slot").unwrap();
    assert!(h.economy.create_habit("four", "dot").is_ok());
}

// ============================================================================
// Wagers
// ============================================================================

#[tokio::test]
async fn fully_completed_wager_pays_double() {
    let mut h = harness(100).await;
    let habit = h.economy.create_habit("Pushups", "arm").unwrap();
    let wager = h.economy.place_wager(40, 2).unwrap();
    assert_eq!(wager.end_date, day(3));
    assert_eq!(h.economy.cache().wallet().balance, 60);
    assert_eq!(h.economy.place_wager(10, 2), Err(EconomyError::WagerAlreadyActive));

    let mut earned = 0;
    for d in 1..=3 {
        h.go_to(d);
        earned += h.economy.check_in(habit.id, true).unwrap().coins;
        assert_eq!(h.economy.settle_wagers_for_today()[0].settlement, Settlement::Pending);
    }

    h.go_to(4);
    let verdicts = h.economy.settle_wagers_for_today();
    assert_eq!(verdicts[0].settlement, Settlement::Won { payout: 80 });
    assert_eq!(h.economy.cache().wallet().balance, 60 + earned + 80);
    assert!(h.economy.settle_wagers_for_today().is_empty());

    h.economy.settle_writes().await;
    let reopened = h.reopen().await;
    assert_eq!(reopened.cache().wagers()[0].is_won, Some(true));
    assert!(!reopened.cache().wagers()[0].is_active);
}

#[tokio::test]
async fn one_incomplete_day_loses_the_wager() {
    let mut config = EngineConfig::default();
    config.wager.early_loss = false;
    let mut h = harness_with(config, 100).await;
    let habit = h.economy.create_habit("Pushups", "arm").unwrap();
    h.economy.place_wager(40, 2).unwrap();

    let mut earned = 0;
    for d in [1, 3] {
        h.go_to(d);
        earned += h.economy.check_in(habit.id, true).unwrap().coins;
    }
    h.go_to(4);
    let verdicts = h.economy.settle_wagers_for_today();
    assert_eq!(verdicts[0].settlement, Settlement::Lost { day: day(2) });
    assert_eq!(h.economy.cache().wallet().balance, 60 + earned);
}

#[tokio::test]
async fn late_cutoff_forfeits_early() {
    let mut h = harness(100).await;
    h.economy.create_habit("Pushups", "arm").unwrap();
    h.economy.place_wager(40, 5).unwrap();

    h.clock.set(FixedClock::at(day(1), 23).now());
    let verdicts = h.economy.settle_wagers_for_today();
    assert_eq!(verdicts[0].settlement, Settlement::Lost { day: day(1) });
    assert_eq!(h.economy.cache().wallet().balance, 60);
}

#[tokio::test]
async fn wager_needs_funds_and_habits() {
    let mut h = harness(30).await;
    assert_eq!(h.economy.place_wager(10, 3), Err(EconomyError::NoActiveHabits));
    h.economy.create_habit("Read", "book").unwrap();
    assert_eq!(
        h.economy.place_wager(50, 3),
        Err(EconomyError::InsufficientFunds {
            needed: 50,
            available: 30
        })
    );
    assert!(matches!(
        h.economy.place_wager(10, 31),
        Err(EconomyError::InvalidWagerDuration { days: 31, .. })
    ));
    assert_eq!(h.economy.place_wager(0, 3), Err(EconomyError::InvalidWagerAmount));
    assert_eq!(h.economy.cache().wallet().balance, 30);
}

#[tokio::test]
async fn wager_loses_once_every_habit_is_extinguished() {
    let mut h = harness(100).await;
    let habit = h.economy.create_habit("Pushups", "arm").unwrap();
    h.economy.place_wager(50, 2).unwrap();
    h.economy.extinguish_habit(habit.id).unwrap();

    h.go_to(10);
    let verdicts = h.economy.settle_wagers_for_today();
    assert_eq!(verdicts[0].settlement, Settlement::Lost { day: day(1) });
    assert_eq!(h.economy.cache().wallet().balance, 50);
    assert_eq!(h.economy.cache().wagers()[0].is_won, Some(false));
}

// ============================================================================
// Sync contract
// ============================================================================

#[tokio::test]
async fn failed_reads_degrade_to_defaults() {
    let mut h = harness(80).await;
    let habit = h.economy.create_habit("Read", "book").unwrap();
    h.economy.settle_writes().await;

    h.store.fail(Collection::Wallet);
    h.store.fail(Collection::Wagers);
    let mut economy = h.fresh();
    let report = economy.load_all().await;

    assert_eq!(report.source, LoadSource::Remote);
    assert_eq!(report.degraded, vec![Collection::Wallet, Collection::Wagers]);
    assert!(economy.cache().is_loaded());
    assert_eq!(economy.cache().habit(habit.id).unwrap().name, "Read");
    assert_eq!(economy.cache().wallet().balance, 0);
}

#[tokio::test]
async fn write_failures_never_reach_the_caller() {
    let mut h = harness(0).await;
    h.store.fail(Collection::Habits);
    let habit = h.economy.create_habit("Read", "book").unwrap();
    h.economy.settle_writes().await;

    assert!(h.economy.cache().habit(habit.id).is_some());
    assert_eq!(h.store.count("tester", Collection::Habits), 0);
    assert_eq!(h.economy.pending_outbox(), 0);
}

#[tokio::test]
async fn outbox_policy_replays_failed_writes() {
    let mut config = EngineConfig::default();
    config.sync.policy = SyncPolicy::Outbox;
    let mut h = harness_with(config, 0).await;

    h.store.fail(Collection::Habits);
    h.economy.create_habit("Read", "book").unwrap();
    h.economy.settle_writes().await;
    assert_eq!(h.economy.pending_outbox(), 1);

    let still_down = h.economy.flush_outbox().await.unwrap();
    assert_eq!(still_down.applied, 0);
    assert_eq!(still_down.remaining, 1);

    h.store.heal(Collection::Habits);
    let flushed = h.economy.flush_outbox().await.unwrap();
    assert_eq!(flushed.applied, 1);
    assert_eq!(flushed.remaining, 0);
    assert_eq!(h.store.count("tester", Collection::Habits), 1);
}

#[tokio::test]
async fn outbox_never_replays_a_superseded_write() {
    let mut config = EngineConfig::default();
    config.sync.policy = SyncPolicy::Outbox;
    let mut h = harness_with(config, 0).await;

    h.store.fail(Collection::Habits);
    let habit = h.economy.create_habit("Read", "book").unwrap();
    h.economy.settle_writes().await;
    assert_eq!(h.economy.pending_outbox(), 1);

    h.store.heal(Collection::Habits);
    h.economy.delete_habit(habit.id).unwrap();
    h.economy.settle_writes().await;
    assert_eq!(h.economy.pending_outbox(), 0);

    let flushed = h.economy.flush_outbox().await.unwrap();
    assert_eq!(flushed.applied, 0);
    assert_eq!(h.store.count("tester", Collection::Habits), 0);

    let reopened = h.reopen().await;
    assert!(reopened.cache().habit(habit.id).is_none());
}

#[tokio::test]
async fn delete_account_reports_partial_failure() {
    let mut h = harness(50).await;
    let habit = h.economy.create_habit("Read", "book").unwrap();
    h.economy.check_in(habit.id, true).unwrap();
    h.economy.settle_writes().await;

    h.store.fail(Collection::Entries);
    match h.economy.delete_account().await {
        Err(SyncError::PartialDelete { failed }) => assert_eq!(failed, vec![Collection::Entries]),
        other => panic!("unexpected {other:?}"),
    }
    assert!(h.economy.cache().habit(habit.id).is_some());
    assert_eq!(h.store.count("tester", Collection::Habits), 0);

    h.store.heal(Collection::Entries);
    h.economy.delete_account().await.unwrap();
    assert!(h.economy.cache().habits().is_empty());
    assert_eq!(h.economy.cache().wallet().balance, 0);
    for collection in Collection::ALL {
        assert_eq!(h.store.count("tester", collection), 0, "{collection} not empty");
    }
}

#[tokio::test]
async fn delete_account_requires_identity() {
    let mut economy = Economy::new(
        EngineConfig::default(),
        Arc::new(FixedClock::at(day(1), 9)),
        Handle::current(),
    );
    assert!(matches!(economy.delete_account().await, Err(SyncError::NotSignedIn)));
}

#[tokio::test]
async fn clear_session_keeps_the_gateway() {
    let mut h = harness(70).await;
    h.economy.clear_session();
    assert!(!h.economy.cache().is_loaded());
    assert_eq!(h.economy.cache().wallet().balance, 0);
    assert!(h.economy.is_signed_in());

    h.economy.load_all().await;
    assert_eq!(h.economy.cache().wallet().balance, 70);
}

#[tokio::test]
async fn subscribers_see_mutations() {
    let mut h = harness(0).await;
    let mut events = h.economy.subscribe();
    let habit = h.economy.create_habit("Read", "book").unwrap();
    h.economy.check_in(habit.id, true).unwrap();

    assert!(matches!(events.try_recv().unwrap(), EconomyEvent::HabitCreated { .. }));
    match events.try_recv().unwrap() {
        EconomyEvent::CheckedIn {
            habit_id,
            coins,
            current_streak,
            ..
        } => {
            assert_eq!(habit_id, habit.id);
            assert_eq!(coins, 11);
            assert_eq!(current_streak, 1);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

// ============================================================================
// Local mirror
// ============================================================================

#[tokio::test]
async fn mirror_seeds_cold_start_without_identity() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("mirror.db");
    let clock = Arc::new(FixedClock::at(day(1), 9));

    {
        let mut economy = Economy::new(EngineConfig::default(), clock.clone(), Handle::current())
            .with_mirror(LocalMirror::open(&path).unwrap());
        assert_eq!(economy.load_all().await.source, LoadSource::Mirror);
        let habit = economy.create_habit("Read", "book").unwrap();
        economy.check_in(habit.id, true).unwrap();
        economy.set_notifications(true, 21, 15).unwrap();
    }

    let mut economy = Economy::new(EngineConfig::default(), clock, Handle::current())
        .with_mirror(LocalMirror::open(&path).unwrap());
    let report = economy.load_all().await;
    assert_eq!(report.source, LoadSource::Mirror);
    assert_eq!(economy.cache().wallet().balance, 11);
    assert_eq!(economy.cache().settings().notification_hour, 21);
    assert!(economy.cache().habits().is_empty());
}
