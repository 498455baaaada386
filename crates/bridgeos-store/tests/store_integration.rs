// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store-level integration tests against a real PostgreSQL instance.
//!
//! Each test self-skips unless `BRIDGEOS_TEST_DATABASE_URL` points at a
//! database it may write to. Ids are generated per test run so tests can
//! share one database without interfering.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use bridgeos_config::model::StorageConfig;
use bridgeos_core::{BridgeError, Role};
use bridgeos_store::queries::connections::UnbindOutcome;
use bridgeos_store::queries::usage::GateOutcome;
use bridgeos_store::queries::{connections, managers, messages, subscriptions, usage, users, workers};
use bridgeos_store::Store;

static NEXT_ID: AtomicI64 = AtomicI64::new(0);

/// Fresh user id, unique across this test process.
fn uid() -> i64 {
    let base = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_micros() as i64;
    base * 1000 + NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

async fn test_store() -> Option<Store> {
    let url = std::env::var("BRIDGEOS_TEST_DATABASE_URL").ok()?;
    let config = StorageConfig {
        database_url: Some(url),
        pool_min: 1,
        pool_max: 5,
        acquire_timeout_secs: 5,
    };
    let store = Store::connect(&config).await.expect("test database reachable");
    store.migrate().await.expect("migrations apply");
    Some(store)
}

macro_rules! require_store {
    () => {
        match test_store().await {
            Some(store) => store,
            None => {
                eprintln!("skipping: BRIDGEOS_TEST_DATABASE_URL not set");
                return;
            }
        }
    };
}

/// Creates a registered manager and worker pair, returning their ids.
async fn seed_pair(store: &Store, code: &str) -> (i64, i64) {
    let manager_id = uid();
    let worker_id = uid();
    users::upsert(store.pool(), manager_id, "Manager", Some("English"), None)
        .await
        .unwrap();
    users::upsert(store.pool(), worker_id, "Worker", Some("Spanish"), None)
        .await
        .unwrap();
    managers::create(store.pool(), manager_id, code, "dairy_farm")
        .await
        .unwrap();
    workers::create(store.pool(), worker_id).await.unwrap();
    (manager_id, worker_id)
}

fn code() -> String {
    format!("BRIDGE-{:05}", uid().rem_euclid(100000))
}

#[tokio::test]
async fn two_binds_race_one_slot_exactly_one_commits() {
    let store = require_store!();
    let (manager_id, worker_a) = seed_pair(&store, &code()).await;
    let worker_b = uid();
    users::upsert(store.pool(), worker_b, "Worker B", Some("Spanish"), None)
        .await
        .unwrap();
    workers::create(store.pool(), worker_b).await.unwrap();

    // Concurrent binds to the same (manager, slot).
    let (first, second) = tokio::join!(
        connections::bind(store.pool(), manager_id, worker_a, 2),
        connections::bind(store.pool(), manager_id, worker_b, 2),
    );

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one bind must commit");

    let loser = if first.is_err() { first } else { second };
    assert!(matches!(
        loser,
        Err(BridgeError::SlotOccupied { bot_slot: 2, .. })
    ));

    let active = connections::list_active_for_manager(store.pool(), manager_id)
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].bot_slot, 2);
}

#[tokio::test]
async fn worker_cannot_hold_two_active_connections() {
    let store = require_store!();
    let (manager_a, worker_id) = seed_pair(&store, &code()).await;
    let manager_b = uid();
    users::upsert(store.pool(), manager_b, "Manager B", Some("English"), None)
        .await
        .unwrap();
    managers::create(store.pool(), manager_b, &code(), "construction")
        .await
        .unwrap();

    connections::bind(store.pool(), manager_a, worker_id, 1)
        .await
        .unwrap();
    let second = connections::bind(store.pool(), manager_b, worker_id, 1).await;
    assert!(matches!(
        second,
        Err(BridgeError::WorkerAlreadyConnected { .. })
    ));
}

#[tokio::test]
async fn unbind_is_idempotent_and_preserves_the_row() {
    let store = require_store!();
    let (manager_id, worker_id) = seed_pair(&store, &code()).await;
    let connection_id = connections::bind(store.pool(), manager_id, worker_id, 3)
        .await
        .unwrap();

    let first = connections::unbind(store.pool(), connection_id).await.unwrap();
    assert_eq!(first, UnbindOutcome::Disconnected(connection_id));

    let second = connections::unbind(store.pool(), connection_id).await.unwrap();
    assert_eq!(second, UnbindOutcome::AlreadyDisconnected);

    // History survives as a disconnected row.
    let row = connections::get_by_id(store.pool(), connection_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!row.is_active());
    assert!(row.disconnected_at.is_some());
}

#[tokio::test]
async fn freed_slot_can_be_rebound() {
    let store = require_store!();
    let (manager_id, worker_a) = seed_pair(&store, &code()).await;
    let worker_b = uid();
    users::upsert(store.pool(), worker_b, "Worker B", None, None)
        .await
        .unwrap();
    workers::create(store.pool(), worker_b).await.unwrap();

    let first = connections::bind(store.pool(), manager_id, worker_a, 2)
        .await
        .unwrap();
    connections::unbind(store.pool(), first).await.unwrap();

    // The partial index only covers active rows, so slot 2 is free again.
    connections::bind(store.pool(), manager_id, worker_b, 2)
        .await
        .unwrap();
}

#[tokio::test]
async fn usage_gate_consumes_to_the_limit_then_denies() {
    let store = require_store!();
    let (manager_id, _) = seed_pair(&store, &code()).await;
    let free_limit = 3;

    usage::get_or_create(store.pool(), manager_id).await.unwrap();

    // Three units are allowed; the third sets the block flag.
    for expected in 1..=3 {
        let outcome = usage::consume(store.pool(), manager_id, free_limit)
            .await
            .unwrap();
        match outcome {
            GateOutcome::Allowed {
                new_count,
                now_blocked,
            } => {
                assert_eq!(new_count, expected);
                assert_eq!(now_blocked, expected == free_limit);
            }
            GateOutcome::Denied => panic!("unit {expected} should be allowed"),
        }
    }

    // The fourth is denied and the counter stays put.
    let denied = usage::consume(store.pool(), manager_id, free_limit)
        .await
        .unwrap();
    assert_eq!(denied, GateOutcome::Denied);

    let row = usage::get_or_create(store.pool(), manager_id).await.unwrap();
    assert_eq!(row.messages_sent, 3);
    assert!(row.is_blocked);
    assert!(row.first_message_at.is_some());

    // Reset clears both counter and flag.
    usage::reset(store.pool(), manager_id).await.unwrap();
    let row = usage::get_or_create(store.pool(), manager_id).await.unwrap();
    assert_eq!(row.messages_sent, 0);
    assert!(!row.is_blocked);
}

#[tokio::test]
async fn subscription_upsert_replay_converges() {
    let store = require_store!();
    let (manager_id, _) = seed_pair(&store, &code()).await;

    let apply = || {
        subscriptions::upsert(
            store.pool(),
            manager_id,
            Some("sub_replay"),
            bridgeos_core::SubscriptionStatus::Active,
            Some("https://billing.example/portal"),
            None,
            None,
        )
    };

    let first = apply().await.unwrap();
    let second = apply().await.unwrap();

    // Same row, same status, no duplicates; updated_at may only advance.
    assert_eq!(first.subscription_id, second.subscription_id);
    assert_eq!(second.status, "active");
    assert_eq!(second.external_id.as_deref(), Some("sub_replay"));
    assert!(second.updated_at >= first.updated_at);

    let fetched = subscriptions::get_by_manager(store.pool(), manager_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.subscription_id, first.subscription_id);
}

#[tokio::test]
async fn soft_deleted_manager_releases_its_code() {
    let store = require_store!();
    let shared_code = code();
    let (manager_id, _) = seed_pair(&store, &shared_code).await;

    assert!(managers::code_exists(store.pool(), &shared_code).await.unwrap());
    managers::soft_delete(store.pool(), manager_id).await.unwrap();
    assert!(!managers::code_exists(store.pool(), &shared_code).await.unwrap());

    // A new manager may take the code; the partial index allows it.
    let successor = uid();
    users::upsert(store.pool(), successor, "Successor", None, None)
        .await
        .unwrap();
    managers::create(store.pool(), successor, &shared_code, "dairy_farm")
        .await
        .unwrap();
}

#[tokio::test]
async fn role_is_the_unique_active_one() {
    let store = require_store!();
    let (manager_id, worker_id) = seed_pair(&store, &code()).await;

    assert_eq!(
        managers::get_role(store.pool(), manager_id).await.unwrap(),
        Some(Role::Manager)
    );
    assert_eq!(
        managers::get_role(store.pool(), worker_id).await.unwrap(),
        Some(Role::Worker)
    );

    // Reset-and-switch: soft-delete the manager row, register as worker.
    managers::soft_delete(store.pool(), manager_id).await.unwrap();
    workers::create(store.pool(), manager_id).await.unwrap();
    assert_eq!(
        managers::get_role(store.pool(), manager_id).await.unwrap(),
        Some(Role::Worker)
    );

    assert_eq!(managers::get_role(store.pool(), uid()).await.unwrap(), None);
}

#[tokio::test]
async fn translation_context_is_chronological_and_bounded() {
    let store = require_store!();
    let (manager_id, worker_id) = seed_pair(&store, &code()).await;
    let connection_id = connections::bind(store.pool(), manager_id, worker_id, 1)
        .await
        .unwrap();

    // Fresh connection: empty window.
    let empty = messages::translation_context(store.pool(), connection_id, 6)
        .await
        .unwrap();
    assert!(empty.is_empty());

    for i in 0..8 {
        messages::insert(
            store.pool(),
            connection_id,
            if i % 2 == 0 { manager_id } else { worker_id },
            &format!("m{i}"),
            &format!("t{i}"),
        )
        .await
        .unwrap();
    }

    let window = messages::translation_context(store.pool(), connection_id, 6)
        .await
        .unwrap();
    assert_eq!(window.len(), 6);
    assert_eq!(window.first().unwrap().text, "m2");
    assert_eq!(window.last().unwrap().text, "m7");
    assert!(window.windows(2).all(|w| w[0].sent_at <= w[1].sent_at));
    // Sender language rides along for the prompt.
    assert_eq!(window.first().unwrap().sender_language, "English");
    assert_eq!(window[1].sender_language, "Spanish");
}

#[tokio::test]
async fn disconnect_all_covers_both_sides() {
    let store = require_store!();
    let (manager_id, worker_id) = seed_pair(&store, &code()).await;
    connections::bind(store.pool(), manager_id, worker_id, 1)
        .await
        .unwrap();

    let dropped = connections::disconnect_all_for_user(store.pool(), worker_id)
        .await
        .unwrap();
    assert_eq!(dropped, 1);
    assert!(connections::get_active_for_worker(store.pool(), worker_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn feedback_is_write_once_and_markable() {
    let store = require_store!();
    let (manager_id, _) = seed_pair(&store, &code()).await;

    let saved = bridgeos_store::queries::feedback::save(
        store.pool(),
        manager_id,
        Some("Dana"),
        Some("@dana"),
        "The gate flow is confusing",
    )
    .await
    .unwrap();
    assert_eq!(saved.status, "unread");

    bridgeos_store::queries::feedback::mark_read(store.pool(), saved.feedback_id)
        .await
        .unwrap();
    let recent = bridgeos_store::queries::feedback::list_recent(store.pool(), 50)
        .await
        .unwrap();
    let row = recent
        .iter()
        .find(|f| f.feedback_id == saved.feedback_id)
        .unwrap();
    assert_eq!(row.status, "read");
    assert_eq!(row.handle.as_deref(), Some("@dana"));
}

#[tokio::test]
async fn retention_hook_deletes_only_older_rows() {
    let store = require_store!();
    let (manager_id, worker_id) = seed_pair(&store, &code()).await;
    let connection_id = connections::bind(store.pool(), manager_id, worker_id, 5)
        .await
        .unwrap();

    messages::insert(store.pool(), connection_id, manager_id, "keep me", "keep")
        .await
        .unwrap();

    // Cutoff in the past: nothing qualifies.
    let deleted = messages::delete_older_than(
        store.pool(),
        chrono::Utc::now() - chrono::Duration::days(30),
    )
    .await
    .unwrap();
    assert_eq!(deleted, 0);

    let history = messages::list_for_connection(store.pool(), connection_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn exhausted_pool_surfaces_a_typed_error() {
    let Some(url) = std::env::var("BRIDGEOS_TEST_DATABASE_URL").ok() else {
        eprintln!("skipping: BRIDGEOS_TEST_DATABASE_URL not set");
        return;
    };
    let config = StorageConfig {
        database_url: Some(url),
        pool_min: 1,
        pool_max: 1,
        acquire_timeout_secs: 1,
    };
    let store = Store::connect(&config).await.expect("test database reachable");

    // Hold the only connection; the next acquire must give up after the
    // deadline instead of waiting indefinitely.
    let _held = store.pool().acquire().await.unwrap();
    let result = users::get_by_id(store.pool(), 1).await;
    assert!(matches!(result, Err(BridgeError::PoolExhausted)));
}

#[tokio::test]
async fn bind_to_unknown_endpoints_maps_to_typed_errors() {
    let store = require_store!();
    let (manager_id, worker_id) = seed_pair(&store, &code()).await;

    let no_such_worker = uid();
    assert!(matches!(
        connections::bind(store.pool(), manager_id, no_such_worker, 1).await,
        Err(BridgeError::WorkerGone { .. })
    ));

    let no_such_manager = uid();
    assert!(matches!(
        connections::bind(store.pool(), no_such_manager, worker_id, 1).await,
        Err(BridgeError::ManagerGone { .. })
    ));
}
