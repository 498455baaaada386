// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Receiver-level tests against a real PostgreSQL instance: signature
//! discipline, replay idempotency, and the always-200 contract.
//!
//! Each test self-skips unless `BRIDGEOS_TEST_DATABASE_URL` is set.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use bridgeos_config::load_config_from_str;
use bridgeos_core::TransportFleet;
use bridgeos_store::queries::{managers, subscriptions, users};
use bridgeos_store::Store;
use bridgeos_webhook::{router, SignatureValidator, WebhookState};
use hmac::{Hmac, Mac};
use secrecy::SecretString;
use sha2::Sha256;
use tower::ServiceExt;

const SECRET: &str = "test-webhook-secret";

static NEXT_ID: AtomicI64 = AtomicI64::new(0);

fn uid() -> i64 {
    let base = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_micros() as i64;
    base * 1000 + NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

fn sign(payload: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

async fn test_state() -> Option<(WebhookState, Store)> {
    let url = std::env::var("BRIDGEOS_TEST_DATABASE_URL").ok()?;
    let config = load_config_from_str(&format!(
        "[storage]\ndatabase_url = \"{url}\"\npool_min = 1\npool_max = 5"
    ))
    .unwrap();
    let store = Store::connect(&config.storage).await.expect("test database");
    store.migrate().await.expect("migrations apply");

    let state = WebhookState {
        store: store.clone(),
        validator: SignatureValidator::new(SecretString::from(SECRET)),
        fleet: Arc::new(TransportFleet::new()),
        config: Arc::new(config),
    };
    Some((state, store))
}

macro_rules! require_state {
    () => {
        match test_state().await {
            Some(pair) => pair,
            None => {
                eprintln!("skipping: BRIDGEOS_TEST_DATABASE_URL not set");
                return;
            }
        }
    };
}

async fn seed_manager(store: &Store) -> i64 {
    let manager_id = uid();
    users::upsert(store.pool(), manager_id, "Dana", Some("English"), None)
        .await
        .unwrap();
    managers::create(
        store.pool(),
        manager_id,
        &format!("BRIDGE-{:05}", manager_id.rem_euclid(100000)),
        "dairy_farm",
    )
    .await
    .unwrap();
    manager_id
}

fn created_event(manager_id: i64, external_id: &str) -> Vec<u8> {
    serde_json::json!({
        "meta": {
            "event_name": "subscription_created",
            "custom_data": {"manager_id": manager_id.to_string()}
        },
        "data": {
            "id": external_id,
            "attributes": {
                "renews_at": "2026-09-01T00:00:00Z",
                "ends_at": null,
                "cancelled": false,
                "urls": {"customer_portal": "https://billing.example/portal/x"}
            }
        }
    })
    .to_string()
    .into_bytes()
}

fn post(body: Vec<u8>, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook/billing")
        .header("content-type", "application/json");
    if let Some(sig) = signature {
        builder = builder.header("x-signature", sig);
    }
    builder.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn missing_or_bad_signature_is_401_with_no_side_effects() {
    let (state, store) = require_state!();
    let manager_id = seed_manager(&store).await;
    let body = created_event(manager_id, "sub_rejected");

    let no_sig = router(state.clone()).oneshot(post(body.clone(), None)).await.unwrap();
    assert_eq!(no_sig.status(), StatusCode::UNAUTHORIZED);

    let bad_sig = router(state.clone())
        .oneshot(post(body.clone(), Some(&hex::encode([0u8; 32]))))
        .await
        .unwrap();
    assert_eq!(bad_sig.status(), StatusCode::UNAUTHORIZED);

    assert!(subscriptions::get_by_manager(store.pool(), manager_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn replayed_created_event_converges_on_one_active_row() {
    let (state, store) = require_state!();
    let manager_id = seed_manager(&store).await;
    let body = created_event(manager_id, "sub_replay");
    let signature = sign(&body);

    for _ in 0..2 {
        let response = router(state.clone())
            .oneshot(post(body.clone(), Some(&signature)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let row = subscriptions::get_by_manager(store.pool(), manager_id)
        .await
        .unwrap()
        .expect("row exists");
    assert_eq!(row.status, "active");
    assert_eq!(row.external_id.as_deref(), Some("sub_replay"));
    assert_eq!(
        row.customer_portal_url.as_deref(),
        Some("https://billing.example/portal/x")
    );
}

#[tokio::test]
async fn cancellation_populates_ends_at() {
    let (state, store) = require_state!();
    let manager_id = seed_manager(&store).await;

    let created = created_event(manager_id, "sub_c");
    router(state.clone())
        .oneshot(post(created.clone(), Some(&sign(&created))))
        .await
        .unwrap();

    let cancelled = serde_json::json!({
        "meta": {
            "event_name": "subscription_cancelled",
            "custom_data": {"manager_id": manager_id}
        },
        "data": {
            "id": "sub_c",
            "attributes": {"ends_at": "2026-10-01T00:00:00Z", "cancelled": true}
        }
    })
    .to_string()
    .into_bytes();
    let response = router(state.clone())
        .oneshot(post(cancelled.clone(), Some(&sign(&cancelled))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let row = subscriptions::get_by_manager(store.pool(), manager_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, "cancelled");
    assert!(row.ends_at.is_some());
}

#[tokio::test]
async fn routine_update_does_not_reentitle_a_paused_manager() {
    let (state, store) = require_state!();
    let manager_id = seed_manager(&store).await;

    let failed = serde_json::json!({
        "meta": {
            "event_name": "subscription_payment_failed",
            "custom_data": {"manager_id": manager_id}
        },
        "data": {"id": "sub_p", "attributes": {}}
    })
    .to_string()
    .into_bytes();
    router(state.clone())
        .oneshot(post(failed.clone(), Some(&sign(&failed))))
        .await
        .unwrap();

    // A renewal-date refresh with cancelled=false must leave paused alone.
    let updated = serde_json::json!({
        "meta": {
            "event_name": "subscription_updated",
            "custom_data": {"manager_id": manager_id}
        },
        "data": {
            "id": "sub_p",
            "attributes": {
                "renews_at": "2026-11-01T00:00:00Z",
                "cancelled": false,
                "urls": {"customer_portal": "https://billing.example/portal/p"}
            }
        }
    })
    .to_string()
    .into_bytes();
    let response = router(state.clone())
        .oneshot(post(updated.clone(), Some(&sign(&updated))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let row = subscriptions::get_by_manager(store.pool(), manager_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, "paused", "a card change must not re-entitle");
    assert!(row.renews_at.is_some(), "bookkeeping fields still refresh");

    // The cancelled flag on an update is the one status it may set.
    let cancelled = serde_json::json!({
        "meta": {
            "event_name": "subscription_updated",
            "custom_data": {"manager_id": manager_id}
        },
        "data": {
            "id": "sub_p",
            "attributes": {"ends_at": "2026-12-01T00:00:00Z", "cancelled": true}
        }
    })
    .to_string()
    .into_bytes();
    router(state.clone())
        .oneshot(post(cancelled.clone(), Some(&sign(&cancelled))))
        .await
        .unwrap();

    let row = subscriptions::get_by_manager(store.pool(), manager_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, "cancelled");
    assert!(row.ends_at.is_some());
}

#[tokio::test]
async fn unknown_events_and_internal_failures_still_answer_200() {
    let (state, store) = require_state!();

    // Unknown event kind: acknowledged.
    let manager_id = seed_manager(&store).await;
    let unknown = serde_json::json!({
        "meta": {
            "event_name": "subscription_teleported",
            "custom_data": {"manager_id": manager_id}
        }
    })
    .to_string()
    .into_bytes();
    let response = router(state.clone())
        .oneshot(post(unknown.clone(), Some(&sign(&unknown))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Authentic event for a manager that does not exist: the FK failure is
    // logged, the provider still gets 200.
    let ghost = created_event(uid(), "sub_ghost");
    let response = router(state.clone())
        .oneshot(post(ghost.clone(), Some(&sign(&ghost))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // No manager_id routing key: acknowledged.
    let unroutable = serde_json::json!({
        "meta": {"event_name": "subscription_created", "custom_data": {}}
    })
    .to_string()
    .into_bytes();
    let response = router(state)
        .oneshot(post(unroutable.clone(), Some(&sign(&unroutable))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_endpoint_is_alive() {
    let (state, _store) = require_state!();
    let response = router(state)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
