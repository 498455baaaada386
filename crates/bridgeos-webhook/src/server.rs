// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The webhook HTTP server, built on axum.
//!
//! Response discipline: 401 until the signature verifies, 200 always after
//! that, even when applying the event fails internally. Failed events are
//! logged for reconciliation. The out-of-band manager notification is
//! best-effort and never fails the webhook.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use bridgeos_config::BridgeConfig;
use bridgeos_core::TransportFleet;
use bridgeos_store::Store;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::apply::{apply_event, notification_text};
use crate::event::{parse_event, ParsedEvent};
use crate::signature::SignatureValidator;

/// Header carrying the hex HMAC tag.
const SIGNATURE_HEADER: &str = "x-signature";

/// Shared state for the webhook handlers.
#[derive(Clone)]
pub struct WebhookState {
    pub store: Store,
    pub validator: SignatureValidator,
    pub fleet: Arc<TransportFleet>,
    pub config: Arc<BridgeConfig>,
}

/// Builds the router: the fixed billing path and a liveness endpoint.
pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhook/billing", post(handle_billing))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds and serves the receiver until the process is stopped.
pub async fn serve(state: WebhookState) -> Result<(), bridgeos_core::BridgeError> {
    let addr = format!(
        "{}:{}",
        state.config.webhook.bind_address, state.config.webhook.port
    );
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        bridgeos_core::BridgeError::Config(format!("failed to bind webhook to {addr}: {e}"))
    })?;
    info!(addr = %addr, "webhook receiver listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| bridgeos_core::BridgeError::Internal(format!("webhook server error: {e}")))
}

async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "healthy"}))
}

async fn handle_billing(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    // Authenticity first: no side effects before the signature verifies.
    let Some(signature) = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        warn!("billing webhook without signature header");
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "no signature"})),
        );
    };

    if state.validator.verify(&body, signature).is_err() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "invalid signature"})),
        );
    }

    // Authenticated: from here on the answer is 200, whatever happens.
    let event = match parse_event(&body) {
        Ok(ParsedEvent::Event(event)) => event,
        Ok(ParsedEvent::Unroutable { .. }) => {
            return (
                StatusCode::OK,
                Json(serde_json::json!({"status": "success", "note": "no manager_id"})),
            );
        }
        Err(err) => {
            error!(error = %err, "authentic webhook payload failed to parse");
            return (
                StatusCode::OK,
                Json(serde_json::json!({"status": "error", "note": "unparseable payload"})),
            );
        }
    };

    match apply_event(&state.store, &event).await {
        Ok(_) => {
            notify_manager(&state, &event).await;
            (StatusCode::OK, Json(serde_json::json!({"status": "success"})))
        }
        Err(err) => {
            // Logged for reconciliation; the provider must not retry.
            error!(
                manager_id = event.manager_id,
                error = %err,
                "failed to apply billing event"
            );
            (StatusCode::OK, Json(serde_json::json!({"status": "error"})))
        }
    }
}

/// Best-effort chat notification after a transition. Failures are logged
/// and swallowed.
async fn notify_manager(state: &WebhookState, event: &crate::event::BillingEvent) {
    let Some(text) = notification_text(event) else {
        return;
    };
    let Some(slot) = state.fleet.slots().into_iter().next() else {
        warn!("no transport configured, skipping billing notification");
        return;
    };
    match state.fleet.get(slot) {
        Ok(transport) => {
            if let Err(err) = transport.send_text(event.manager_id, &text).await {
                warn!(
                    manager_id = event.manager_id,
                    error = %err,
                    "billing notification failed"
                );
            }
        }
        Err(err) => warn!(error = %err, "transport lookup failed for notification"),
    }
}
