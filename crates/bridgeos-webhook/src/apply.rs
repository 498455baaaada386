// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Idempotent application of billing events.
//!
//! Status-bearing events replace the manager's billing row wholesale via
//! UPSERT, so replaying the same authentic event converges on the same
//! row. Bookkeeping events, `subscription_updated` included, refresh
//! renewal fields without touching the status; an update transitions only
//! when its cancelled flag is set. No other code path mutates subscription
//! status.

use bridgeos_core::{BridgeError, SubscriptionStatus};
use bridgeos_store::models::Subscription;
use bridgeos_store::queries::subscriptions;
use bridgeos_store::Store;
use tracing::{info, warn};

use crate::event::{BillingEvent, EventKind};

/// Applies one event. `Ok(None)` means the event was understood but had
/// nothing to change (unknown kind, or bookkeeping for a missing row).
pub async fn apply_event(
    store: &Store,
    event: &BillingEvent,
) -> Result<Option<Subscription>, BridgeError> {
    let applied = match &event.kind {
        EventKind::Created | EventKind::Resumed | EventKind::PaymentRecovered => {
            Some(transition(store, event, SubscriptionStatus::Active).await?)
        }
        EventKind::Cancelled => {
            Some(transition(store, event, SubscriptionStatus::Cancelled).await?)
        }
        EventKind::Expired => Some(transition(store, event, SubscriptionStatus::Expired).await?),
        EventKind::PaymentFailed | EventKind::Paused => {
            Some(transition(store, event, SubscriptionStatus::Paused).await?)
        }
        // A routine update refreshes renewal bookkeeping and leaves the
        // status alone; only the cancelled flag transitions. A paused or
        // expired manager must not become entitled by a card change.
        EventKind::Updated => match refresh(store, event).await? {
            Some(_) if event.cancelled => subscriptions::update_status(
                store.pool(),
                event.manager_id,
                SubscriptionStatus::Cancelled,
                event.ends_at,
            )
            .await?,
            Some(row) => Some(row),
            // No row yet: the update carries the full state, take it as
            // the initial one.
            None => Some(
                transition(
                    store,
                    event,
                    if event.cancelled {
                        SubscriptionStatus::Cancelled
                    } else {
                        SubscriptionStatus::Active
                    },
                )
                .await?,
            ),
        },
        EventKind::PaymentSuccess | EventKind::PlanChanged => {
            let row = refresh(store, event).await?;
            if row.is_none() {
                warn!(
                    manager_id = event.manager_id,
                    "bookkeeping event for a manager with no subscription row"
                );
            }
            row
        }
        EventKind::Unknown(name) => {
            info!(event = %name, manager_id = event.manager_id, "ignoring unknown billing event");
            None
        }
    };

    Ok(applied)
}

/// Status-bearing transition: replaces the manager's billing row wholesale.
async fn transition(
    store: &Store,
    event: &BillingEvent,
    status: SubscriptionStatus,
) -> Result<Subscription, BridgeError> {
    let row = subscriptions::upsert(
        store.pool(),
        event.manager_id,
        event.external_id.as_deref(),
        status,
        event.customer_portal_url.as_deref(),
        event.renews_at,
        event.ends_at,
    )
    .await?;
    info!(
        manager_id = event.manager_id,
        status = %status,
        external_id = row.external_id.as_deref().unwrap_or("-"),
        "subscription transition applied"
    );
    Ok(row)
}

/// Bookkeeping refresh: renewal fields only, status untouched.
/// `None` when the manager has no subscription row.
async fn refresh(
    store: &Store,
    event: &BillingEvent,
) -> Result<Option<Subscription>, BridgeError> {
    subscriptions::update_billing_fields(
        store.pool(),
        event.manager_id,
        event.customer_portal_url.as_deref(),
        event.renews_at,
        event.ends_at,
    )
    .await
}

/// Notification text for the manager after a transition, when one is due.
pub fn notification_text(event: &BillingEvent) -> Option<String> {
    match &event.kind {
        EventKind::Created => {
            Some("Your subscription is active. Messages are now unlimited.".to_string())
        }
        EventKind::Resumed | EventKind::PaymentRecovered => {
            Some("Your subscription is active again.".to_string())
        }
        EventKind::Cancelled => Some(match event.ends_at {
            Some(ends_at) => format!(
                "Your subscription was cancelled. Access continues until {}.",
                ends_at.format("%Y-%m-%d")
            ),
            None => "Your subscription was cancelled.".to_string(),
        }),
        EventKind::Expired => {
            Some("Your subscription expired. Subscribe again to continue.".to_string())
        }
        EventKind::PaymentFailed | EventKind::Paused => {
            Some("A payment failed and your subscription is paused. Please update your billing details.".to_string())
        }
        EventKind::Updated
        | EventKind::PaymentSuccess
        | EventKind::PlanChanged
        | EventKind::Unknown(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(kind: EventKind) -> BillingEvent {
        BillingEvent {
            kind,
            manager_id: 1,
            external_id: Some("sub_1".to_string()),
            renews_at: None,
            ends_at: Some(Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()),
            cancelled: false,
            customer_portal_url: None,
        }
    }

    #[test]
    fn transitions_notify_and_bookkeeping_stays_quiet() {
        assert!(notification_text(&event(EventKind::Created)).is_some());
        assert!(notification_text(&event(EventKind::Expired)).is_some());
        assert!(notification_text(&event(EventKind::PaymentFailed)).is_some());
        assert!(notification_text(&event(EventKind::PaymentSuccess)).is_none());
        assert!(notification_text(&event(EventKind::Updated)).is_none());
        assert!(notification_text(&event(EventKind::Unknown("x".into()))).is_none());
    }

    #[test]
    fn cancellation_notice_names_the_end_date() {
        let text = notification_text(&event(EventKind::Cancelled)).unwrap();
        assert!(text.contains("2026-04-01"), "got: {text}");
    }
}
