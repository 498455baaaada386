// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription rows. Status transitions are written with UPSERT on
//! `manager_id`, which is what makes webhook replay idempotent: the same
//! event applied twice converges on the same row.

use bridgeos_core::{BridgeError, SubscriptionStatus, UserId};
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use crate::models::Subscription;
use crate::store::map_db_err;

pub async fn get_by_manager<'e, E>(
    executor: E,
    manager_id: UserId,
) -> Result<Option<Subscription>, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Subscription>(
        "SELECT subscription_id, manager_id, external_id, status, customer_portal_url,
                renews_at, ends_at, created_at, updated_at
         FROM subscriptions WHERE manager_id = $1",
    )
    .bind(manager_id)
    .fetch_optional(executor)
    .await
    .map_err(map_db_err)
}

/// Create-or-replace the full billing state of a manager.
#[allow(clippy::too_many_arguments)]
pub async fn upsert<'e, E>(
    executor: E,
    manager_id: UserId,
    external_id: Option<&str>,
    status: SubscriptionStatus,
    customer_portal_url: Option<&str>,
    renews_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
) -> Result<Subscription, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Subscription>(
        r#"
        INSERT INTO subscriptions
            (manager_id, external_id, status, customer_portal_url, renews_at, ends_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (manager_id) DO UPDATE SET
            external_id         = EXCLUDED.external_id,
            status              = EXCLUDED.status,
            customer_portal_url = EXCLUDED.customer_portal_url,
            renews_at           = EXCLUDED.renews_at,
            ends_at             = EXCLUDED.ends_at,
            updated_at          = NOW()
        RETURNING subscription_id, manager_id, external_id, status, customer_portal_url,
                  renews_at, ends_at, created_at, updated_at
        "#,
    )
    .bind(manager_id)
    .bind(external_id)
    .bind(status.to_string())
    .bind(customer_portal_url)
    .bind(renews_at)
    .bind(ends_at)
    .fetch_one(executor)
    .await
    .map_err(map_db_err)
}

/// Status-only transition, keeping the other fields.
/// Returns `None` when the manager has no subscription row.
pub async fn update_status<'e, E>(
    executor: E,
    manager_id: UserId,
    status: SubscriptionStatus,
    ends_at: Option<DateTime<Utc>>,
) -> Result<Option<Subscription>, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Subscription>(
        r#"
        UPDATE subscriptions
        SET status = $2, ends_at = $3, updated_at = NOW()
        WHERE manager_id = $1
        RETURNING subscription_id, manager_id, external_id, status, customer_portal_url,
                  renews_at, ends_at, created_at, updated_at
        "#,
    )
    .bind(manager_id)
    .bind(status.to_string())
    .bind(ends_at)
    .fetch_optional(executor)
    .await
    .map_err(map_db_err)
}

/// Refresh renewal bookkeeping without touching the status.
pub async fn update_billing_fields<'e, E>(
    executor: E,
    manager_id: UserId,
    customer_portal_url: Option<&str>,
    renews_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
) -> Result<Option<Subscription>, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Subscription>(
        r#"
        UPDATE subscriptions
        SET customer_portal_url = COALESCE($2, customer_portal_url),
            renews_at = COALESCE($3, renews_at),
            ends_at = $4,
            updated_at = NOW()
        WHERE manager_id = $1
        RETURNING subscription_id, manager_id, external_id, status, customer_portal_url,
                  renews_at, ends_at, created_at, updated_at
        "#,
    )
    .bind(manager_id)
    .bind(customer_portal_url)
    .bind(renews_at)
    .bind(ends_at)
    .fetch_optional(executor)
    .await
    .map_err(map_db_err)
}
