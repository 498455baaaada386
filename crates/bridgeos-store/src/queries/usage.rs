// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage-tracking rows: the free-tier gate.
//!
//! The gate is a single guarded UPDATE, not a read-then-write: the WHERE
//! clause consumes a unit only while the counter is below the limit, and
//! the same statement computes the new block flag. Two racing sends can
//! never both consume the last unit.

use bridgeos_core::{BridgeError, UserId};
use sqlx::PgExecutor;

use crate::models::Usage;
use crate::store::map_db_err;

/// Result of an attempted unit consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// The unit was consumed; `now_blocked` is true when it was the last one.
    Allowed { new_count: i32, now_blocked: bool },
    /// The counter was already at the limit; nothing changed.
    Denied,
}

/// Usage row for a manager, creating a zeroed row on first read.
pub async fn get_or_create<'e, E>(executor: E, manager_id: UserId) -> Result<Usage, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Usage>(
        r#"
        INSERT INTO usage_tracking (manager_id)
        VALUES ($1)
        ON CONFLICT (manager_id) DO UPDATE SET manager_id = EXCLUDED.manager_id
        RETURNING manager_id, messages_sent, is_blocked, first_message_at, last_message_at
        "#,
    )
    .bind(manager_id)
    .fetch_one(executor)
    .await
    .map_err(map_db_err)
}

/// Atomically consume one unit of the free allocation.
///
/// The row must exist (`get_or_create` first, typically in the same
/// transaction). A consumed last unit still counts as allowed; the call
/// after that is denied and leaves the counter unchanged. On `Denied` the
/// caller follows up with [`mark_blocked`] so the flag reflects the state.
pub async fn consume<'e, E>(
    executor: E,
    manager_id: UserId,
    free_limit: i32,
) -> Result<GateOutcome, BridgeError>
where
    E: PgExecutor<'e>,
{
    let row: Option<(i32, bool)> = sqlx::query_as(
        r#"
        UPDATE usage_tracking
        SET messages_sent    = messages_sent + 1,
            is_blocked       = (messages_sent + 1) >= $2,
            first_message_at = COALESCE(first_message_at, NOW()),
            last_message_at  = NOW()
        WHERE manager_id = $1 AND messages_sent < $2
        RETURNING messages_sent, is_blocked
        "#,
    )
    .bind(manager_id)
    .bind(free_limit)
    .fetch_optional(executor)
    .await
    .map_err(map_db_err)?;

    match row {
        Some((new_count, now_blocked)) => Ok(GateOutcome::Allowed {
            new_count,
            now_blocked,
        }),
        None => Ok(GateOutcome::Denied),
    }
}

/// Set the block flag without touching the counter.
pub async fn mark_blocked<'e, E>(executor: E, manager_id: UserId) -> Result<(), BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "UPDATE usage_tracking SET is_blocked = TRUE
         WHERE manager_id = $1 AND NOT is_blocked",
    )
    .bind(manager_id)
    .execute(executor)
    .await
    .map_err(map_db_err)?;
    Ok(())
}

/// Zero the counter and clear the block flag (admin path).
pub async fn reset<'e, E>(executor: E, manager_id: UserId) -> Result<(), BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "UPDATE usage_tracking SET messages_sent = 0, is_blocked = FALSE
         WHERE manager_id = $1",
    )
    .bind(manager_id)
    .execute(executor)
    .await
    .map_err(map_db_err)?;
    Ok(())
}
