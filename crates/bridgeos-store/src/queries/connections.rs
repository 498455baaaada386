// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection rows: the race-free bind/unbind protocol.
//!
//! No application-level mutex exists or is permitted here. The two partial
//! unique indexes resolve concurrent binds: exactly one INSERT commits and
//! the loser fails deterministically with the error naming the violated
//! invariant.

use bridgeos_core::{BotSlot, BridgeError, ConnectionId, UserId};
use sqlx::PgExecutor;
use tracing::info;

use crate::models::Connection;
use crate::store::{constraint_name, map_db_err};

/// Outcome of an unbind call. Repeat calls are no-ops, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnbindOutcome {
    /// The connection was active and is now disconnected.
    Disconnected(ConnectionId),
    /// The connection was already disconnected (or never existed).
    AlreadyDisconnected,
}

/// Insert a new active connection.
///
/// Unique-violation translation:
/// `idx_unique_manager_slot` -> `SlotOccupied`,
/// `idx_unique_active_worker` -> `WorkerAlreadyConnected`.
/// Foreign-key failures surface as `ManagerGone` / `WorkerGone` for callers
/// that skipped the existence pre-checks.
pub async fn bind<'e, E>(
    executor: E,
    manager_id: UserId,
    worker_id: UserId,
    bot_slot: BotSlot,
) -> Result<ConnectionId, BridgeError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query_scalar::<_, ConnectionId>(
        r#"
        INSERT INTO connections (manager_id, worker_id, bot_slot, status)
        VALUES ($1, $2, $3, 'active')
        RETURNING connection_id
        "#,
    )
    .bind(manager_id)
    .bind(worker_id)
    .bind(bot_slot)
    .fetch_one(executor)
    .await;

    match result {
        Ok(connection_id) => {
            info!(connection_id, manager_id, worker_id, bot_slot, "connection bound");
            Ok(connection_id)
        }
        Err(err) => Err(match constraint_name(&err) {
            Some("idx_unique_manager_slot") => BridgeError::SlotOccupied {
                manager_id,
                bot_slot,
            },
            Some("idx_unique_active_worker") => {
                BridgeError::WorkerAlreadyConnected { worker_id }
            }
            Some("connections_manager_id_fkey") => BridgeError::ManagerGone { manager_id },
            Some("connections_worker_id_fkey") => BridgeError::WorkerGone { worker_id },
            _ => map_db_err(err),
        }),
    }
}

/// Idempotent disconnect. An UPDATE, never a DELETE: history is preserved.
pub async fn unbind<'e, E>(
    executor: E,
    connection_id: ConnectionId,
) -> Result<UnbindOutcome, BridgeError>
where
    E: PgExecutor<'e>,
{
    let disconnected: Option<ConnectionId> = sqlx::query_scalar(
        r#"
        UPDATE connections
        SET status = 'disconnected', disconnected_at = NOW()
        WHERE connection_id = $1 AND status = 'active'
        RETURNING connection_id
        "#,
    )
    .bind(connection_id)
    .fetch_optional(executor)
    .await
    .map_err(map_db_err)?;

    match disconnected {
        Some(id) => {
            info!(connection_id = id, "connection disconnected");
            Ok(UnbindOutcome::Disconnected(id))
        }
        None => Ok(UnbindOutcome::AlreadyDisconnected),
    }
}

pub async fn get_by_id<'e, E>(
    executor: E,
    connection_id: ConnectionId,
) -> Result<Option<Connection>, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Connection>(
        "SELECT connection_id, manager_id, worker_id, bot_slot, status,
                connected_at, disconnected_at
         FROM connections WHERE connection_id = $1",
    )
    .bind(connection_id)
    .fetch_optional(executor)
    .await
    .map_err(map_db_err)
}

/// Active connection on one manager's slot.
pub async fn get_active_for_manager_slot<'e, E>(
    executor: E,
    manager_id: UserId,
    bot_slot: BotSlot,
) -> Result<Option<Connection>, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Connection>(
        "SELECT connection_id, manager_id, worker_id, bot_slot, status,
                connected_at, disconnected_at
         FROM connections
         WHERE manager_id = $1 AND bot_slot = $2 AND status = 'active'",
    )
    .bind(manager_id)
    .bind(bot_slot)
    .fetch_optional(executor)
    .await
    .map_err(map_db_err)
}

/// The single active connection of a worker.
pub async fn get_active_for_worker<'e, E>(
    executor: E,
    worker_id: UserId,
) -> Result<Option<Connection>, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Connection>(
        "SELECT connection_id, manager_id, worker_id, bot_slot, status,
                connected_at, disconnected_at
         FROM connections
         WHERE worker_id = $1 AND status = 'active'",
    )
    .bind(worker_id)
    .fetch_optional(executor)
    .await
    .map_err(map_db_err)
}

/// All active connections of a manager, ascending by slot. At most five.
pub async fn list_active_for_manager<'e, E>(
    executor: E,
    manager_id: UserId,
) -> Result<Vec<Connection>, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Connection>(
        "SELECT connection_id, manager_id, worker_id, bot_slot, status,
                connected_at, disconnected_at
         FROM connections
         WHERE manager_id = $1 AND status = 'active'
         ORDER BY bot_slot",
    )
    .bind(manager_id)
    .fetch_all(executor)
    .await
    .map_err(map_db_err)
}

/// Disconnect every active connection involving `user_id`, either side.
/// Used by soft delete, in the same transaction.
pub async fn disconnect_all_for_user<'e, E>(
    executor: E,
    user_id: UserId,
) -> Result<u64, BridgeError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE connections
        SET status = 'disconnected', disconnected_at = NOW()
        WHERE (manager_id = $1 OR worker_id = $1) AND status = 'active'
        "#,
    )
    .bind(user_id)
    .execute(executor)
    .await
    .map_err(map_db_err)?;
    Ok(result.rows_affected())
}
