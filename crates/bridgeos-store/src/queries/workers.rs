// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker rows: creation and soft delete.

use bridgeos_core::{BridgeError, UserId};
use sqlx::PgExecutor;

use crate::models::Worker;
use crate::store::map_db_err;

/// Create a worker record, or re-activate a soft-deleted one.
pub async fn create<'e, E>(executor: E, worker_id: UserId) -> Result<Worker, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Worker>(
        r#"
        INSERT INTO workers (worker_id)
        VALUES ($1)
        ON CONFLICT (worker_id) DO UPDATE SET deleted_at = NULL
        RETURNING worker_id, created_at, deleted_at
        "#,
    )
    .bind(worker_id)
    .fetch_one(executor)
    .await
    .map_err(map_db_err)
}

/// Active worker by id. `None` when absent or soft-deleted.
pub async fn get_active<'e, E>(
    executor: E,
    worker_id: UserId,
) -> Result<Option<Worker>, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Worker>(
        "SELECT worker_id, created_at, deleted_at
         FROM workers WHERE worker_id = $1 AND deleted_at IS NULL",
    )
    .bind(worker_id)
    .fetch_optional(executor)
    .await
    .map_err(map_db_err)
}

/// Soft delete: sets `deleted_at`, preserving the row for history.
pub async fn soft_delete<'e, E>(executor: E, worker_id: UserId) -> Result<u64, BridgeError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE workers SET deleted_at = NOW()
         WHERE worker_id = $1 AND deleted_at IS NULL",
    )
    .bind(worker_id)
    .execute(executor)
    .await
    .map_err(map_db_err)?;
    Ok(result.rows_affected())
}
