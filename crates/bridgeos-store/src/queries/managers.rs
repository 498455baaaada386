// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Manager rows: creation, soft delete, role detection, code lookup.

use bridgeos_core::{BridgeError, Role, UserId};
use sqlx::PgExecutor;

use crate::models::Manager;
use crate::store::map_db_err;

/// Create a manager record, or re-activate a soft-deleted one.
///
/// The user row must already exist. Re-activation clears `deleted_at` and
/// takes the new code and industry.
pub async fn create<'e, E>(
    executor: E,
    manager_id: UserId,
    code: &str,
    industry: &str,
) -> Result<Manager, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Manager>(
        r#"
        INSERT INTO managers (manager_id, code, industry)
        VALUES ($1, $2, $3)
        ON CONFLICT (manager_id) DO UPDATE SET
            code       = EXCLUDED.code,
            industry   = EXCLUDED.industry,
            deleted_at = NULL
        RETURNING manager_id, code, industry, created_at, deleted_at
        "#,
    )
    .bind(manager_id)
    .bind(code)
    .bind(industry)
    .fetch_one(executor)
    .await
    .map_err(map_db_err)
}

/// Active manager by id. `None` when absent or soft-deleted.
pub async fn get_active<'e, E>(
    executor: E,
    manager_id: UserId,
) -> Result<Option<Manager>, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Manager>(
        "SELECT manager_id, code, industry, created_at, deleted_at
         FROM managers WHERE manager_id = $1 AND deleted_at IS NULL",
    )
    .bind(manager_id)
    .fetch_optional(executor)
    .await
    .map_err(map_db_err)
}

/// Active manager owning an invitation code.
pub async fn get_by_code<'e, E>(executor: E, code: &str) -> Result<Option<Manager>, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Manager>(
        "SELECT manager_id, code, industry, created_at, deleted_at
         FROM managers WHERE code = $1 AND deleted_at IS NULL",
    )
    .bind(code)
    .fetch_optional(executor)
    .await
    .map_err(map_db_err)
}

/// Uniqueness probe used by invitation-code generation.
pub async fn code_exists<'e, E>(executor: E, code: &str) -> Result<bool, BridgeError>
where
    E: PgExecutor<'e>,
{
    let exists: Option<i32> =
        sqlx::query_scalar("SELECT 1 FROM managers WHERE code = $1 AND deleted_at IS NULL")
            .bind(code)
            .fetch_optional(executor)
            .await
            .map_err(map_db_err)?;
    Ok(exists.is_some())
}

/// Soft delete: sets `deleted_at`, preserving the row for history.
/// Returns the number of rows affected (0 when already deleted).
pub async fn soft_delete<'e, E>(executor: E, manager_id: UserId) -> Result<u64, BridgeError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE managers SET deleted_at = NOW()
         WHERE manager_id = $1 AND deleted_at IS NULL",
    )
    .bind(manager_id)
    .execute(executor)
    .await
    .map_err(map_db_err)?;
    Ok(result.rows_affected())
}

/// The single active role of a user: manager wins over worker, which can
/// only co-exist with a soft-deleted row of the other kind.
pub async fn get_role<'e, E>(executor: E, user_id: UserId) -> Result<Option<Role>, BridgeError>
where
    E: PgExecutor<'e>,
{
    let role: Option<String> = sqlx::query_scalar(
        r#"
        SELECT 'manager' FROM managers WHERE manager_id = $1 AND deleted_at IS NULL
        UNION ALL
        SELECT 'worker' FROM workers WHERE worker_id = $1 AND deleted_at IS NULL
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .map_err(map_db_err)?;

    Ok(role.and_then(|r| r.parse().ok()))
}
