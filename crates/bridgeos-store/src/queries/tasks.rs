// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task rows. Completion relies on UPDATE-returning-count semantics: the
//! one-way `pending -> completed` transition is a guarded UPDATE, never a
//! read-modify-write.

use bridgeos_core::{BridgeError, ConnectionId, TaskId, UserId};
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use crate::models::{Task, TaskListing};
use crate::store::map_db_err;

/// Insert a pending task for a connection.
pub async fn create<'e, E>(
    executor: E,
    connection_id: ConnectionId,
    description: &str,
    description_translated: &str,
) -> Result<Task, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Task>(
        r#"
        INSERT INTO tasks (connection_id, description, description_translated)
        VALUES ($1, $2, $3)
        RETURNING task_id, connection_id, description, description_translated,
                  status, created_at, completed_at
        "#,
    )
    .bind(connection_id)
    .bind(description)
    .bind(description_translated)
    .fetch_one(executor)
    .await
    .map_err(map_db_err)
}

pub async fn get<'e, E>(executor: E, task_id: TaskId) -> Result<Option<Task>, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Task>(
        "SELECT task_id, connection_id, description, description_translated,
                status, created_at, completed_at
         FROM tasks WHERE task_id = $1",
    )
    .bind(task_id)
    .fetch_optional(executor)
    .await
    .map_err(map_db_err)
}

/// Guarded completion: flips `pending -> completed` and stamps
/// `completed_at`. Returns `None` when the task was not pending, leaving
/// the row untouched.
pub async fn mark_completed<'e, E>(
    executor: E,
    task_id: TaskId,
) -> Result<Option<Task>, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Task>(
        r#"
        UPDATE tasks
        SET status = 'completed', completed_at = NOW()
        WHERE task_id = $1 AND status = 'pending'
        RETURNING task_id, connection_id, description, description_translated,
                  status, created_at, completed_at
        "#,
    )
    .bind(task_id)
    .fetch_optional(executor)
    .await
    .map_err(map_db_err)
}

/// Manager view: every pending task plus tasks completed since `since`,
/// joined with the worker endpoint for grouping. Newest first.
pub async fn list_for_manager<'e, E>(
    executor: E,
    manager_id: UserId,
    since: DateTime<Utc>,
) -> Result<Vec<TaskListing>, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, TaskListing>(
        r#"
        SELECT t.task_id, t.connection_id, t.description, t.description_translated,
               t.status, t.created_at, t.completed_at,
               c.worker_id AS counterpart_id,
               wu.display_name AS counterpart_name
        FROM tasks t
        JOIN connections c ON c.connection_id = t.connection_id
        JOIN users wu ON wu.user_id = c.worker_id
        WHERE c.manager_id = $1
          AND (t.status = 'pending' OR t.completed_at >= $2)
        ORDER BY t.created_at DESC
        "#,
    )
    .bind(manager_id)
    .bind(since)
    .fetch_all(executor)
    .await
    .map_err(map_db_err)
}

/// Worker view: same window, joined with the manager endpoint. The caller
/// renders `description_translated` for this view.
pub async fn list_for_worker<'e, E>(
    executor: E,
    worker_id: UserId,
    since: DateTime<Utc>,
) -> Result<Vec<TaskListing>, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, TaskListing>(
        r#"
        SELECT t.task_id, t.connection_id, t.description, t.description_translated,
               t.status, t.created_at, t.completed_at,
               c.manager_id AS counterpart_id,
               mu.display_name AS counterpart_name
        FROM tasks t
        JOIN connections c ON c.connection_id = t.connection_id
        JOIN users mu ON mu.user_id = c.manager_id
        WHERE c.worker_id = $1
          AND (t.status = 'pending' OR t.completed_at >= $2)
        ORDER BY t.created_at DESC
        "#,
    )
    .bind(worker_id)
    .bind(since)
    .fetch_all(executor)
    .await
    .map_err(map_db_err)
}
