// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Feedback rows: write-only from users, read by operators.

use bridgeos_core::{BridgeError, UserId};
use sqlx::PgExecutor;

use crate::models::Feedback;
use crate::store::map_db_err;

pub async fn save<'e, E>(
    executor: E,
    user_id: UserId,
    display_name: Option<&str>,
    handle: Option<&str>,
    message: &str,
) -> Result<Feedback, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Feedback>(
        r#"
        INSERT INTO feedback (user_id, display_name, handle, message)
        VALUES ($1, $2, $3, $4)
        RETURNING feedback_id, user_id, display_name, handle, message, created_at, status
        "#,
    )
    .bind(user_id)
    .bind(display_name)
    .bind(handle)
    .bind(message)
    .fetch_one(executor)
    .await
    .map_err(map_db_err)
}

pub async fn list_recent<'e, E>(executor: E, limit: i64) -> Result<Vec<Feedback>, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Feedback>(
        "SELECT feedback_id, user_id, display_name, handle, message, created_at, status
         FROM feedback ORDER BY created_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(executor)
    .await
    .map_err(map_db_err)
}

pub async fn mark_read<'e, E>(executor: E, feedback_id: i64) -> Result<(), BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE feedback SET status = 'read' WHERE feedback_id = $1")
        .bind(feedback_id)
        .execute(executor)
        .await
        .map_err(map_db_err)?;
    Ok(())
}
