// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message rows: append-only history plus the two read paths that feed the
//! translator (sliding context window) and the daily extraction (24h window).

use bridgeos_core::{BridgeError, ConnectionId, ContextMessage, MessageId, UserId};
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use crate::models::{Message, WindowMessage};
use crate::store::map_db_err;

/// Persist a translated message. Called only after translation succeeded
/// and before delivery is attempted.
pub async fn insert<'e, E>(
    executor: E,
    connection_id: ConnectionId,
    sender_id: UserId,
    original_text: &str,
    translated_text: &str,
) -> Result<MessageId, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, MessageId>(
        r#"
        INSERT INTO messages (connection_id, sender_id, original_text, translated_text)
        VALUES ($1, $2, $3, $4)
        RETURNING message_id
        "#,
    )
    .bind(connection_id)
    .bind(sender_id)
    .bind(original_text)
    .bind(translated_text)
    .fetch_one(executor)
    .await
    .map_err(map_db_err)
}

/// The last `limit` messages of a connection, oldest first, each carrying
/// the sender's current UI language. Empty for a fresh connection. Tasks
/// are not messages and never appear here.
pub async fn translation_context<'e, E>(
    executor: E,
    connection_id: ConnectionId,
    limit: i64,
) -> Result<Vec<ContextMessage>, BridgeError>
where
    E: PgExecutor<'e>,
{
    let rows: Vec<(String, String, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT u.ui_language, m.original_text, m.sent_at
        FROM messages m
        JOIN users u ON u.user_id = m.sender_id
        WHERE m.connection_id = $1
        ORDER BY m.sent_at DESC
        LIMIT $2
        "#,
    )
    .bind(connection_id)
    .bind(limit)
    .fetch_all(executor)
    .await
    .map_err(map_db_err)?;

    // The query walks backwards from the newest row; the translator wants
    // chronological order.
    Ok(rows
        .into_iter()
        .rev()
        .map(|(sender_language, text, sent_at)| ContextMessage {
            sender_language,
            text,
            sent_at,
        })
        .collect())
}

/// All messages across a manager's active connections since `since`,
/// joined with the worker's display name, oldest first. Feeds the daily
/// action-item extraction.
pub async fn window_for_manager<'e, E>(
    executor: E,
    manager_id: UserId,
    since: DateTime<Utc>,
) -> Result<Vec<WindowMessage>, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, WindowMessage>(
        r#"
        SELECT wu.display_name AS worker_name, m.original_text, m.sent_at
        FROM messages m
        JOIN connections c ON c.connection_id = m.connection_id
        JOIN users wu ON wu.user_id = c.worker_id
        WHERE c.manager_id = $1
          AND c.status = 'active'
          AND m.sent_at >= $2
        ORDER BY m.sent_at ASC
        "#,
    )
    .bind(manager_id)
    .bind(since)
    .fetch_all(executor)
    .await
    .map_err(map_db_err)
}

/// Full history of one connection, oldest first (audit path).
pub async fn list_for_connection<'e, E>(
    executor: E,
    connection_id: ConnectionId,
) -> Result<Vec<Message>, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Message>(
        "SELECT message_id, connection_id, sender_id, original_text, translated_text, sent_at
         FROM messages WHERE connection_id = $1 ORDER BY sent_at ASC",
    )
    .bind(connection_id)
    .fetch_all(executor)
    .await
    .map_err(map_db_err)
}

/// Retention hook: delete messages older than `cutoff`. Nothing schedules
/// this; an operator may.
pub async fn delete_older_than<'e, E>(
    executor: E,
    cutoff: DateTime<Utc>,
) -> Result<u64, BridgeError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM messages WHERE sent_at < $1")
        .bind(cutoff)
        .execute(executor)
        .await
        .map_err(map_db_err)?;
    Ok(result.rows_affected())
}
