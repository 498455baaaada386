// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User rows: insert-or-update by primary key.

use bridgeos_core::{BridgeError, UserId};
use sqlx::PgExecutor;

use crate::models::User;
use crate::store::map_db_err;

/// Insert-or-update a user by primary key.
///
/// `None` fields keep their stored values; `updated_at` always advances.
pub async fn upsert<'e, E>(
    executor: E,
    user_id: UserId,
    display_name: &str,
    ui_language: Option<&str>,
    gender: Option<&str>,
) -> Result<User, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (user_id, display_name, ui_language, gender)
        VALUES ($1, $2, COALESCE($3, 'English'), $4)
        ON CONFLICT (user_id) DO UPDATE SET
            display_name = EXCLUDED.display_name,
            ui_language  = COALESCE($3, users.ui_language),
            gender       = COALESCE($4, users.gender),
            updated_at   = NOW()
        RETURNING user_id, display_name, ui_language, gender, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(display_name)
    .bind(ui_language)
    .bind(gender)
    .fetch_one(executor)
    .await
    .map_err(map_db_err)
}

pub async fn get_by_id<'e, E>(executor: E, user_id: UserId) -> Result<Option<User>, BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        "SELECT user_id, display_name, ui_language, gender, created_at, updated_at
         FROM users WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .map_err(map_db_err)
}

/// Settings change: switch the UI language.
pub async fn set_language<'e, E>(
    executor: E,
    user_id: UserId,
    ui_language: &str,
) -> Result<(), BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE users SET ui_language = $2, updated_at = NOW() WHERE user_id = $1")
        .bind(user_id)
        .bind(ui_language)
        .execute(executor)
        .await
        .map_err(map_db_err)?;
    Ok(())
}

/// Settings change: record or clear the gender hint.
pub async fn set_gender<'e, E>(
    executor: E,
    user_id: UserId,
    gender: Option<&str>,
) -> Result<(), BridgeError>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE users SET gender = $2, updated_at = NOW() WHERE user_id = $1")
        .bind(user_id)
        .bind(gender)
        .execute(executor)
        .await
        .map_err(map_db_err)?;
    Ok(())
}
