// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations.
//!
//! One statement per constant, executed in foreign-key order. Every
//! statement is idempotent (`IF NOT EXISTS`), so running migrations on an
//! existing database is a no-op.
//!
//! The two partial unique indexes on `connections` ARE the connection
//! protocol: a slot holds at most one active worker per manager, and a
//! worker holds at most one active connection. Their names are load-bearing;
//! `queries::connections::bind` maps violations to typed errors by name.

use bridgeos_core::BridgeError;
use sqlx::PgPool;
use tracing::info;

use crate::store::map_db_err;

pub const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id      BIGINT PRIMARY KEY,
    display_name TEXT NOT NULL,
    ui_language  TEXT NOT NULL DEFAULT 'English',
    gender       TEXT,
    created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at   TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

pub const CREATE_MANAGERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS managers (
    manager_id BIGINT PRIMARY KEY REFERENCES users(user_id),
    code       TEXT NOT NULL,
    industry   TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    deleted_at TIMESTAMPTZ
)
"#;

/// Code uniqueness holds among active managers only; a soft-deleted manager
/// releases its code for reuse.
pub const CREATE_MANAGERS_CODE_INDEX: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_managers_active_code
    ON managers (code) WHERE deleted_at IS NULL
"#;

pub const CREATE_WORKERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS workers (
    worker_id  BIGINT PRIMARY KEY REFERENCES users(user_id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    deleted_at TIMESTAMPTZ
)
"#;

pub const CREATE_CONNECTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS connections (
    connection_id   BIGSERIAL PRIMARY KEY,
    manager_id      BIGINT NOT NULL REFERENCES managers(manager_id),
    worker_id       BIGINT NOT NULL REFERENCES workers(worker_id),
    bot_slot        INT NOT NULL CHECK (bot_slot BETWEEN 1 AND 5),
    status          TEXT NOT NULL DEFAULT 'active'
                    CHECK (status IN ('active', 'disconnected')),
    connected_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    disconnected_at TIMESTAMPTZ
)
"#;

pub const CREATE_CONNECTIONS_MANAGER_SLOT_INDEX: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_unique_manager_slot
    ON connections (manager_id, bot_slot) WHERE status = 'active'
"#;

pub const CREATE_CONNECTIONS_WORKER_INDEX: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_unique_active_worker
    ON connections (worker_id) WHERE status = 'active'
"#;

pub const CREATE_MESSAGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    message_id      BIGSERIAL PRIMARY KEY,
    connection_id   BIGINT NOT NULL REFERENCES connections(connection_id),
    sender_id       BIGINT NOT NULL,
    original_text   TEXT NOT NULL,
    translated_text TEXT,
    sent_at         TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

pub const CREATE_MESSAGES_CONNECTION_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_messages_connection_sent
    ON messages (connection_id, sent_at)
"#;

pub const CREATE_TASKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    task_id               BIGSERIAL PRIMARY KEY,
    connection_id         BIGINT NOT NULL REFERENCES connections(connection_id),
    description           TEXT NOT NULL,
    description_translated TEXT,
    status                TEXT NOT NULL DEFAULT 'pending'
                          CHECK (status IN ('pending', 'completed')),
    created_at            TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    completed_at          TIMESTAMPTZ
)
"#;

pub const CREATE_TASKS_CONNECTION_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_tasks_connection_status
    ON tasks (connection_id, status)
"#;

pub const CREATE_SUBSCRIPTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS subscriptions (
    subscription_id     BIGSERIAL PRIMARY KEY,
    manager_id          BIGINT NOT NULL UNIQUE REFERENCES managers(manager_id),
    external_id         TEXT,
    status              TEXT NOT NULL DEFAULT 'free'
                        CHECK (status IN ('free', 'active', 'cancelled', 'expired', 'paused')),
    customer_portal_url TEXT,
    renews_at           TIMESTAMPTZ,
    ends_at             TIMESTAMPTZ,
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at          TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

pub const CREATE_USAGE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS usage_tracking (
    manager_id       BIGINT PRIMARY KEY REFERENCES managers(manager_id),
    messages_sent    INT NOT NULL DEFAULT 0 CHECK (messages_sent >= 0),
    is_blocked       BOOLEAN NOT NULL DEFAULT FALSE,
    first_message_at TIMESTAMPTZ,
    last_message_at  TIMESTAMPTZ
)
"#;

pub const CREATE_FEEDBACK_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS feedback (
    feedback_id  BIGSERIAL PRIMARY KEY,
    user_id      BIGINT NOT NULL REFERENCES users(user_id),
    display_name TEXT,
    handle       TEXT,
    message      TEXT NOT NULL,
    created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    status       TEXT NOT NULL DEFAULT 'unread'
                 CHECK (status IN ('unread', 'read'))
)
"#;

/// All statements in foreign-key order.
const MIGRATIONS: [&str; 14] = [
    CREATE_USERS_TABLE,
    CREATE_MANAGERS_TABLE,
    CREATE_MANAGERS_CODE_INDEX,
    CREATE_WORKERS_TABLE,
    CREATE_CONNECTIONS_TABLE,
    CREATE_CONNECTIONS_MANAGER_SLOT_INDEX,
    CREATE_CONNECTIONS_WORKER_INDEX,
    CREATE_MESSAGES_TABLE,
    CREATE_MESSAGES_CONNECTION_INDEX,
    CREATE_TASKS_TABLE,
    CREATE_TASKS_CONNECTION_INDEX,
    CREATE_SUBSCRIPTIONS_TABLE,
    CREATE_USAGE_TABLE,
    CREATE_FEEDBACK_TABLE,
];

/// Runs every migration statement against the pool.
pub async fn run(pool: &PgPool) -> Result<(), BridgeError> {
    for statement in MIGRATIONS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(map_db_err)?;
    }
    info!(statements = MIGRATIONS.len(), "schema migrations applied");
    Ok(())
}
