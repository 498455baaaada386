// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection pool lifecycle and the transactional unit of work.
//!
//! The pool is an explicit lifecycle object: created at process start,
//! closed at shutdown, and threaded to every store operation. No
//! module-level singletons survive test teardown.

use std::time::Duration;

use bridgeos_config::model::StorageConfig;
use bridgeos_core::BridgeError;
use futures::future::BoxFuture;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

use crate::migrations;

/// A transaction handle passed to unit-of-work closures.
pub type PgTransaction = sqlx::Transaction<'static, sqlx::Postgres>;

/// PostgreSQL store with a bounded connection pool.
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    /// Connects the bounded pool described by `config`.
    ///
    /// Requests block on acquisition up to `acquire_timeout_secs` and then
    /// surface `PoolExhausted` rather than waiting indefinitely.
    pub async fn connect(config: &StorageConfig) -> Result<Self, BridgeError> {
        let url = config.resolve_database_url().ok_or_else(|| {
            BridgeError::Config(
                "database URL not configured: set storage.database_url or DATABASE_URL".into(),
            )
        })?;

        let pool = PgPoolOptions::new()
            .min_connections(config.pool_min)
            .max_connections(config.pool_max)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&url)
            .await
            .map_err(map_db_err)?;

        info!(
            min = config.pool_min,
            max = config.pool_max,
            "database pool connected"
        );
        Ok(Self { pool })
    }

    /// Wraps an existing pool (tests).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, usable directly as a query executor.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the embedded migrations in foreign-key order.
    pub async fn migrate(&self) -> Result<(), BridgeError> {
        migrations::run(&self.pool).await
    }

    /// Drains and closes the pool.
    pub async fn close(&self) {
        debug!("closing database pool");
        self.pool.close().await;
    }

    /// Unit of work: runs `f` inside a transaction, commits on `Ok`,
    /// rolls back on `Err`, and always releases the connection.
    pub async fn with_tx<T, F>(&self, f: F) -> Result<T, BridgeError>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut PgTransaction) -> BoxFuture<'t, Result<T, BridgeError>> + Send,
    {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        match f(&mut tx).await {
            Ok(value) => {
                tx.commit().await.map_err(map_db_err)?;
                Ok(value)
            }
            Err(err) => {
                // Rollback failure is secondary to the original error.
                let _ = tx.rollback().await;
                Err(err)
            }
        }
    }
}

/// Translates a driver error into the workspace error type.
///
/// Invariant-specific constraint names are handled at the call sites that
/// know the violated invariant (`connections::bind`); everything else lands
/// here.
pub(crate) fn map_db_err(err: sqlx::Error) -> BridgeError {
    match err {
        sqlx::Error::PoolTimedOut => BridgeError::PoolExhausted,
        other => BridgeError::Store {
            source: Box::new(other),
        },
    }
}

/// Constraint name of a database error, when the driver exposes one.
pub(crate) fn constraint_name(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db) => db.constraint(),
        _ => None,
    }
}
