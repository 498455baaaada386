// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PostgreSQL persistence layer for BridgeOS.
//!
//! Provides the bounded connection pool, a transactional unit-of-work,
//! embedded migrations, typed row structs, and the query modules. This is
//! the only layer that inspects database error codes: partial-unique-index
//! violations and foreign-key failures are translated into typed
//! [`BridgeError`](bridgeos_core::BridgeError) variants here and nowhere else.

pub mod migrations;
pub mod models;
pub mod queries;
pub mod store;

pub use models::*;
pub use store::{PgTransaction, Store};
