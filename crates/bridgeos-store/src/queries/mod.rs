// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per table.
//!
//! Every function is generic over [`sqlx::PgExecutor`], so the same
//! operation runs against the pool directly or inside a unit-of-work
//! transaction (`&mut **tx`).

pub mod connections;
pub mod feedback;
pub mod managers;
pub mod messages;
pub mod subscriptions;
pub mod tasks;
pub mod usage;
pub mod users;
pub mod workers;
