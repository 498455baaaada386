// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Billing webhook receiver for BridgeOS.
//!
//! One fixed POST path, HMAC-SHA-256 authenticity over the raw body with
//! constant-time comparison, idempotent subscription transitions, and a
//! strict response discipline: 401 before authentication succeeds, 200
//! always afterwards. Retry storms are worse than delayed reconciliation.

pub mod apply;
pub mod event;
pub mod server;
pub mod signature;

pub use event::{BillingEvent, EventKind};
pub use server::{router, serve, WebhookState};
pub use signature::SignatureValidator;
