// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Effective subscription entitlement.
//!
//! A pure function of `(status, ends_at, now)`. Only the webhook receiver
//! mutates the persisted status; everything else derives entitlement here.

use chrono::{DateTime, Utc};

use crate::types::SubscriptionStatus;

/// True when messages bypass usage gating.
///
/// `active` is always entitled. `cancelled` keeps access until `ends_at`
/// passes (a missing `ends_at` means access ended with the cancellation).
/// `paused`, `expired`, and `free` are never entitled.
pub fn is_entitled(
    status: SubscriptionStatus,
    ends_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    match status {
        SubscriptionStatus::Active => true,
        SubscriptionStatus::Cancelled => ends_at.is_some_and(|end| now < end),
        SubscriptionStatus::Paused
        | SubscriptionStatus::Expired
        | SubscriptionStatus::Free => false,
    }
}
