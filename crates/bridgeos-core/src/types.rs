// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the BridgeOS workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::BridgeError;

/// Platform-assigned 64-bit user identifier of the chat network.
pub type UserId = i64;

/// Surrogate key of a manager↔worker connection.
pub type ConnectionId = i64;

/// Surrogate key of a message row.
pub type MessageId = i64;

/// Surrogate key of a task row.
pub type TaskId = i64;

/// Bot slot number, 1..=5. Each slot names one front-end process of the fleet.
pub type BotSlot = i32;

/// Lowest and highest valid bot slots.
pub const MIN_BOT_SLOT: BotSlot = 1;
pub const MAX_BOT_SLOT: BotSlot = 5;

/// Validates that a slot names one of the five fleet positions.
pub fn validate_slot(bot_slot: BotSlot) -> Result<BotSlot, BridgeError> {
    if (MIN_BOT_SLOT..=MAX_BOT_SLOT).contains(&bot_slot) {
        Ok(bot_slot)
    } else {
        Err(BridgeError::InvalidSlot { bot_slot })
    }
}

/// The single active role a user holds, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Manager,
    Worker,
}

/// Lifecycle state of a connection row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionStatus {
    Active,
    Disconnected,
}

/// Lifecycle state of a task row. The transition is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

/// Persisted billing status. Effective entitlement is derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum SubscriptionStatus {
    Free,
    Active,
    Cancelled,
    Expired,
    Paused,
}

/// Read state of a feedback row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum FeedbackStatus {
    Unread,
    Read,
}

/// One entry of the sliding translation context window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMessage {
    /// UI language of the message's sender at read time.
    pub sender_language: String,
    /// Original (untranslated) text.
    pub text: String,
    /// Commit timestamp; monotonically non-decreasing within a window.
    pub sent_at: DateTime<Utc>,
}

/// Industry metadata fed into translation and extraction prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryProfile {
    /// Display name, e.g. "Dairy Farm".
    pub name: String,
    /// One-line description of the communication domain.
    pub description: String,
}

impl IndustryProfile {
    /// Fallback profile when a manager has no recognized industry key.
    pub fn generic() -> Self {
        Self {
            name: "workplace".to_string(),
            description: "workplace communication".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_validation_bounds() {
        assert!(validate_slot(1).is_ok());
        assert!(validate_slot(5).is_ok());
        assert!(matches!(
            validate_slot(0),
            Err(BridgeError::InvalidSlot { bot_slot: 0 })
        ));
        assert!(matches!(
            validate_slot(6),
            Err(BridgeError::InvalidSlot { bot_slot: 6 })
        ));
    }

    #[test]
    fn enums_round_trip_through_strings() {
        use std::str::FromStr;
        assert_eq!(Role::Manager.to_string(), "manager");
        assert_eq!(Role::from_str("worker").unwrap(), Role::Worker);
        assert_eq!(ConnectionStatus::Active.to_string(), "active");
        assert_eq!(
            SubscriptionStatus::from_str("cancelled").unwrap(),
            SubscriptionStatus::Cancelled
        );
        assert_eq!(TaskStatus::Pending.to_string(), "pending");
        assert_eq!(FeedbackStatus::Unread.to_string(), "unread");
    }
}
