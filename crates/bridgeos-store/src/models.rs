// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed row structs for every table.
//!
//! Statuses are stored as TEXT with CHECK constraints; the structs keep the
//! raw string and expose typed accessors so query code can bind and filter
//! with plain parameters.

use std::str::FromStr;

use bridgeos_core::{
    BotSlot, ConnectionId, ConnectionStatus, MessageId, SubscriptionStatus, TaskId, TaskStatus,
    UserId,
};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A chat-platform user, created on first contact.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: UserId,
    pub display_name: String,
    pub ui_language: String,
    pub gender: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Manager role row. Soft delete sets `deleted_at`.
#[derive(Debug, Clone, FromRow)]
pub struct Manager {
    pub manager_id: UserId,
    /// Invitation code, `BRIDGE-DDDDD`, unique among active managers.
    pub code: String,
    pub industry: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Worker role row. Soft delete sets `deleted_at`.
#[derive(Debug, Clone, FromRow)]
pub struct Worker {
    pub worker_id: UserId,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// An active or historical manager↔worker binding on one bot slot.
#[derive(Debug, Clone, FromRow)]
pub struct Connection {
    pub connection_id: ConnectionId,
    pub manager_id: UserId,
    pub worker_id: UserId,
    pub bot_slot: BotSlot,
    pub status: String,
    pub connected_at: DateTime<Utc>,
    pub disconnected_at: Option<DateTime<Utc>>,
}

impl Connection {
    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus::from_str(&self.status).unwrap_or(ConnectionStatus::Disconnected)
    }

    pub fn is_active(&self) -> bool {
        self.status() == ConnectionStatus::Active
    }

    /// The endpoint opposite to `user_id`, if it is an endpoint at all.
    pub fn counterpart(&self, user_id: UserId) -> Option<UserId> {
        if user_id == self.manager_id {
            Some(self.worker_id)
        } else if user_id == self.worker_id {
            Some(self.manager_id)
        } else {
            None
        }
    }
}

/// A translated message, persisted before delivery.
#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub message_id: MessageId,
    pub connection_id: ConnectionId,
    pub sender_id: UserId,
    pub original_text: String,
    pub translated_text: Option<String>,
    pub sent_at: DateTime<Utc>,
}

/// An assignment created by a manager for the connection's worker.
#[derive(Debug, Clone, FromRow)]
pub struct Task {
    pub task_id: TaskId,
    pub connection_id: ConnectionId,
    pub description: String,
    pub description_translated: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn status(&self) -> TaskStatus {
        TaskStatus::from_str(&self.status).unwrap_or(TaskStatus::Pending)
    }
}

/// A task joined with its connection's endpoints, for listing views.
#[derive(Debug, Clone, FromRow)]
pub struct TaskListing {
    pub task_id: TaskId,
    pub connection_id: ConnectionId,
    pub description: String,
    pub description_translated: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// The other party: worker for the manager view, manager for the worker view.
    pub counterpart_id: UserId,
    pub counterpart_name: String,
}

/// Billing state of a manager. Mutated only by webhook events.
#[derive(Debug, Clone, FromRow)]
pub struct Subscription {
    pub subscription_id: i64,
    pub manager_id: UserId,
    pub external_id: Option<String>,
    pub status: String,
    pub customer_portal_url: Option<String>,
    pub renews_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn status(&self) -> SubscriptionStatus {
        SubscriptionStatus::from_str(&self.status).unwrap_or(SubscriptionStatus::Free)
    }

    /// Effective entitlement at `now`, per the derivation table.
    pub fn is_entitled(&self, now: DateTime<Utc>) -> bool {
        bridgeos_core::is_entitled(self.status(), self.ends_at, now)
    }
}

/// Per-manager free-tier counter.
#[derive(Debug, Clone, FromRow)]
pub struct Usage {
    pub manager_id: UserId,
    pub messages_sent: i32,
    pub is_blocked: bool,
    pub first_message_at: Option<DateTime<Utc>>,
    pub last_message_at: Option<DateTime<Utc>>,
}

/// Write-only user feedback.
#[derive(Debug, Clone, FromRow)]
pub struct Feedback {
    pub feedback_id: i64,
    pub user_id: UserId,
    pub display_name: Option<String>,
    pub handle: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub status: String,
}

/// One message of a manager's 24-hour extraction window.
#[derive(Debug, Clone, FromRow)]
pub struct WindowMessage {
    pub worker_name: String,
    pub original_text: String,
    pub sent_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(manager_id: UserId, worker_id: UserId, status: &str) -> Connection {
        Connection {
            connection_id: 1,
            manager_id,
            worker_id,
            bot_slot: 1,
            status: status.to_string(),
            connected_at: Utc::now(),
            disconnected_at: None,
        }
    }

    #[test]
    fn connection_endpoint_helpers() {
        let conn = connection(10, 20, "active");
        assert!(conn.is_active());
        assert_eq!(conn.counterpart(10), Some(20));
        assert_eq!(conn.counterpart(20), Some(10));
        assert_eq!(conn.counterpart(30), None);
    }

    #[test]
    fn unknown_status_string_degrades_safely() {
        let conn = connection(1, 2, "corrupted");
        assert!(!conn.is_active());
    }

    #[test]
    fn subscription_entitlement_uses_derivation_table() {
        let now = Utc::now();
        let sub = Subscription {
            subscription_id: 1,
            manager_id: 1,
            external_id: None,
            status: "cancelled".to_string(),
            customer_portal_url: None,
            renews_at: None,
            ends_at: Some(now + chrono::Duration::days(1)),
            created_at: now,
            updated_at: now,
        };
        assert!(sub.is_entitled(now));
        assert!(!sub.is_entitled(now + chrono::Duration::days(2)));
    }
}
