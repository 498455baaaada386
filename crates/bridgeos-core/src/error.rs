// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the BridgeOS relay.
//!
//! One enum covers the whole workspace. Invariant violations carry enough
//! context for the transport edge to render a short localized message;
//! the underlying constraint identifier is never surfaced to users.

use thiserror::Error;

use crate::types::{BotSlot, UserId};

/// The primary error type used across all BridgeOS crates.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (connection, query, decode failures).
    #[error("storage error: {source}")]
    Store {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The connection pool had no free connection within the acquire deadline.
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// The bot slot already holds an active worker for this manager.
    #[error("slot {bot_slot} already occupied for manager {manager_id}")]
    SlotOccupied { manager_id: UserId, bot_slot: BotSlot },

    /// The worker already has an active connection.
    #[error("worker {worker_id} already has an active connection")]
    WorkerAlreadyConnected { worker_id: UserId },

    /// Bot slot outside the 1..=5 fleet range.
    #[error("invalid bot slot {bot_slot}")]
    InvalidSlot { bot_slot: BotSlot },

    /// The referenced manager does not exist or is soft-deleted.
    #[error("manager {manager_id} not found")]
    ManagerGone { manager_id: UserId },

    /// The referenced worker does not exist or is soft-deleted.
    #[error("worker {worker_id} not found")]
    WorkerGone { worker_id: UserId },

    /// The sender has no active connection to route through.
    #[error("sender {sender_id} has no active connection")]
    NotConnected { sender_id: UserId },

    /// A worker message arrived on a bot other than the one it is bound to.
    #[error("message for slot {expected} arrived on slot {got}")]
    WrongSlot { expected: BotSlot, got: BotSlot },

    /// Invitation-code generation could not find a free code.
    #[error("no unique invitation code after {attempts} attempts")]
    CodeCollision { attempts: u32 },

    /// An invitation code that is malformed or owned by no active manager.
    #[error("invalid invitation code: {0}")]
    InvalidCode(String),

    /// A task trigger with no description after the `**` prefix.
    #[error("task description is empty")]
    EmptyTaskDescription,

    /// The actor is not allowed to perform this operation.
    #[error("operation not permitted")]
    Forbidden,

    /// The manager has exhausted the free message allocation.
    #[error("free message limit of {free_limit} reached")]
    LimitReached { free_limit: i32 },

    /// The translation provider failed after retries.
    #[error("translation failed: {message}")]
    TranslationFailed {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Outbound delivery through the chat transport failed.
    #[error("transport delivery failed: {message}")]
    TransportFailed {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An outbound call exceeded its wall-clock deadline.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal invariant failure. Fatal to the in-flight request.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// True for errors worth retrying (translator/transport transients).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BridgeError::TranslationFailed { .. }
                | BridgeError::TransportFailed { .. }
                | BridgeError::Timeout { .. }
                | BridgeError::PoolExhausted
        )
    }
}
