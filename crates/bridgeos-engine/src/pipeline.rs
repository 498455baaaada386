// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The message pipeline: gate -> context -> translate -> persist -> deliver.
//!
//! Ordering contract: the message row commits BEFORE dispatch. History must
//! never show delivered messages that were not persisted; the reverse is
//! recoverable through the platform's own queue. A failed translation
//! leaves no row at all.

use std::time::Duration;

use bridgeos_core::{
    validate_slot, BotSlot, BridgeError, ConnectionId, MessageId, Role, TranslationRequest, UserId,
};
use bridgeos_store::models::{Connection, User};
use bridgeos_store::queries::usage::GateOutcome;
use bridgeos_store::queries::{connections, managers, messages, subscriptions, usage, users};
use chrono::Utc;
use tracing::{info, warn};

use crate::tasks::TASK_PREFIX;
use crate::Relay;

/// Wall-clock deadline for one outbound transport send.
const TRANSPORT_DEADLINE: Duration = Duration::from_secs(5);

/// Where an inbound text ended up.
#[derive(Debug)]
pub enum Routed {
    /// Plain text, translated and forwarded.
    Delivered(Delivery),
    /// `**`-prefixed text, turned into a task.
    TaskCreated(crate::tasks::CreatedTask),
}

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub message_id: MessageId,
    pub connection_id: ConnectionId,
    pub recipient_id: UserId,
    pub translated_text: String,
    /// False when the transport send failed after the row was committed.
    pub delivered: bool,
    /// True when this send consumed the last free message.
    pub now_blocked: bool,
}

impl Relay {
    /// Routes inbound text by the wire convention: a `**` prefix creates a
    /// task, everything else goes through the message pipeline.
    pub async fn route_text(
        &self,
        sender_id: UserId,
        bot_slot: BotSlot,
        text: &str,
    ) -> Result<Routed, BridgeError> {
        if text.starts_with(TASK_PREFIX) {
            Ok(Routed::TaskCreated(
                self.create_task(sender_id, bot_slot, text).await?,
            ))
        } else {
            Ok(Routed::Delivered(
                self.deliver_text(sender_id, bot_slot, text).await?,
            ))
        }
    }

    /// Translates and forwards one text message.
    pub async fn deliver_text(
        &self,
        sender_id: UserId,
        bot_slot: BotSlot,
        text: &str,
    ) -> Result<Delivery, BridgeError> {
        validate_slot(bot_slot)?;
        let pool = self.store().pool();

        let role = managers::get_role(pool, sender_id)
            .await?
            .ok_or(BridgeError::NotConnected { sender_id })?;

        let connection = self.locate_connection(sender_id, role, bot_slot).await?;

        // Usage gating applies to manager-originated messages only.
        let now_blocked = if role == Role::Manager {
            self.gate_manager(sender_id).await?
        } else {
            false
        };

        let recipient_id = connection.counterpart(sender_id).ok_or_else(|| {
            BridgeError::Internal(format!(
                "sender {sender_id} is not an endpoint of connection {}",
                connection.connection_id
            ))
        })?;
        let sender = self.endpoint_user(sender_id).await?;
        let recipient = self.endpoint_user(recipient_id).await?;

        let industry = match managers::get_active(pool, connection.manager_id).await? {
            Some(manager) => Some(self.config().industry_profile(&manager.industry)),
            None => None,
        };

        let context = messages::translation_context(
            pool,
            connection.connection_id,
            self.config().translation.context_size,
        )
        .await?;

        let translated = self
            .translator
            .translate(TranslationRequest {
                text: text.to_string(),
                from_language: sender.ui_language,
                to_language: recipient.ui_language,
                gender: recipient.gender,
                industry,
                context,
            })
            .await?;

        let message_id = messages::insert(
            pool,
            connection.connection_id,
            sender_id,
            text,
            &translated,
        )
        .await?;

        // The row is durable from here on; a failed send never rolls it back.
        let delivered = match self
            .dispatch(connection.bot_slot, recipient_id, &translated)
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    message_id,
                    recipient_id,
                    error = %err,
                    "delivery failed after persist; platform queue will retransmit"
                );
                false
            }
        };

        info!(
            message_id,
            connection_id = connection.connection_id,
            sender_id,
            recipient_id,
            bot_slot,
            delivered,
            "message relayed"
        );

        Ok(Delivery {
            message_id,
            connection_id: connection.connection_id,
            recipient_id,
            translated_text: translated,
            delivered,
            now_blocked,
        })
    }

    /// Resolves the connection an inbound message belongs to.
    ///
    /// A worker is served only by the bot it was bound to: a slot mismatch
    /// drops the message with `WrongSlot`, visible in logs alone.
    pub(crate) async fn locate_connection(
        &self,
        sender_id: UserId,
        role: Role,
        bot_slot: BotSlot,
    ) -> Result<Connection, BridgeError> {
        let pool = self.store().pool();
        match role {
            Role::Manager => connections::get_active_for_manager_slot(pool, sender_id, bot_slot)
                .await?
                .ok_or(BridgeError::NotConnected { sender_id }),
            Role::Worker => {
                let connection = connections::get_active_for_worker(pool, sender_id)
                    .await?
                    .ok_or(BridgeError::NotConnected { sender_id })?;
                if connection.bot_slot != bot_slot {
                    warn!(
                        worker_id = sender_id,
                        expected = connection.bot_slot,
                        got = bot_slot,
                        "worker message arrived on the wrong bot, dropping"
                    );
                    return Err(BridgeError::WrongSlot {
                        expected: connection.bot_slot,
                        got: bot_slot,
                    });
                }
                Ok(connection)
            }
        }
    }

    pub(crate) async fn endpoint_user(&self, user_id: UserId) -> Result<User, BridgeError> {
        users::get_by_id(self.store().pool(), user_id)
            .await?
            .ok_or_else(|| {
                BridgeError::Internal(format!("connection endpoint {user_id} has no user row"))
            })
    }

    /// The manager-side usage gate.
    ///
    /// Whitelisted ids and disabled enforcement short-circuit before the
    /// tracker; an effectively entitled subscription bypasses it too.
    /// Otherwise one unit is consumed atomically; returns whether that unit
    /// was the last free one.
    async fn gate_manager(&self, manager_id: UserId) -> Result<bool, BridgeError> {
        let limits = &self.config().limits;
        if !limits.enforce_limits || limits.is_whitelisted(manager_id) {
            return Ok(false);
        }

        let subscription =
            subscriptions::get_by_manager(self.store().pool(), manager_id).await?;
        if subscription
            .map(|s| s.is_entitled(Utc::now()))
            .unwrap_or(false)
        {
            return Ok(false);
        }

        let free_limit = limits.free_message_limit;
        let outcome = self
            .store()
            .with_tx(move |tx| {
                Box::pin(async move {
                    usage::get_or_create(&mut **tx, manager_id).await?;
                    let outcome = usage::consume(&mut **tx, manager_id, free_limit).await?;
                    if outcome == GateOutcome::Denied {
                        // The block flag must commit even though the send is
                        // rejected, so the denial stays inside Ok.
                        usage::mark_blocked(&mut **tx, manager_id).await?;
                    }
                    Ok(outcome)
                })
            })
            .await?;

        match outcome {
            GateOutcome::Allowed { now_blocked, .. } => Ok(now_blocked),
            GateOutcome::Denied => Err(BridgeError::LimitReached { free_limit }),
        }
    }

    /// Sends text through the slot's transport under the delivery deadline.
    pub(crate) async fn dispatch(
        &self,
        bot_slot: BotSlot,
        recipient_id: UserId,
        text: &str,
    ) -> Result<(), BridgeError> {
        let transport = self.fleet.get(bot_slot)?;
        match tokio::time::timeout(TRANSPORT_DEADLINE, transport.send_text(recipient_id, text))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(BridgeError::Timeout {
                duration: TRANSPORT_DEADLINE,
            }),
        }
    }
}
