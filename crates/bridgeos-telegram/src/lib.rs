// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram front-end fleet for BridgeOS.
//!
//! Implements [`Transport`] for the Telegram Bot API via teloxide and owns
//! slot determination: each process reads `BOT_ID` (`bot1`..`bot5`) and
//! handles only the conversations bound to its own slot. Tokens come from
//! `TELEGRAM_TOKEN_BOT1`..`TELEGRAM_TOKEN_BOT5`; the fleet holds a client
//! for every token present, so any process can dispatch through any bot.

pub mod poller;

use async_trait::async_trait;
use bridgeos_core::{BotSlot, BridgeError, Transport, TransportFleet, UserId, MAX_BOT_SLOT, MIN_BOT_SLOT};
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tracing::warn;

/// Telegram transport for one bot token.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    /// Creates a transport from a bot token.
    pub fn new(token: &str) -> Result<Self, BridgeError> {
        if token.is_empty() {
            return Err(BridgeError::Config(
                "telegram bot token cannot be empty".into(),
            ));
        }
        Ok(Self {
            bot: Bot::new(token),
        })
    }

    /// The underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(&self, recipient: UserId, text: &str) -> Result<(), BridgeError> {
        self.bot
            .send_message(ChatId(recipient), text)
            .await
            .map_err(|e| BridgeError::TransportFailed {
                message: format!("failed to send message to {recipient}: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(())
    }
}

/// Token for a slot from `TELEGRAM_TOKEN_BOT{slot}`.
pub fn bot_token_for_slot(slot: BotSlot) -> Option<String> {
    std::env::var(format!("TELEGRAM_TOKEN_BOT{slot}")).ok()
}

/// This process's slot: the trailing digit of the `BOT_ID` env var.
pub fn slot_from_env() -> BotSlot {
    let bot_id = std::env::var("BOT_ID").unwrap_or_else(|_| "bot1".to_string());
    match bot_id.trim_start_matches("bot").parse() {
        Ok(slot) if (MIN_BOT_SLOT..=MAX_BOT_SLOT).contains(&slot) => slot,
        _ => {
            warn!(bot_id = %bot_id, "invalid BOT_ID, defaulting to slot 1");
            1
        }
    }
}

/// Builds the transport fleet from every slot token present in the
/// environment.
pub fn fleet_from_env() -> Result<TransportFleet, BridgeError> {
    let mut fleet = TransportFleet::new();
    for slot in MIN_BOT_SLOT..=MAX_BOT_SLOT {
        if let Some(token) = bot_token_for_slot(slot) {
            fleet.insert(slot, std::sync::Arc::new(TelegramTransport::new(&token)?));
        }
    }
    Ok(fleet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_empty_token() {
        assert!(TelegramTransport::new("").is_err());
    }

    #[test]
    fn new_accepts_valid_token() {
        assert!(TelegramTransport::new("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11").is_ok());
    }
}
