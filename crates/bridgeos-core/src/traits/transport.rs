// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport trait for outbound chat-platform delivery.
//!
//! The process is given a set of transport clients keyed by slot and may
//! dispatch through any of them; cross-bot sends are an ordinary capability,
//! not a special control-flow construct.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BridgeError;
use crate::types::{BotSlot, UserId};

/// Outbound text delivery to one user through one bot front-end.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends plain text to the recipient's direct chat.
    async fn send_text(&self, recipient: UserId, text: &str) -> Result<(), BridgeError>;
}

/// The set of transport clients a process holds, keyed by bot slot.
#[derive(Default)]
pub struct TransportFleet {
    channels: HashMap<BotSlot, Arc<dyn Transport>>,
}

impl TransportFleet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the transport owning `bot_slot`.
    pub fn insert(&mut self, bot_slot: BotSlot, transport: Arc<dyn Transport>) {
        self.channels.insert(bot_slot, transport);
    }

    /// Returns the transport for a slot, or `TransportFailed` when the fleet
    /// has no client registered there.
    pub fn get(&self, bot_slot: BotSlot) -> Result<Arc<dyn Transport>, BridgeError> {
        self.channels
            .get(&bot_slot)
            .cloned()
            .ok_or_else(|| BridgeError::TransportFailed {
                message: format!("no transport registered for slot {bot_slot}"),
                source: None,
            })
    }

    /// Slots with a registered transport, ascending.
    pub fn slots(&self) -> Vec<BotSlot> {
        let mut slots: Vec<BotSlot> = self.channels.keys().copied().collect();
        slots.sort_unstable();
        slots
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullTransport;

    #[async_trait]
    impl Transport for NullTransport {
        async fn send_text(&self, _recipient: UserId, _text: &str) -> Result<(), BridgeError> {
            Ok(())
        }
    }

    #[test]
    fn fleet_lookup_by_slot() {
        let mut fleet = TransportFleet::new();
        fleet.insert(2, Arc::new(NullTransport));
        fleet.insert(1, Arc::new(NullTransport));

        assert!(fleet.get(1).is_ok());
        assert!(fleet.get(2).is_ok());
        assert!(matches!(
            fleet.get(3),
            Err(BridgeError::TransportFailed { .. })
        ));
        assert_eq!(fleet.slots(), vec![1, 2]);
        assert_eq!(fleet.len(), 2);
    }
}
