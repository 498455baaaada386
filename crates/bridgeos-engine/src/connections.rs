// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection manager: race-free bind/unbind and the slot lookups.
//!
//! Concurrency is resolved entirely by the two partial unique indexes; from
//! the moment a bind commits, any subsequent read observes the bound state,
//! and of two racing binds exactly one commits while the other fails with
//! the error naming the conflicting invariant.

use bridgeos_core::{validate_slot, BotSlot, BridgeError, ConnectionId, UserId, MAX_BOT_SLOT, MIN_BOT_SLOT};
use bridgeos_store::models::Connection;
use bridgeos_store::queries::connections;
use bridgeos_store::queries::{managers, workers};

use crate::{Relay, UnbindOutcome};

/// Lowest free slot given the occupied ones, scanning 1..=5.
pub fn first_free_slot(occupied: &[BotSlot]) -> Option<BotSlot> {
    (MIN_BOT_SLOT..=MAX_BOT_SLOT).find(|slot| !occupied.contains(slot))
}

impl Relay {
    /// Binds a worker to a manager on a slot.
    ///
    /// Verifies both endpoints are active inside the same transaction as
    /// the insert; the indexes arbitrate any concurrent bind.
    pub async fn bind(
        &self,
        manager_id: UserId,
        worker_id: UserId,
        bot_slot: BotSlot,
    ) -> Result<ConnectionId, BridgeError> {
        validate_slot(bot_slot)?;

        self.store()
            .with_tx(move |tx| {
                Box::pin(async move {
                    managers::get_active(&mut **tx, manager_id)
                        .await?
                        .ok_or(BridgeError::ManagerGone { manager_id })?;
                    workers::get_active(&mut **tx, worker_id)
                        .await?
                        .ok_or(BridgeError::WorkerGone { worker_id })?;
                    connections::bind(&mut **tx, manager_id, worker_id, bot_slot).await
                })
            })
            .await
    }

    /// Idempotent disconnect; repeated calls report `AlreadyDisconnected`.
    pub async fn unbind(&self, connection_id: ConnectionId) -> Result<UnbindOutcome, BridgeError> {
        connections::unbind(self.store().pool(), connection_id).await
    }

    pub async fn connection(
        &self,
        connection_id: ConnectionId,
    ) -> Result<Option<Connection>, BridgeError> {
        connections::get_by_id(self.store().pool(), connection_id).await
    }

    pub async fn connection_for_manager_slot(
        &self,
        manager_id: UserId,
        bot_slot: BotSlot,
    ) -> Result<Option<Connection>, BridgeError> {
        connections::get_active_for_manager_slot(self.store().pool(), manager_id, bot_slot).await
    }

    pub async fn connection_for_worker(
        &self,
        worker_id: UserId,
    ) -> Result<Option<Connection>, BridgeError> {
        connections::get_active_for_worker(self.store().pool(), worker_id).await
    }

    /// Up to five active connections, ascending by slot.
    pub async fn connections_for_manager(
        &self,
        manager_id: UserId,
    ) -> Result<Vec<Connection>, BridgeError> {
        connections::list_active_for_manager(self.store().pool(), manager_id).await
    }

    /// Lowest slot with no active worker, for the add-worker flow.
    pub async fn next_free_slot(
        &self,
        manager_id: UserId,
    ) -> Result<Option<BotSlot>, BridgeError> {
        let occupied: Vec<BotSlot> = self
            .connections_for_manager(manager_id)
            .await?
            .iter()
            .map(|c| c.bot_slot)
            .collect();
        Ok(first_free_slot(&occupied))
    }
}
