// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity and roles: user upsert, registration, soft delete, reset.
//!
//! Soft-deleting a role disconnects every active connection involving the
//! user in the same transaction, and preserves message and task history.
//! A user may carry a soft-deleted row of one role and an active row of the
//! other after a reset-and-switch flow; the reported role is always the
//! unique active one.

use bridgeos_core::{BridgeError, Role, UserId};
use bridgeos_store::models::{Feedback, Manager, User, Worker};
use bridgeos_store::queries::{connections, feedback, managers, users, workers};
use tracing::info;

use crate::Relay;

impl Relay {
    /// Insert-or-update a user on first contact or profile change.
    pub async fn upsert_user(
        &self,
        user_id: UserId,
        display_name: &str,
        ui_language: Option<&str>,
        gender: Option<&str>,
    ) -> Result<User, BridgeError> {
        users::upsert(self.store().pool(), user_id, display_name, ui_language, gender).await
    }

    pub async fn user(&self, user_id: UserId) -> Result<Option<User>, BridgeError> {
        users::get_by_id(self.store().pool(), user_id).await
    }

    pub async fn set_language(&self, user_id: UserId, language: &str) -> Result<(), BridgeError> {
        users::set_language(self.store().pool(), user_id, language).await
    }

    pub async fn set_gender(
        &self,
        user_id: UserId,
        gender: Option<&str>,
    ) -> Result<(), BridgeError> {
        users::set_gender(self.store().pool(), user_id, gender).await
    }

    /// Registers the manager role, generating a fresh invitation code.
    ///
    /// Idempotent: a soft-deleted manager row is re-activated with the new
    /// code and industry. The user row must already exist.
    pub async fn register_manager(
        &self,
        user_id: UserId,
        industry: &str,
    ) -> Result<Manager, BridgeError> {
        let code = self.generate_invitation_code().await?;
        let manager = managers::create(self.store().pool(), user_id, &code, industry).await?;
        info!(manager_id = user_id, code = %manager.code, industry, "manager registered");
        Ok(manager)
    }

    /// Registers the worker role (idempotent re-activation).
    pub async fn register_worker(&self, user_id: UserId) -> Result<Worker, BridgeError> {
        let worker = workers::create(self.store().pool(), user_id).await?;
        info!(worker_id = user_id, "worker registered");
        Ok(worker)
    }

    /// The single active role of a user, never both.
    pub async fn role(&self, user_id: UserId) -> Result<Option<Role>, BridgeError> {
        managers::get_role(self.store().pool(), user_id).await
    }

    /// Active manager row, if any.
    pub async fn manager(&self, user_id: UserId) -> Result<Option<Manager>, BridgeError> {
        managers::get_active(self.store().pool(), user_id).await
    }

    /// Soft-deletes the manager role and disconnects all of the user's
    /// active connections, atomically.
    pub async fn soft_delete_manager(&self, user_id: UserId) -> Result<(), BridgeError> {
        self.store()
            .with_tx(move |tx| {
                Box::pin(async move {
                    managers::soft_delete(&mut **tx, user_id).await?;
                    let dropped = connections::disconnect_all_for_user(&mut **tx, user_id).await?;
                    info!(manager_id = user_id, dropped, "manager soft-deleted");
                    Ok(())
                })
            })
            .await
    }

    /// Soft-deletes the worker role and disconnects its connection,
    /// atomically.
    pub async fn soft_delete_worker(&self, user_id: UserId) -> Result<(), BridgeError> {
        self.store()
            .with_tx(move |tx| {
                Box::pin(async move {
                    workers::soft_delete(&mut **tx, user_id).await?;
                    let dropped = connections::disconnect_all_for_user(&mut **tx, user_id).await?;
                    info!(worker_id = user_id, dropped, "worker soft-deleted");
                    Ok(())
                })
            })
            .await
    }

    /// Reset flow: drops whichever active role the user holds so they can
    /// register again. History stays intact.
    pub async fn reset_user(&self, user_id: UserId) -> Result<Option<Role>, BridgeError> {
        let role = self.role(user_id).await?;
        match role {
            Some(Role::Manager) => self.soft_delete_manager(user_id).await?,
            Some(Role::Worker) => self.soft_delete_worker(user_id).await?,
            None => {}
        }
        Ok(role)
    }

    /// Records write-only user feedback.
    pub async fn submit_feedback(
        &self,
        user_id: UserId,
        display_name: Option<&str>,
        handle: Option<&str>,
        message: &str,
    ) -> Result<Feedback, BridgeError> {
        feedback::save(self.store().pool(), user_id, display_name, handle, message).await
    }
}
