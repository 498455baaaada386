// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task subsystem: closed-loop assignments between a manager and a worker.
//!
//! Creation is manager-only and translator-backed; completion is a one-way
//! `pending -> completed` transition checked and applied in one transaction.
//! Tasks never consume usage counters.

use bridgeos_core::{
    BotSlot, BridgeError, Role, TaskId, TranslationRequest, UserId,
};
use bridgeos_store::models::{Task, TaskListing};
use bridgeos_store::queries::{connections, managers, tasks};
use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::Relay;

/// Wire-visible task trigger: two literal asterisks (U+002A U+002A).
pub const TASK_PREFIX: &str = "**";

/// Default listing window.
const LISTING_WINDOW_HOURS: i64 = 24;

/// A freshly created task, ready for presentation to the manager.
#[derive(Debug, Clone)]
pub struct CreatedTask {
    pub task_id: TaskId,
    pub description: String,
    pub description_translated: String,
    pub worker_id: UserId,
}

/// Outcome of a completion call. Repeat completions are reported, not failed.
#[derive(Debug, Clone)]
pub enum CompletedTask {
    /// The transition was applied now.
    Completed(Task),
    /// The task had already been completed; the row is unchanged.
    AlreadyCompleted(Task),
}

/// Strips the `**` trigger and trims. `None` when nothing remains.
pub fn parse_task_description(text: &str) -> Option<&str> {
    let stripped = text.strip_prefix(TASK_PREFIX)?.trim();
    (!stripped.is_empty()).then_some(stripped)
}

impl Relay {
    /// Creates a task from `**`-prefixed text sent by a manager.
    ///
    /// The remainder after the prefix, trimmed and non-empty, becomes the
    /// description; it is translated to the worker's language through the
    /// same translator path as ordinary messages.
    pub async fn create_task(
        &self,
        sender_id: UserId,
        bot_slot: BotSlot,
        text: &str,
    ) -> Result<CreatedTask, BridgeError> {
        let pool = self.store().pool();
        let role = managers::get_role(pool, sender_id)
            .await?
            .ok_or(BridgeError::Forbidden)?;
        if role != Role::Manager {
            return Err(BridgeError::Forbidden);
        }

        let description = parse_task_description(text).ok_or(BridgeError::EmptyTaskDescription)?;

        let connection = self
            .locate_connection(sender_id, Role::Manager, bot_slot)
            .await?;
        let manager_user = self.endpoint_user(sender_id).await?;
        let worker_user = self.endpoint_user(connection.worker_id).await?;

        let industry = managers::get_active(pool, sender_id)
            .await?
            .map(|m| self.config().industry_profile(&m.industry));

        let description_translated = self
            .translator
            .translate(TranslationRequest {
                text: description.to_string(),
                from_language: manager_user.ui_language,
                to_language: worker_user.ui_language,
                gender: worker_user.gender,
                industry,
                context: Vec::new(),
            })
            .await?;

        let task = tasks::create(
            pool,
            connection.connection_id,
            description,
            &description_translated,
        )
        .await?;

        info!(
            task_id = task.task_id,
            connection_id = connection.connection_id,
            manager_id = sender_id,
            worker_id = connection.worker_id,
            "task created"
        );

        Ok(CreatedTask {
            task_id: task.task_id,
            description: description.to_string(),
            description_translated,
            worker_id: connection.worker_id,
        })
    }

    /// Completes a task on behalf of `actor_id`.
    ///
    /// Preconditions, checked in one transaction: the task exists, its
    /// connection is still active, and the actor is that connection's
    /// worker. A completed task reports `AlreadyCompleted` with the row
    /// unchanged; every other violation is `Forbidden`.
    pub async fn complete_task(
        &self,
        task_id: TaskId,
        actor_id: UserId,
    ) -> Result<CompletedTask, BridgeError> {
        let outcome = self
            .store()
            .with_tx(move |tx| {
                Box::pin(async move {
                    let task = tasks::get(&mut **tx, task_id)
                        .await?
                        .ok_or(BridgeError::Forbidden)?;

                    let connection = connections::get_by_id(&mut **tx, task.connection_id)
                        .await?
                        .ok_or(BridgeError::Forbidden)?;
                    if !connection.is_active() || connection.worker_id != actor_id {
                        return Err(BridgeError::Forbidden);
                    }

                    match tasks::mark_completed(&mut **tx, task_id).await? {
                        Some(completed) => Ok(CompletedTask::Completed(completed)),
                        // Not pending, and we already know it exists.
                        None => Ok(CompletedTask::AlreadyCompleted(task)),
                    }
                })
            })
            .await?;

        if let CompletedTask::Completed(ref task) = outcome {
            info!(task_id = task.task_id, worker_id = actor_id, "task completed");
        }
        Ok(outcome)
    }

    /// Manager view: pending tasks plus completions inside the window,
    /// carrying the worker endpoint for grouping.
    pub async fn tasks_for_manager(
        &self,
        manager_id: UserId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<TaskListing>, BridgeError> {
        let since = since.unwrap_or_else(default_window_start);
        tasks::list_for_manager(self.store().pool(), manager_id, since).await
    }

    /// Worker view: same window, translated descriptions are the payload.
    pub async fn tasks_for_worker(
        &self,
        worker_id: UserId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<TaskListing>, BridgeError> {
        let since = since.unwrap_or_else(default_window_start);
        tasks::list_for_worker(self.store().pool(), worker_id, since).await
    }
}

fn default_window_start() -> DateTime<Utc> {
    Utc::now() - Duration::hours(LISTING_WINDOW_HOURS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_strips_prefix_and_trims() {
        assert_eq!(parse_task_description("** Check cow 115"), Some("Check cow 115"));
        assert_eq!(parse_task_description("**Check cow 115"), Some("Check cow 115"));
        assert_eq!(parse_task_description("**  spaced  "), Some("spaced"));
    }

    #[test]
    fn parse_rejects_empty_descriptions() {
        assert_eq!(parse_task_description("**"), None);
        assert_eq!(parse_task_description("**   "), None);
        assert_eq!(parse_task_description("** \t\n"), None);
    }

    #[test]
    fn parse_rejects_unprefixed_text() {
        assert_eq!(parse_task_description("Check cow 115"), None);
        assert_eq!(parse_task_description("*single star"), None);
    }

    #[test]
    fn prefix_is_two_asterisks() {
        assert_eq!(TASK_PREFIX, "\u{2a}\u{2a}");
    }
}
