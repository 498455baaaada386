// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-demand daily extraction over a 24-hour window.
//!
//! Extraction, not summarization: the provider is instructed to emit a flat
//! bullet list of action items, safety issues, and equipment notes in the
//! manager's UI language. No caching.

use bridgeos_core::{BridgeError, ExtractionMessage, ExtractionRequest, UserId};
use bridgeos_store::queries::{managers, messages, users};
use chrono::{Duration, Utc};
use tracing::info;

use crate::Relay;

/// Size of the extraction window.
const WINDOW_HOURS: i64 = 24;

impl Relay {
    /// Extracts action items from the manager's last 24 hours of messages
    /// across all active connections. An empty window produces the
    /// empty-list response without calling the provider.
    pub async fn daily_action_items(&self, manager_id: UserId) -> Result<String, BridgeError> {
        let pool = self.store().pool();

        let manager = managers::get_active(pool, manager_id)
            .await?
            .ok_or(BridgeError::ManagerGone { manager_id })?;
        let manager_user = users::get_by_id(pool, manager_id)
            .await?
            .ok_or(BridgeError::ManagerGone { manager_id })?;

        let since = Utc::now() - Duration::hours(WINDOW_HOURS);
        let window = messages::window_for_manager(pool, manager_id, since).await?;
        info!(
            manager_id,
            window_messages = window.len(),
            "running daily extraction"
        );

        self.translator
            .extract_action_items(ExtractionRequest {
                messages: window
                    .into_iter()
                    .map(|m| ExtractionMessage {
                        worker_name: m.worker_name,
                        text: m.original_text,
                        sent_at: m.sent_at,
                    })
                    .collect(),
                industry: Some(self.config().industry_profile(&manager.industry)),
                output_language: manager_user.ui_language,
            })
            .await
    }
}
