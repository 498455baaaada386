// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Translator trait for LLM-backed translation providers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::BridgeError;
use crate::types::{ContextMessage, IndustryProfile};

/// One translation call.
///
/// The contract is deterministic for fixed inputs: the provider MUST return
/// a non-empty translated string or fail with `TranslationFailed`.
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    /// Text to translate, exactly as received.
    pub text: String,
    /// Source language display name (e.g. "English").
    pub from_language: String,
    /// Target language display name.
    pub to_language: String,
    /// Recipient gender for grammatical accuracy, when known.
    pub gender: Option<String>,
    /// Industry profile of the conversation's manager.
    pub industry: Option<IndustryProfile>,
    /// Last K messages of the connection, oldest first.
    pub context: Vec<ContextMessage>,
}

/// One message fed into daily action-item extraction.
#[derive(Debug, Clone)]
pub struct ExtractionMessage {
    /// Display name of the worker the message belongs to.
    pub worker_name: String,
    /// Original text.
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// Input for the 24-hour action-item extraction.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// All window messages across the manager's active connections.
    pub messages: Vec<ExtractionMessage>,
    pub industry: Option<IndustryProfile>,
    /// Manager's UI language; the entire output must be in this language.
    pub output_language: String,
}

/// Adapter for the LLM translation provider.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translates `request.text`, using context, gender, and industry hints.
    async fn translate(&self, request: TranslationRequest) -> Result<String, BridgeError>;

    /// Extracts a flat bullet list of action items from a message window.
    async fn extract_action_items(
        &self,
        request: ExtractionRequest,
    ) -> Result<String, BridgeError>;
}
