// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic-backed [`Translator`] implementation.
//!
//! Wraps the Messages API client with the prompt builders and enforces the
//! translator contract: a non-empty translated string or `TranslationFailed`.

pub mod client;
pub mod prompt;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use bridgeos_config::model::TranslationConfig;
use bridgeos_core::{
    BridgeError, ExtractionRequest, TranslationRequest, Translator,
};
use tracing::debug;

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, MessageRequest};

/// Text returned when the extraction window holds no messages. Produced
/// without calling the provider.
pub const EMPTY_WINDOW_RESPONSE: &str = "No messages found in the last 24 hours.";

/// LLM translator backed by the Anthropic Messages API.
pub struct ClaudeTranslator {
    client: AnthropicClient,
    model: String,
    max_tokens: u32,
}

impl ClaudeTranslator {
    /// Creates the translator from configuration.
    ///
    /// The API key comes from `translation.api_key` or, failing that, the
    /// `BRIDGEOS_TRANSLATION_API_KEY` / `ANTHROPIC_API_KEY` environment
    /// variables.
    pub fn new(config: &TranslationConfig) -> Result<Self, BridgeError> {
        if config.provider != "claude" {
            return Err(BridgeError::Config(format!(
                "unknown translation provider: {}",
                config.provider
            )));
        }
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("BRIDGEOS_TRANSLATION_API_KEY").ok())
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or_else(|| {
                BridgeError::Config(
                    "translation API key required: set translation.api_key or ANTHROPIC_API_KEY"
                        .into(),
                )
            })?;

        let client = AnthropicClient::new(
            &api_key,
            &config.api_version,
            Duration::from_secs(config.timeout_secs),
        )?;

        Ok(Self {
            client,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    /// Test constructor against a mock server.
    pub fn with_client(client: AnthropicClient, model: &str, max_tokens: u32) -> Self {
        Self {
            client,
            model: model.to_string(),
            max_tokens,
        }
    }

    async fn complete(&self, prompt: String) -> Result<String, BridgeError> {
        let request = MessageRequest {
            model: self.model.clone(),
            messages: vec![ApiMessage::user(prompt)],
            system: None,
            max_tokens: self.max_tokens,
        };
        let response = self.client.complete_message(&request).await?;
        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "provider call complete"
        );
        Ok(response.text())
    }
}

#[async_trait]
impl Translator for ClaudeTranslator {
    async fn translate(&self, request: TranslationRequest) -> Result<String, BridgeError> {
        let prompt = prompt::build_translation_prompt(
            &request.text,
            &request.from_language,
            &request.to_language,
            request.gender.as_deref(),
            request.industry.as_ref(),
            &request.context,
        );

        let translated = self.complete(prompt).await?;
        if translated.is_empty() {
            return Err(BridgeError::TranslationFailed {
                message: "provider returned an empty translation".into(),
                source: None,
            });
        }
        Ok(translated)
    }

    async fn extract_action_items(
        &self,
        request: ExtractionRequest,
    ) -> Result<String, BridgeError> {
        if request.messages.is_empty() {
            return Ok(EMPTY_WINDOW_RESPONSE.to_string());
        }

        let prompt = prompt::build_extraction_prompt(
            &request.messages,
            request.industry.as_ref(),
            &request.output_language,
        );

        let extracted = self.complete(prompt).await?;
        if extracted.is_empty() {
            return Err(BridgeError::TranslationFailed {
                message: "provider returned an empty extraction".into(),
                source: None,
            });
        }
        Ok(extracted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn translator_for(server: &MockServer) -> ClaudeTranslator {
        let client =
            AnthropicClient::new("test-key", "2023-06-01", Duration::from_secs(15))
                .unwrap()
                .with_base_url(server.uri());
        ClaudeTranslator::with_client(client, "claude-sonnet-4-20250514", 1000)
    }

    fn body_with_text(text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "msg_t",
            "content": [{"type": "text", "text": text}],
            "model": "claude-sonnet-4-20250514",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 5, "output_tokens": 5}
        })
    }

    fn translation_request(text: &str) -> TranslationRequest {
        TranslationRequest {
            text: text.to_string(),
            from_language: "English".to_string(),
            to_language: "Spanish".to_string(),
            gender: None,
            industry: None,
            context: Vec::new(),
        }
    }

    #[tokio::test]
    async fn translate_returns_provider_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body_with_text("Hola")))
            .mount(&server)
            .await;

        let translator = translator_for(&server);
        let result = translator.translate(translation_request("Hello")).await.unwrap();
        assert_eq!(result, "Hola");
    }

    #[tokio::test]
    async fn empty_translation_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body_with_text("   ")))
            .mount(&server)
            .await;

        let translator = translator_for(&server);
        let result = translator.translate(translation_request("Hello")).await;
        assert!(matches!(
            result,
            Err(BridgeError::TranslationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn empty_window_skips_the_provider() {
        // No mock mounted: any request would fail, proving none is made.
        let server = MockServer::start().await;
        let translator = translator_for(&server);

        let result = translator
            .extract_action_items(ExtractionRequest {
                messages: Vec::new(),
                industry: None,
                output_language: "English".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(result, EMPTY_WINDOW_RESPONSE);
    }
}
