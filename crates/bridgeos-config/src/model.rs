// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for BridgeOS.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so typos in config keys
//! fail at startup with an actionable message.

use std::collections::HashMap;

use bridgeos_core::{BotSlot, IndustryProfile, UserId};
use serde::{Deserialize, Serialize};

/// Top-level BridgeOS configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections default to sensible values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Fleet identity of this process.
    #[serde(default)]
    pub bot: BotConfig,

    /// Translation provider settings.
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Free-tier usage limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Billing provider settings.
    #[serde(default)]
    pub billing: BillingConfig,

    /// PostgreSQL connection settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Webhook receiver settings.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Industry key -> prompt profile.
    #[serde(default)]
    pub industries: HashMap<String, IndustryProfile>,

    /// Selectable UI languages (display names).
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bot: BotConfig::default(),
            translation: TranslationConfig::default(),
            limits: LimitsConfig::default(),
            billing: BillingConfig::default(),
            storage: StorageConfig::default(),
            webhook: WebhookConfig::default(),
            industries: HashMap::new(),
            languages: default_languages(),
            log_level: default_log_level(),
        }
    }
}

impl BridgeConfig {
    /// Industry profile for a manager's stored key, falling back to the
    /// generic workplace profile.
    pub fn industry_profile(&self, key: &str) -> IndustryProfile {
        self.industries
            .get(key)
            .cloned()
            .or_else(|| self.industries.get("other").cloned())
            .unwrap_or_else(IndustryProfile::generic)
    }
}

/// Fleet identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Logical bot id, `bot1`..`bot5`. Overridden by the `BOT_ID` env var.
    #[serde(default = "default_bot_id")]
    pub id: String,

    /// Slot number (as a string key) -> chat-platform bot username.
    #[serde(default)]
    pub usernames: HashMap<String, String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            id: default_bot_id(),
            usernames: HashMap::new(),
        }
    }
}

impl BotConfig {
    /// Numeric slot of this process: the trailing digit of the bot id,
    /// with the `BOT_ID` environment variable taking precedence.
    pub fn slot(&self) -> BotSlot {
        let id = std::env::var("BOT_ID").unwrap_or_else(|_| self.id.clone());
        id.trim_start_matches("bot").parse().unwrap_or(1)
    }

    /// Bot username owning `slot`, when configured.
    pub fn username_for_slot(&self, slot: BotSlot) -> Option<&str> {
        self.usernames.get(&slot.to_string()).map(String::as_str)
    }
}

fn default_bot_id() -> String {
    "bot1".to_string()
}

/// Translation provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TranslationConfig {
    /// Provider identifier. Only `claude` is compiled in.
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Provider API key. `None` requires the environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier for translation and extraction requests.
    #[serde(default = "default_model")]
    pub model: String,

    /// Provider API version header.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Sliding window size of the translation context.
    #[serde(default = "default_context_size")]
    pub context_size: i64,

    /// Token cap per provider response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Wall-clock deadline per translation attempt, in seconds.
    #[serde(default = "default_translation_timeout")]
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            model: default_model(),
            api_version: default_api_version(),
            context_size: default_context_size(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_translation_timeout(),
        }
    }
}

fn default_provider() -> String {
    "claude".to_string()
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_context_size() -> i64 {
    6
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_translation_timeout() -> u64 {
    15
}

/// Free-tier usage limit configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum manager-originated messages per unpaid lifetime.
    #[serde(default = "default_free_limit")]
    pub free_message_limit: i32,

    /// Master switch for usage gating.
    #[serde(default = "default_enforce_limits")]
    pub enforce_limits: bool,

    /// Whitelisted user ids that bypass gating entirely.
    #[serde(default)]
    pub test_user_ids: Vec<UserId>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            free_message_limit: default_free_limit(),
            enforce_limits: default_enforce_limits(),
            test_user_ids: Vec::new(),
        }
    }
}

impl LimitsConfig {
    pub fn is_whitelisted(&self, user_id: UserId) -> bool {
        self.test_user_ids.contains(&user_id)
    }
}

fn default_free_limit() -> i32 {
    8
}

fn default_enforce_limits() -> bool {
    true
}

/// Billing provider configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BillingConfig {
    /// Hosted store host, e.g. "bridgeos.lemonsqueezy.com".
    #[serde(default)]
    pub store_url: String,

    /// Checkout variant identifier.
    #[serde(default)]
    pub checkout_id: String,

    /// Monthly price in USD, for call-to-action rendering.
    #[serde(default)]
    pub monthly_price: f64,

    /// Shared webhook secret. `None` requires the environment variable.
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

impl BillingConfig {
    /// Checkout URL carrying the manager id in the custom-fields channel.
    pub fn checkout_url(&self, manager_id: UserId) -> String {
        format!(
            "https://{}/checkout/buy/{}?checkout[custom][manager_id]={manager_id}",
            self.store_url, self.checkout_id
        )
    }
}

/// PostgreSQL connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Connection URL. `None` falls back to the `DATABASE_URL` env var.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Connections kept warm.
    #[serde(default = "default_pool_min")]
    pub pool_min: u32,

    /// Hard ceiling of the pool.
    #[serde(default = "default_pool_max")]
    pub pool_max: u32,

    /// Deadline for acquiring a pooled connection, in seconds.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            pool_min: default_pool_min(),
            pool_max: default_pool_max(),
            acquire_timeout_secs: default_acquire_timeout(),
        }
    }
}

impl StorageConfig {
    /// Resolves the connection URL from config or `DATABASE_URL`.
    pub fn resolve_database_url(&self) -> Option<String> {
        self.database_url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
    }
}

fn default_pool_min() -> u32 {
    5
}

fn default_pool_max() -> u32 {
    20
}

fn default_acquire_timeout() -> u64 {
    5
}

/// Webhook receiver configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    /// Address to bind the receiver to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port to bind.
    #[serde(default = "default_webhook_port")]
    pub port: u16,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_webhook_port(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_webhook_port() -> u16 {
    5001
}

fn default_languages() -> Vec<String> {
    vec!["English".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}
