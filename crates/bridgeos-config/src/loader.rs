// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./bridgeos.toml` > `~/.config/bridgeos/bridgeos.toml`
//! > `/etc/bridgeos/bridgeos.toml` with environment overrides via the
//! `BRIDGEOS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::BridgeConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/bridgeos/bridgeos.toml` (system-wide)
/// 3. `~/.config/bridgeos/bridgeos.toml` (user XDG config)
/// 4. `./bridgeos.toml` (local directory)
/// 5. `BRIDGEOS_*` environment variables
pub fn load_config() -> Result<BridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BridgeConfig::default()))
        .merge(Toml::file("/etc/bridgeos/bridgeos.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("bridgeos/bridgeos.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("bridgeos.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<BridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BridgeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<BridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BridgeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `BRIDGEOS_LIMITS_FREE_MESSAGE_LIMIT`
/// must map to `limits.free_message_limit`, not `limits.free.message.limit`.
fn env_provider() -> Env {
    const SECTIONS: [&str; 6] = [
        "bot_",
        "translation_",
        "limits_",
        "billing_",
        "storage_",
        "webhook_",
    ];
    Env::prefixed("BRIDGEOS_").map(|key| {
        let key_str = key.as_str();
        for section in SECTIONS {
            // Only the leading section name becomes a dot; inner keys such as
            // billing.webhook_secret keep their underscores.
            if let Some(rest) = key_str.strip_prefix(section) {
                let name = section.trim_end_matches('_');
                return format!("{name}.{rest}").into();
            }
        }
        key_str.to_string().into()
    })
}
