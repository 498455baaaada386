// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `bridgeos serve` - one bot front-end process.
//!
//! Wires the explicit lifecycle objects together: config, the bounded
//! Postgres pool, the translator, the transport fleet, and the engine.
//! The process owns exactly one slot and long-polls that bot's updates.

use std::sync::Arc;

use bridgeos_core::BridgeError;
use bridgeos_engine::Relay;
use bridgeos_store::Store;
use bridgeos_telegram::{bot_token_for_slot, fleet_from_env, slot_from_env, TelegramTransport};
use bridgeos_translator::ClaudeTranslator;
use tracing::info;

/// Runs the bot process for the slot named by `BOT_ID`.
pub async fn run_serve() -> Result<(), BridgeError> {
    let config = bridgeos_config::load_config()
        .map_err(|e| BridgeError::Config(e.to_string()))?;
    init_tracing(&config.log_level);

    let bot_slot = slot_from_env();
    info!(bot_slot, "starting bridgeos serve");

    let store = Store::connect(&config.storage).await?;
    store.migrate().await?;

    let translator = Arc::new(ClaudeTranslator::new(&config.translation)?);

    let fleet = Arc::new(fleet_from_env()?);
    if fleet.is_empty() {
        return Err(BridgeError::Config(
            "no bot tokens configured: set TELEGRAM_TOKEN_BOT1..TELEGRAM_TOKEN_BOT5".into(),
        ));
    }
    info!(slots = ?fleet.slots(), "transport fleet ready");

    let token = bot_token_for_slot(bot_slot).ok_or_else(|| {
        BridgeError::Config(format!(
            "no token for this process's slot: set TELEGRAM_TOKEN_BOT{bot_slot}"
        ))
    })?;
    let transport = TelegramTransport::new(&token)?;

    let relay = Relay::new(
        store.clone(),
        translator,
        fleet,
        Arc::new(config),
    );

    bridgeos_telegram::poller::run_polling(transport.bot().clone(), relay, bot_slot).await;

    store.close().await;
    info!("bridgeos serve shutdown complete");
    Ok(())
}

/// Runs migrations against the configured database and exits.
pub async fn run_migrate() -> Result<(), BridgeError> {
    let config = bridgeos_config::load_config()
        .map_err(|e| BridgeError::Config(e.to_string()))?;
    init_tracing(&config.log_level);

    let store = Store::connect(&config.storage).await?;
    store.migrate().await?;
    store.close().await;
    info!("migrations complete");
    Ok(())
}

/// Initializes the tracing subscriber with the configured log level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bridgeos={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
