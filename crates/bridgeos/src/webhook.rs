// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `bridgeos webhook` - the billing webhook receiver process.
//!
//! Independent from the bot fleet, same cooperative discipline, same
//! database. Carries its own transport fleet so subscription transitions
//! can notify managers out of band.

use std::sync::Arc;

use bridgeos_core::BridgeError;
use bridgeos_store::Store;
use bridgeos_telegram::fleet_from_env;
use bridgeos_webhook::{serve, SignatureValidator, WebhookState};
use secrecy::SecretString;
use tracing::info;

use crate::serve::init_tracing;

/// Runs the webhook receiver until stopped.
pub async fn run_webhook() -> Result<(), BridgeError> {
    let config = bridgeos_config::load_config()
        .map_err(|e| BridgeError::Config(e.to_string()))?;
    init_tracing(&config.log_level);

    let secret = config
        .billing
        .webhook_secret
        .clone()
        .or_else(|| std::env::var("BRIDGEOS_BILLING_WEBHOOK_SECRET").ok())
        .ok_or_else(|| {
            BridgeError::Config(
                "webhook secret required: set billing.webhook_secret or \
                 BRIDGEOS_BILLING_WEBHOOK_SECRET"
                    .into(),
            )
        })?;

    let store = Store::connect(&config.storage).await?;
    store.migrate().await?;

    // Notification transports are optional; the receiver works without them.
    let fleet = Arc::new(fleet_from_env()?);
    info!(slots = ?fleet.slots(), "webhook notification fleet ready");

    let state = WebhookState {
        store: store.clone(),
        validator: SignatureValidator::new(SecretString::from(secret)),
        fleet,
        config: Arc::new(config),
    };

    let result = serve(state).await;
    store.close().await;
    result
}
