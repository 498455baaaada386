// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The BridgeOS engine: everything between the chat transport and the store.
//!
//! [`Relay`] owns the store handle, the translator, and the transport fleet,
//! and exposes the externally observable operations: identity and roles,
//! the race-free connection protocol, the message pipeline, the task
//! subsystem, usage gating, and daily extraction. Bot processes are
//! stateless; every coordination point lives in the database.

pub mod connections;
pub mod daily;
pub mod identity;
pub mod invite;
pub mod pipeline;
pub mod tasks;

use std::sync::Arc;

use bridgeos_config::BridgeConfig;
use bridgeos_core::{Translator, TransportFleet};
use bridgeos_store::Store;

pub use bridgeos_store::queries::connections::UnbindOutcome;
pub use pipeline::{Delivery, Routed};
pub use tasks::{CompletedTask, CreatedTask, TASK_PREFIX};

/// The engine facade. One per process; cheap to clone.
#[derive(Clone)]
pub struct Relay {
    store: Store,
    translator: Arc<dyn Translator>,
    fleet: Arc<TransportFleet>,
    config: Arc<BridgeConfig>,
}

impl Relay {
    pub fn new(
        store: Store,
        translator: Arc<dyn Translator>,
        fleet: Arc<TransportFleet>,
        config: Arc<BridgeConfig>,
    ) -> Self {
        Self {
            store,
            translator,
            fleet,
            config,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}
