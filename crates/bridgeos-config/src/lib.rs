// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the BridgeOS relay.
//!
//! TOML files following the XDG hierarchy, merged with `BRIDGEOS_*`
//! environment variable overrides. Secrets (bot tokens, translator key,
//! webhook secret, database URL) come from the environment only.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::BridgeConfig;
