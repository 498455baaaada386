// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core types for the BridgeOS translated-messaging relay.
//!
//! Defines the shared [`BridgeError`] type, domain identifiers and enums,
//! the adapter traits the engine depends on ([`Translator`], [`Transport`]),
//! and the pure subscription-entitlement function.

pub mod entitlement;
pub mod error;
pub mod traits;
pub mod types;

pub use entitlement::is_entitled;
pub use error::BridgeError;
pub use traits::translator::{
    ExtractionMessage, ExtractionRequest, TranslationRequest, Translator,
};
pub use traits::transport::{Transport, TransportFleet};
pub use types::*;
