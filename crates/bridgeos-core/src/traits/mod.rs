// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits at the external seams of the engine.

pub mod translator;
pub mod transport;
