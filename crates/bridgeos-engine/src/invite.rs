// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invitation codes and links.
//!
//! Codes follow the wire-visible pattern `BRIDGE-DDDDD`. Generation probes
//! the active-manager code index directly and retries a bounded number of
//! times; the partial unique index backstops any probe/insert race.

use bridgeos_core::{BotSlot, BridgeError, UserId};
use bridgeos_store::models::Connection;
use bridgeos_store::queries::{connections, managers, workers};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use tracing::info;

use crate::Relay;

/// Bound on uniqueness-probe retries during code generation.
pub const MAX_CODE_ATTEMPTS: u32 = 10;

static CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^BRIDGE-\d{5}$").expect("static pattern compiles"));

/// True when `code` matches the literal `BRIDGE-DDDDD` pattern.
pub fn validate_invitation_code(code: &str) -> bool {
    CODE_PATTERN.is_match(code)
}

/// Deep-link invitation URL for a bot username and code.
pub fn invite_link(bot_username: &str, code: &str) -> String {
    format!("https://t.me/{bot_username}?start=invite_{code}")
}

/// Extracts the code from a `/start` deep-link argument (`invite_BRIDGE-DDDDD`).
pub fn code_from_start_arg(arg: &str) -> Option<&str> {
    let code = arg.strip_prefix("invite_")?;
    validate_invitation_code(code).then_some(code)
}

impl Relay {
    /// Generates a fresh `BRIDGE-DDDDD` code unique among active managers.
    ///
    /// Terminates within [`MAX_CODE_ATTEMPTS`] probes or fails with
    /// `CodeCollision`.
    pub async fn generate_invitation_code(&self) -> Result<String, BridgeError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let suffix: u32 = rand::thread_rng().gen_range(10000..100000);
            let code = format!("BRIDGE-{suffix}");
            if !managers::code_exists(self.store().pool(), &code).await? {
                return Ok(code);
            }
        }
        Err(BridgeError::CodeCollision {
            attempts: MAX_CODE_ATTEMPTS,
        })
    }

    /// Redeems an invitation code: registers the redeeming user as a worker
    /// and binds them to the code's manager on the receiving bot's slot,
    /// all in one transaction.
    pub async fn redeem_invitation(
        &self,
        worker_user_id: UserId,
        code: &str,
        bot_slot: BotSlot,
    ) -> Result<Connection, BridgeError> {
        if !validate_invitation_code(code) {
            return Err(BridgeError::InvalidCode(code.to_string()));
        }
        bridgeos_core::validate_slot(bot_slot)?;

        let code = code.to_string();
        let connection = self
            .store()
            .with_tx(move |tx| {
                Box::pin(async move {
                    let manager = managers::get_by_code(&mut **tx, &code)
                        .await?
                        .ok_or_else(|| BridgeError::InvalidCode(code.clone()))?;

                    workers::create(&mut **tx, worker_user_id).await?;
                    let connection_id = connections::bind(
                        &mut **tx,
                        manager.manager_id,
                        worker_user_id,
                        bot_slot,
                    )
                    .await?;

                    connections::get_by_id(&mut **tx, connection_id)
                        .await?
                        .ok_or_else(|| {
                            BridgeError::Internal(format!(
                                "connection {connection_id} vanished inside its own transaction"
                            ))
                        })
                })
            })
            .await?;

        info!(
            connection_id = connection.connection_id,
            manager_id = connection.manager_id,
            worker_id = connection.worker_id,
            bot_slot,
            "invitation redeemed"
        );
        Ok(connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_pattern_accepts_five_digits_only() {
        assert!(validate_invitation_code("BRIDGE-12345"));
        assert!(validate_invitation_code("BRIDGE-00000"));
        assert!(!validate_invitation_code("BRIDGE-1234"));
        assert!(!validate_invitation_code("BRIDGE-123456"));
        assert!(!validate_invitation_code("bridge-12345"));
        assert!(!validate_invitation_code("BRIDGE-1234a"));
        assert!(!validate_invitation_code(""));
        assert!(!validate_invitation_code("BRIDGE-12345 "));
    }

    #[test]
    fn invite_link_shape() {
        assert_eq!(
            invite_link("FarmTranslateBot", "BRIDGE-12345"),
            "https://t.me/FarmTranslateBot?start=invite_BRIDGE-12345"
        );
    }

    #[test]
    fn start_arg_extraction() {
        assert_eq!(
            code_from_start_arg("invite_BRIDGE-12345"),
            Some("BRIDGE-12345")
        );
        assert_eq!(code_from_start_arg("invite_BRIDGE-1"), None);
        assert_eq!(code_from_start_arg("BRIDGE-12345"), None);
        assert_eq!(code_from_start_arg(""), None);
    }
}
