// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HMAC-SHA-256 signature validation for billing webhooks.
//!
//! The provider signs the raw request body with a shared secret and sends
//! the hex digest in the `X-Signature` header. Comparison is constant-time
//! and the secret is wrapped in `SecretString` so it cannot be logged by
//! accident.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Why verification failed. Both cases answer 401 without side effects.
#[derive(Debug, PartialEq, Eq)]
pub enum SignatureError {
    /// The header was missing or not valid hex.
    Malformed,
    /// The digest did not match the computed HMAC.
    Mismatch,
}

/// Validator holding the shared webhook secret.
#[derive(Clone)]
pub struct SignatureValidator {
    secret: SecretString,
}

impl SignatureValidator {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Verifies the hex HMAC-SHA-256 tag over the raw body.
    pub fn verify(&self, payload: &[u8], signature_hex: &str) -> Result<(), SignatureError> {
        let expected = hex::decode(signature_hex.trim()).map_err(|_| SignatureError::Malformed)?;
        let computed = self.compute(payload);

        if computed.ct_eq(&expected).into() {
            Ok(())
        } else {
            tracing::warn!("webhook signature verification failed");
            Err(SignatureError::Mismatch)
        }
    }

    fn compute(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts keys of any size");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}
