//! Deterministic instance codes derived from the shared secret.
//!
//! A code is the SHA-256 hex of `<instance>:<salt or expiry>:<secret>`, so
//! it is 64 hex characters and always passes the redemption format check.
//! These are issued out of band by an administrator and redeemed through
//! the server; the client only needs them for local tooling and tests.

use crate::clock::Clock;
use crate::validation::is_valid_code_format;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Default lifetime of a temporary code (30 days) in milliseconds.
pub const DEFAULT_CODE_LIFETIME_MS: i64 = 30 * 24 * 60 * 60 * 1000;

/// A time-limited code bound to one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporaryCode {
    /// 64-character hex code.
    pub code: String,
    /// Expiry as unix milliseconds.
    pub expiry: i64,
    /// Instance the code unlocks.
    pub instance: String,
}

fn derive_code(instance_name: &str, middle: &str, secret: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(instance_name.as_bytes());
    hasher.update(b":");
    hasher.update(middle.as_bytes());
    hasher.update(b":");
    hasher.update(secret);
    hex::encode(hasher.finalize())
}

/// Generate the permanent code for an instance.
pub fn generate_instance_code(instance_name: &str, salt: &str, secret: &[u8]) -> String {
    derive_code(instance_name, salt, secret)
}

/// Generate a code that expires at `expiry_ms`, or 30 days from now.
pub fn generate_temporary_code<C: Clock + ?Sized>(
    instance_name: &str,
    expiry_ms: Option<i64>,
    secret: &[u8],
    clock: &C,
) -> TemporaryCode {
    let expiry =
        expiry_ms.unwrap_or_else(|| clock.now_unix_millis().saturating_add(DEFAULT_CODE_LIFETIME_MS));

    TemporaryCode {
        code: derive_code(instance_name, &expiry.to_string(), secret),
        expiry,
        instance: instance_name.to_string(),
    }
}

/// Check a temporary code against its instance and expiry.
///
/// Returns `false` for malformed codes, expired codes and codes derived for
/// a different instance, expiry or secret.
pub fn validate_temporary_code<C: Clock + ?Sized>(
    code: &str,
    instance_name: &str,
    expiry_ms: i64,
    secret: &[u8],
    clock: &C,
) -> bool {
    if !is_valid_code_format(code) {
        return false;
    }
    if clock.now_unix_millis() > expiry_ms {
        return false;
    }

    let expected = derive_code(instance_name, &expiry_ms.to_string(), secret);
    expected.as_bytes().ct_eq(code.as_bytes()).into()
}
