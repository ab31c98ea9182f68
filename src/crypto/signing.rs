//! HMAC-SHA256 request signing.
//!
//! The signed message is the compact JSON serialization of a payload whose
//! field order is fixed by its type declaration. The server recomputes the
//! same bytes, so the serialization must never depend on map ordering.

use crate::GateError;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Serialize a payload to the canonical signing bytes.
///
/// Produces the same bytes as `JSON.stringify` for structs of strings and
/// integers: no whitespace, fields in declaration order.
pub fn canonical_bytes<T: Serialize>(payload: &T) -> Result<Vec<u8>, GateError> {
    serde_json::to_vec(payload)
        .map_err(|e| GateError::CryptoError(format!("Failed to canonicalize payload: {}", e)))
}

/// Compute the HMAC-SHA256 of raw bytes as lowercase hex.
pub fn hmac_sha256_hex(message: &[u8], secret: &[u8]) -> Result<String, GateError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| GateError::CryptoError(format!("Invalid HMAC key: {}", e)))?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Sign a payload with the shared secret.
///
/// Returns a 64-character lowercase hex digest. Deterministic for the same
/// payload and secret.
pub fn sign<T: Serialize>(payload: &T, secret: &[u8]) -> Result<String, GateError> {
    let bytes = canonical_bytes(payload)?;
    hmac_sha256_hex(&bytes, secret)
}

/// Recompute a payload signature and compare it in constant time.
///
/// Malformed or wrong-length signatures return `false`.
pub fn verify_signature<T: Serialize>(payload: &T, secret: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = sign(payload, secret) else {
        return false;
    };
    let Ok(provided) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(expected) = hex::decode(expected) else {
        return false;
    };
    expected.as_slice().ct_eq(provided.as_slice()).into()
}
