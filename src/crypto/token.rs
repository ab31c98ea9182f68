//! Secure random tokens.

use rand::rngs::OsRng;
use rand::RngCore;

/// Default token length in bytes.
pub const DEFAULT_TOKEN_BYTES: usize = 32;

/// Generate `byte_len` bytes from the OS CSPRNG, hex-encoded.
///
/// The result has `2 * byte_len` characters.
pub fn generate_secure_token(byte_len: usize) -> String {
    let mut bytes = vec![0u8; byte_len];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
