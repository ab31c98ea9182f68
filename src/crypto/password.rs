//! PBKDF2 password records.
//!
//! Record format: `<salt hex>:<hash hex>`. The salt is 16 random bytes; the
//! hex text of the salt (not the raw bytes) is fed to PBKDF2, matching
//! records already stored by the launcher.

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha512;
use subtle::ConstantTimeEq;

/// PBKDF2-HMAC-SHA512 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 10_000;

/// Random salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Derived hash length in bytes.
pub const HASH_LEN: usize = 64;

fn derive(password: &str, salt_hex: &str) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    pbkdf2::pbkdf2_hmac::<Sha512>(
        password.as_bytes(),
        salt_hex.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut out,
    );
    out
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let salt_hex = hex::encode(salt);

    let hash = derive(password, &salt_hex);
    format!("{}:{}", salt_hex, hex::encode(hash))
}

/// Check a password against a stored record.
///
/// Any malformed record yields `false`.
pub fn verify_password(password: &str, record: &str) -> bool {
    let Some((salt_hex, hash_hex)) = record.split_once(':') else {
        return false;
    };
    if salt_hex.is_empty() || hex::decode(salt_hex).is_err() {
        return false;
    }
    let Ok(stored) = hex::decode(hash_hex) else {
        return false;
    };
    if stored.len() != HASH_LEN {
        return false;
    }

    let computed = derive(password, salt_hex);
    computed[..].ct_eq(&stored[..]).into()
}
