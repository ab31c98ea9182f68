//! Symmetric encryption of small secrets.
//!
//! Blob format: `<iv hex>:<ciphertext hex>`, where the ciphertext part is the
//! AES-256-CBC output followed by a 32-byte HMAC-SHA256 tag over
//! `iv || ciphertext`. The tag is checked before any decryption so a
//! tampered blob never yields plaintext.
//!
//! Keys come from scrypt (N=2^14, r=8, p=1) over the shared secret with a
//! fixed salt. The first 32 derived bytes are the cipher key, the next 32
//! the tag key.

use crate::GateError;
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use std::fmt;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// Fixed key-derivation salt.
const KDF_SALT: &[u8] = b"salt";

/// scrypt cost parameter as log2(N).
const KDF_LOG_N: u8 = 14;
const KDF_R: u32 = 8;
const KDF_P: u32 = 1;

const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;
const TAG_LEN: usize = 32;
const BLOCK_LEN: usize = 16;

/// Encryption context holding keys derived from one shared secret.
///
/// Key derivation is deliberately slow; build one `Vault` and reuse it when
/// encrypting or decrypting repeatedly.
pub struct Vault {
    cipher_key: [u8; KEY_LEN],
    tag_key: [u8; KEY_LEN],
}

impl fmt::Debug for Vault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vault").finish_non_exhaustive()
    }
}

impl Vault {
    /// Derive cipher and tag keys from a shared secret.
    pub fn new(secret: &[u8]) -> Result<Self, GateError> {
        let params = scrypt::Params::new(KDF_LOG_N, KDF_R, KDF_P, KEY_LEN * 2)
            .map_err(|e| GateError::CryptoError(format!("Invalid scrypt params: {}", e)))?;

        let mut derived = [0u8; KEY_LEN * 2];
        scrypt::scrypt(secret, KDF_SALT, &params, &mut derived)
            .map_err(|e| GateError::CryptoError(format!("Key derivation failed: {}", e)))?;

        let mut cipher_key = [0u8; KEY_LEN];
        let mut tag_key = [0u8; KEY_LEN];
        cipher_key.copy_from_slice(&derived[..KEY_LEN]);
        tag_key.copy_from_slice(&derived[KEY_LEN..]);

        Ok(Self {
            cipher_key,
            tag_key,
        })
    }

    /// Encrypt a UTF-8 string with a fresh random IV.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, GateError> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let ciphertext = Aes256CbcEnc::new_from_slices(&self.cipher_key, &iv)
            .map_err(|e| GateError::CryptoError(format!("Cipher init failed: {}", e)))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        let tag = self.tag(&iv, &ciphertext)?.finalize().into_bytes();

        let mut body = ciphertext;
        body.extend_from_slice(&tag);

        Ok(format!("{}:{}", hex::encode(iv), hex::encode(body)))
    }

    /// Decrypt a blob produced by [`Vault::encrypt`].
    ///
    /// # Errors
    /// `CryptoError` if the blob is malformed, the tag does not match, the
    /// padding is invalid or the plaintext is not UTF-8.
    pub fn decrypt(&self, blob: &str) -> Result<String, GateError> {
        let (iv_hex, body_hex) = blob
            .split_once(':')
            .ok_or_else(|| GateError::CryptoError("Malformed blob: missing separator".to_string()))?;

        let iv = hex::decode(iv_hex)
            .map_err(|e| GateError::CryptoError(format!("Malformed blob IV: {}", e)))?;
        if iv.len() != IV_LEN {
            return Err(GateError::CryptoError(format!(
                "Malformed blob: IV must be {} bytes, got {}",
                IV_LEN,
                iv.len()
            )));
        }

        let body = hex::decode(body_hex)
            .map_err(|e| GateError::CryptoError(format!("Malformed blob body: {}", e)))?;
        if body.len() < BLOCK_LEN + TAG_LEN || (body.len() - TAG_LEN) % BLOCK_LEN != 0 {
            return Err(GateError::CryptoError(
                "Malformed blob: ciphertext length".to_string(),
            ));
        }

        let (ciphertext, tag) = body.split_at(body.len() - TAG_LEN);
        self.tag(&iv, ciphertext)?
            .verify_slice(tag)
            .map_err(|_| GateError::CryptoError("Blob authentication failed".to_string()))?;

        let plaintext = Aes256CbcDec::new_from_slices(&self.cipher_key, &iv)
            .map_err(|e| GateError::CryptoError(format!("Cipher init failed: {}", e)))?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| GateError::CryptoError("Invalid padding".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| GateError::CryptoError("Decrypted data is not UTF-8".to_string()))
    }

    fn tag(&self, iv: &[u8], ciphertext: &[u8]) -> Result<HmacSha256, GateError> {
        let mut mac = HmacSha256::new_from_slice(&self.tag_key)
            .map_err(|e| GateError::CryptoError(format!("Invalid tag key: {}", e)))?;
        mac.update(iv);
        mac.update(ciphertext);
        Ok(mac)
    }
}

/// Encrypt `plaintext` under `secret`.
///
/// Derives keys on every call; prefer [`Vault`] for repeated use.
pub fn encrypt(plaintext: &str, secret: &[u8]) -> Result<String, GateError> {
    Vault::new(secret)?.encrypt(plaintext)
}

/// Decrypt a blob produced by [`encrypt`] with the same `secret`.
pub fn decrypt(blob: &str, secret: &[u8]) -> Result<String, GateError> {
    Vault::new(secret)?.decrypt(blob)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"f2e1d0c9b8a7f6e5d4c3b2a1f0e9d8c7";

    fn flip_hex_char(blob: &str, index: usize) -> String {
        let mut chars: Vec<char> = blob.chars().collect();
        chars[index] = if chars[index] == '0' { '1' } else { '0' };
        chars.into_iter().collect()
    }

    #[test]
    fn test_roundtrip() {
        let vault = Vault::new(SECRET).unwrap();
        let long = "x".repeat(1000);
        for text in ["", "hello", "p@ssw0rd with spaces", "ünïcødé ✓", long.as_str()] {
            let blob = vault.encrypt(text).unwrap();
            assert_eq!(vault.decrypt(&blob).unwrap(), text);
        }
    }

    #[test]
    fn test_free_function_roundtrip() {
        let blob = encrypt("session-token", SECRET).unwrap();
        assert_eq!(decrypt(&blob, SECRET).unwrap(), "session-token");
    }

    #[test]
    fn test_blob_shape() {
        let vault = Vault::new(SECRET).unwrap();
        let blob = vault.encrypt("hello").unwrap();
        let (iv, body) = blob.split_once(':').unwrap();

        assert_eq!(iv.len(), IV_LEN * 2);
        // one padded block plus tag
        assert_eq!(body.len(), (BLOCK_LEN + TAG_LEN) * 2);
    }

    #[test]
    fn test_fresh_iv_per_call() {
        let vault = Vault::new(SECRET).unwrap();
        let a = vault.encrypt("same").unwrap();
        let b = vault.encrypt("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_every_flipped_character_fails() {
        let vault = Vault::new(SECRET).unwrap();
        let blob = vault.encrypt("do not tamper").unwrap();

        for index in 0..blob.len() {
            if blob.as_bytes()[index] == b':' {
                continue;
            }
            let tampered = flip_hex_char(&blob, index);
            assert!(
                matches!(vault.decrypt(&tampered), Err(GateError::CryptoError(_))),
                "flip at {} was accepted",
                index
            );
        }
    }

    #[test]
    fn test_wrong_secret_fails() {
        let blob = encrypt("hello", SECRET).unwrap();
        assert!(decrypt(&blob, b"a-completely-different-secret!!!").is_err());
    }

    #[test]
    fn test_malformed_blobs() {
        let vault = Vault::new(SECRET).unwrap();
        for blob in ["", "nocolon", "zz:00", "00:00", "0011:", ":abcd"] {
            assert!(
                matches!(vault.decrypt(blob), Err(GateError::CryptoError(_))),
                "{:?} was accepted",
                blob
            );
        }
    }

    #[test]
    fn test_debug_hides_keys() {
        let vault = Vault::new(SECRET).unwrap();
        let debug = format!("{:?}", vault);
        assert_eq!(debug, "Vault { .. }");
    }
}
