//! SHA-256 content digests for download integrity checks.

use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::warn;

/// Compute the SHA-256 of `bytes` as lowercase hex.
pub fn file_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Compare the SHA-256 of `bytes` against an expected hex digest.
///
/// The full 64-character digest must match; hex case is ignored. An empty
/// or truncated expectation never matches.
pub fn verify_file_integrity(bytes: &[u8], expected_hash_hex: &str) -> bool {
    let computed = file_hash(bytes);
    computed.eq_ignore_ascii_case(expected_hash_hex.trim())
}

/// Read a file and verify its digest.
///
/// Read errors are logged and reported as a mismatch.
pub fn verify_file_at_path(path: &Path, expected_hash_hex: &str) -> bool {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "integrity check could not read file");
            return false;
        }
    };

    let ok = verify_file_integrity(&bytes, expected_hash_hex);
    if !ok {
        warn!(path = %path.display(), "integrity check failed: digest mismatch");
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn test_hash_empty() {
        assert_eq!(file_hash(b""), EMPTY_SHA256);
    }

    #[test]
    fn test_hash_abc() {
        assert_eq!(file_hash(b"abc"), ABC_SHA256);
    }

    #[test]
    fn test_verify_matches() {
        assert!(verify_file_integrity(b"abc", ABC_SHA256));
        assert!(verify_file_integrity(b"abc", &ABC_SHA256.to_uppercase()));
    }

    #[test]
    fn test_verify_mismatch() {
        assert!(!verify_file_integrity(b"abd", ABC_SHA256));
        assert!(!verify_file_integrity(b"abc", &ABC_SHA256[..63]));
        assert!(!verify_file_integrity(b"abc", ""));
    }

    #[test]
    fn test_verify_file_at_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("client.jar");
        std::fs::write(&path, b"abc").unwrap();

        assert!(verify_file_at_path(&path, ABC_SHA256));
        assert!(!verify_file_at_path(&path, EMPTY_SHA256));
    }

    #[test]
    fn test_verify_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(!verify_file_at_path(&dir.path().join("missing.jar"), EMPTY_SHA256));
    }
}
