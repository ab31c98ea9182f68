//! Relative path checks against traversal.
//!
//! This is a first-line filter on locally supplied paths, not a
//! canonicalization.

use once_cell::sync::Lazy;
use regex::Regex;

static DRIVE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z]:[\\/]").expect("valid drive pattern"));

/// Check that a path is relative and free of traversal markers.
///
/// Rejects empty input, `..`, `~`, a leading `/` and Windows drive prefixes.
pub fn is_valid_file_path(path: &str) -> bool {
    if path.is_empty() {
        return false;
    }

    if path.contains("..") || path.contains('~') {
        return false;
    }

    if path.starts_with('/') || DRIVE_PREFIX.is_match(path) {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_paths_allowed() {
        assert!(is_valid_file_path("instances/survival/mods"));
        assert!(is_valid_file_path("config.json"));
        assert!(is_valid_file_path("./assets/logo.png"));
    }

    #[test]
    fn test_traversal_rejected() {
        assert!(!is_valid_file_path("../secret"));
        assert!(!is_valid_file_path("mods/../../etc/passwd"));
        assert!(!is_valid_file_path("~/.ssh/id_rsa"));
    }

    #[test]
    fn test_absolute_rejected() {
        assert!(!is_valid_file_path("/etc/passwd"));
        assert!(!is_valid_file_path("C:\\Windows\\System32"));
        assert!(!is_valid_file_path("d:/games"));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(!is_valid_file_path(""));
    }
}
