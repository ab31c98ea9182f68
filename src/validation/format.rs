//! Redemption code and username format checks.

use once_cell::sync::Lazy;
use regex::Regex;

/// Redemption codes are 32 to 64 hex characters.
static CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-fA-F0-9]{32,64}$").expect("valid code pattern"));

/// Usernames are 3 to 16 ASCII letters, digits or underscores.
static USERNAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]{3,16}$").expect("valid username pattern"));

/// Check that a redemption code is pure hex with 32 to 64 characters.
///
/// The input is not trimmed; callers trim user input first.
pub fn is_valid_code_format(code: &str) -> bool {
    CODE_PATTERN.is_match(code)
}

/// Check that a username has 3 to 16 characters from `[a-zA-Z0-9_]`.
pub fn is_valid_username(name: &str) -> bool {
    USERNAME_PATTERN.is_match(name)
}
