//! Lexical URL checks against server-side request forgery.
//!
//! This inspects the hostname string only. A public name that resolves to a
//! private address passes; callers that need real SSRF protection must
//! resolve the host and check the address at connection time.

use url::Url;

/// Hostnames rejected outright.
const BLOCKED_HOSTS: &[&str] = &["localhost", "127.0.0.1"];

/// Hostname prefixes of private IPv4 ranges.
///
/// `172.` covers the whole first octet, not only 172.16.0.0/12.
const BLOCKED_PREFIXES: &[&str] = &["10.", "172.", "192.168."];

/// Check that a URL uses http(s) and does not point at a local or private host.
pub fn is_valid_url(input: &str) -> bool {
    let Ok(parsed) = Url::parse(input) else {
        return false;
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }

    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();

    if BLOCKED_HOSTS.contains(&host.as_str()) {
        return false;
    }

    !BLOCKED_PREFIXES.iter().any(|prefix| host.starts_with(prefix))
}
