//! Instance access decisions.
//!
//! An instance is usable when any of these hold:
//! - its whitelist is inactive (open instance)
//! - the username is on its whitelist
//! - the user has redeemed a grant for it
//!
//! Membership checks are exact and case-sensitive. Without a username only
//! open instances are usable.

use crate::protocol::models::Instance;
use crate::store::grants::Grant;

/// Why access was allowed or denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Instance has no active whitelist.
    Open,
    /// Username is on the whitelist.
    Whitelisted,
    /// User redeemed a code for this instance.
    Granted,
    /// None of the above.
    Denied,
}

impl AccessDecision {
    /// Whether the decision allows access.
    pub fn is_allowed(self) -> bool {
        !matches!(self, AccessDecision::Denied)
    }
}

/// Evaluate access with the reason.
///
/// A grant recorded for a different username than `username` is ignored.
pub fn evaluate(instance: &Instance, username: Option<&str>, grant: Option<&Grant>) -> AccessDecision {
    if !instance.whitelist_active {
        return AccessDecision::Open;
    }

    let Some(username) = username.filter(|u| !u.is_empty()) else {
        return AccessDecision::Denied;
    };

    if instance.whitelist.contains(username) {
        return AccessDecision::Whitelisted;
    }

    match grant {
        Some(grant) if grant.username() == username && grant.contains(&instance.name) => {
            AccessDecision::Granted
        }
        _ => AccessDecision::Denied,
    }
}

/// Decide whether `username` may use `instance`.
pub fn has_access(instance: &Instance, username: Option<&str>, grant: Option<&Grant>) -> bool {
    evaluate(instance, username, grant).is_allowed()
}

/// Instances `username` may use, in list order.
pub fn visible_instances<'a>(
    instances: &'a [Instance],
    username: Option<&str>,
    grant: Option<&Grant>,
) -> Vec<&'a Instance> {
    instances
        .iter()
        .filter(|instance| has_access(instance, username, grant))
        .collect()
}

/// Pick the instance to select after login or a grant change.
///
/// Keeps `saved` when it still exists and is accessible; otherwise falls back
/// to the first open instance. Returns `None` when neither exists.
pub fn resolve_selection<'a>(
    instances: &'a [Instance],
    saved: Option<&str>,
    username: Option<&str>,
    grant: Option<&Grant>,
) -> Option<&'a Instance> {
    let saved = saved.and_then(|name| instances.iter().find(|i| i.name == name));

    if let Some(instance) = saved {
        if has_access(instance, username, grant) {
            return Some(instance);
        }
    }

    instances.iter().find(|i| !i.whitelist_active)
}
