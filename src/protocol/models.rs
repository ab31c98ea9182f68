//! Redemption wire types and instance definitions.
//!
//! The server contract is a single schema. Anything that does not fit it is
//! a `ProtocolError`; no alternative field names are tried.

use crate::crypto::signing::sign;
use crate::GateError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An independently access-controlled content bundle.
///
/// Supplied by the instance configuration collaborator; extra fields in its
/// payload (loader, status, URLs) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    /// Unique instance name.
    pub name: String,

    /// Whether access is restricted.
    pub whitelist_active: bool,

    /// Usernames always allowed when the whitelist is active.
    #[serde(default)]
    pub whitelist: BTreeSet<String>,
}

impl Instance {
    /// An instance anyone can use.
    pub fn open(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            whitelist_active: false,
            whitelist: BTreeSet::new(),
        }
    }

    /// A restricted instance with the given whitelist.
    pub fn restricted<I, S>(name: impl Into<String>, whitelist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            whitelist_active: true,
            whitelist: whitelist.into_iter().map(Into::into).collect(),
        }
    }
}

/// Parse the instance list published by the configuration collaborator.
pub fn parse_instance_list(json: &str) -> Result<Vec<Instance>, GateError> {
    serde_json::from_str(json)
        .map_err(|e| GateError::ProtocolError(format!("Invalid instance list: {}", e)))
}

/// The signed portion of a redemption request.
///
/// Field order is part of the signature contract: `code`, `username`,
/// `timestamp`.
#[derive(Debug, Clone, Serialize)]
pub struct RequestPayload<'a> {
    /// Redemption code as entered (trimmed).
    pub code: &'a str,
    /// Requesting username.
    pub username: &'a str,
    /// Unix seconds at construction.
    pub timestamp: i64,
}

/// Redemption request body as sent to the server.
#[derive(Clone, Serialize)]
pub struct SignedRequest {
    /// Redemption code.
    pub code: String,
    /// Requesting username.
    pub username: String,
    /// Unix seconds at construction.
    pub timestamp: i64,
    /// HMAC-SHA256 hex over the [`RequestPayload`].
    pub signature: String,
}

impl std::fmt::Debug for SignedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedRequest")
            .field("code", &"<redacted>")
            .field("username", &self.username)
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}

impl SignedRequest {
    /// Build and sign a request.
    pub fn new(
        code: &str,
        username: &str,
        timestamp: i64,
        secret: &[u8],
    ) -> Result<Self, GateError> {
        let signature = sign(
            &RequestPayload {
                code,
                username,
                timestamp,
            },
            secret,
        )?;

        Ok(Self {
            code: code.to_string(),
            username: username.to_string(),
            timestamp,
            signature,
        })
    }

    /// The payload this request's signature covers.
    pub fn payload(&self) -> RequestPayload<'_> {
        RequestPayload {
            code: &self.code,
            username: &self.username,
            timestamp: self.timestamp,
        }
    }

    /// Serialize the request body.
    pub fn to_json(&self) -> Result<Vec<u8>, GateError> {
        serde_json::to_vec(self)
            .map_err(|e| GateError::ProtocolError(format!("Failed to serialize request: {}", e)))
    }
}

/// Raw redemption endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionResponse {
    /// Whether the server accepted the code.
    pub success: bool,
    /// Unlocked instance name (required on success).
    #[serde(default)]
    pub instance: Option<String>,
    /// Human-friendly instance name.
    #[serde(default)]
    pub instance_display: Option<String>,
    /// Rejection reason.
    #[serde(default)]
    pub message: Option<String>,
    /// Server time in unix seconds, checked for freshness when present.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// Default rejection message when the server gives none.
pub const DEFAULT_REJECTION_MESSAGE: &str = "Invalid code";

impl RedemptionResponse {
    /// Parse a response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, GateError> {
        serde_json::from_slice(body)
            .map_err(|e| GateError::ProtocolError(format!("Invalid redemption response: {}", e)))
    }

    /// Convert to a grant or a rejection.
    ///
    /// # Errors
    /// * `Rejected` - `success` is false
    /// * `ProtocolError` - `success` is true but no instance name was sent
    pub fn into_redemption(self) -> Result<Redemption, GateError> {
        if !self.success {
            let message = self
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REJECTION_MESSAGE.to_string());
            return Err(GateError::Rejected { message });
        }

        let instance = self
            .instance
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .ok_or_else(|| {
                GateError::ProtocolError("Successful response without instance".to_string())
            })?;

        Ok(Redemption {
            instance,
            instance_display: self.instance_display.filter(|d| !d.trim().is_empty()),
        })
    }
}

/// A successful redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redemption {
    /// Unlocked instance name.
    pub instance: String,
    /// Display name, if the server sent one.
    pub instance_display: Option<String>,
}

impl Redemption {
    /// Name to show the user.
    pub fn display_name(&self) -> &str {
        self.instance_display.as_deref().unwrap_or(&self.instance)
    }
}
