//! Instance gate error types.

use thiserror::Error;

/// Errors that can occur while checking access or redeeming codes.
#[derive(Debug, Error)]
pub enum GateError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Code or username is malformed. Never reaches the network.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Rate limit hit for this identifier.
    #[error("Too many attempts, retry in {retry_after_seconds}s")]
    Throttled {
        /// Seconds until the current window closes.
        retry_after_seconds: u64,
    },

    /// HTTP transport or timeout failure. Safe to retry.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server explicitly refused the code.
    #[error("Code rejected: {message}")]
    Rejected {
        /// Human-readable reason from the server.
        message: String,
    },

    /// Server response did not match the expected schema.
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// Server timestamp outside the freshness window.
    #[error("Server response timestamp is {skew_seconds}s away from local time")]
    StaleResponse {
        /// Absolute difference between local and server time.
        skew_seconds: i64,
    },

    /// Local grant storage failed.
    ///
    /// When `instance` is set the server already approved the code; the
    /// entitlement exists but this device did not record it.
    #[error("Grant storage error: {reason}")]
    Persistence {
        /// Instance that was being recorded, if any.
        instance: Option<String>,
        /// Underlying failure.
        reason: String,
    },

    /// Signing, encryption or decryption failed.
    #[error("Crypto error: {0}")]
    CryptoError(String),
}

impl GateError {
    /// Build a storage error that is not tied to a specific grant.
    pub fn storage(reason: impl Into<String>) -> Self {
        GateError::Persistence {
            instance: None,
            reason: reason.into(),
        }
    }

    /// Whether repeating the same redemption may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GateError::NetworkError(_)
                | GateError::Persistence { .. }
                | GateError::Throttled { .. }
                | GateError::StaleResponse { .. }
        )
    }

    /// Message suitable for showing to the end user.
    ///
    /// Each kind maps to a distinct message; internal details such as
    /// transport errors are left out.
    pub fn user_message(&self) -> String {
        match self {
            GateError::ConfigError(_) => "The launcher is misconfigured.".to_string(),
            GateError::InvalidFormat(_) => "The code format is invalid.".to_string(),
            GateError::Throttled {
                retry_after_seconds,
            } => format!(
                "Too many attempts. Try again in {} seconds.",
                retry_after_seconds
            ),
            GateError::NetworkError(_) => "Could not reach the server.".to_string(),
            GateError::Rejected { message } => message.clone(),
            GateError::ProtocolError(_) => "The server sent an unexpected response.".to_string(),
            GateError::StaleResponse { .. } => {
                "The server response is out of date. Check your system clock.".to_string()
            }
            GateError::Persistence {
                instance: Some(instance),
                ..
            } => format!(
                "Access to {} was granted but could not be saved. Redeem the code again.",
                instance
            ),
            GateError::Persistence { instance: None, .. } => {
                "Local access data could not be read or written.".to_string()
            }
            GateError::CryptoError(_) => "A security operation failed.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttled_message_shows_wait() {
        let err = GateError::Throttled {
            retry_after_seconds: 42,
        };
        assert!(err.user_message().contains("42"));
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_user_messages_are_distinct() {
        let errors = vec![
            GateError::ConfigError("x".into()),
            GateError::InvalidFormat("x".into()),
            GateError::Throttled {
                retry_after_seconds: 1,
            },
            GateError::NetworkError("x".into()),
            GateError::Rejected {
                message: "Code already used".into(),
            },
            GateError::ProtocolError("x".into()),
            GateError::StaleResponse { skew_seconds: 900 },
            GateError::Persistence {
                instance: Some("survival".into()),
                reason: "x".into(),
            },
            GateError::storage("x"),
            GateError::CryptoError("x".into()),
        ];

        let messages: std::collections::HashSet<String> =
            errors.iter().map(GateError::user_message).collect();
        assert_eq!(messages.len(), errors.len());
    }

    #[test]
    fn test_persistence_after_grant_names_instance() {
        let err = GateError::Persistence {
            instance: Some("survival".into()),
            reason: "disk full".into(),
        };
        assert!(err.user_message().contains("survival"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_rejected_not_retryable() {
        let err = GateError::Rejected {
            message: "nope".into(),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.user_message(), "nope");
    }
}
