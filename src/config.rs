//! Instance gate configuration.

use crate::meter::rate_limit::RateLimitPolicy;
use crate::validation::{is_valid_file_path, is_valid_url};
use crate::GateError;
use std::fmt;
use std::time::Duration;

/// Environment variable holding the shared secret.
pub const SECRET_ENV_VAR: &str = "INSTANCE_GATE_SECRET";

/// Minimum shared secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Default bound on one redemption request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for access checks and code redemption.
///
/// The shared secret never appears in `Debug` output.
#[derive(Clone)]
pub struct GateConfig {
    /// Application name and version, sent in the User-Agent (e.g., "launcher/1.4.2").
    pub app_name: String,

    /// Redemption endpoint URL. Must pass [`is_valid_url`].
    pub endpoint_url: String,

    /// HMAC secret shared with the redemption server.
    /// SECURITY: never logged and never sent over the wire.
    pub shared_secret: String,

    /// Directory name under the platform data dir for grant storage.
    pub storage_namespace: String,

    /// Attempt budget per username for redemption.
    pub rate_limit: RateLimitPolicy,

    /// Bound on one HTTP round trip.
    pub request_timeout: Duration,
}

impl fmt::Debug for GateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateConfig")
            .field("app_name", &self.app_name)
            .field("endpoint_url", &self.endpoint_url)
            .field("shared_secret", &"<redacted>")
            .field("storage_namespace", &self.storage_namespace)
            .field("rate_limit", &self.rate_limit)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl GateConfig {
    /// Build a config with the default rate limit (3 per 5 minutes) and a
    /// 10 second request timeout.
    pub fn new(
        app_name: impl Into<String>,
        endpoint_url: impl Into<String>,
        shared_secret: impl Into<String>,
        storage_namespace: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            endpoint_url: endpoint_url.into(),
            shared_secret: shared_secret.into(),
            storage_namespace: storage_namespace.into(),
            rate_limit: RateLimitPolicy::REDEMPTION,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Build a config reading the secret from [`SECRET_ENV_VAR`].
    ///
    /// There is no built-in fallback secret; a missing variable is an error.
    pub fn from_env(
        app_name: impl Into<String>,
        endpoint_url: impl Into<String>,
        storage_namespace: impl Into<String>,
    ) -> Result<Self, GateError> {
        Self::from_env_var(SECRET_ENV_VAR, app_name, endpoint_url, storage_namespace)
    }

    fn from_env_var(
        var: &str,
        app_name: impl Into<String>,
        endpoint_url: impl Into<String>,
        storage_namespace: impl Into<String>,
    ) -> Result<Self, GateError> {
        let secret = std::env::var(var)
            .map_err(|_| GateError::ConfigError(format!("{} is not set", var)))?;
        Ok(Self::new(app_name, endpoint_url, secret, storage_namespace))
    }

    /// Secret bytes used as the HMAC and encryption key.
    pub fn secret_bytes(&self) -> &[u8] {
        self.shared_secret.as_bytes()
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), GateError> {
        if !is_valid_url(&self.endpoint_url) {
            return Err(GateError::ConfigError(format!(
                "endpoint_url is not an allowed http(s) URL: {}",
                self.endpoint_url
            )));
        }
        if self.shared_secret.len() < MIN_SECRET_LEN {
            return Err(GateError::ConfigError(format!(
                "shared_secret must be at least {} bytes, got {}",
                MIN_SECRET_LEN,
                self.shared_secret.len()
            )));
        }
        if !is_valid_file_path(&self.storage_namespace) {
            return Err(GateError::ConfigError(format!(
                "storage_namespace must be a relative path: {}",
                self.storage_namespace
            )));
        }
        if self.rate_limit.max_attempts == 0 {
            return Err(GateError::ConfigError(
                "rate_limit.max_attempts must be greater than zero".to_string(),
            ));
        }
        if self.rate_limit.window.is_zero() {
            return Err(GateError::ConfigError(
                "rate_limit.window must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(GateError::ConfigError(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
