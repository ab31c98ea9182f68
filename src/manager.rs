//! Redemption manager - the main public API for instance-gate.
//!
//! The `RedemptionManager` ties the pieces together:
//! - Rate limiting per username
//! - Format validation before anything leaves the process
//! - Signed submission to the redemption endpoint
//! - Grant persistence and access checks against stored grants

use crate::client::http::{RedemptionClient, RedemptionTransport};
use crate::clock::{Clock, SystemClock};
use crate::config::GateConfig;
use crate::crypto::freshness::{check_timestamp_freshness, MAX_RESPONSE_SKEW_SECONDS};
use crate::meter::rate_limit::RateLimiter;
use crate::policy::access;
use crate::protocol::models::{Instance, Redemption, SignedRequest};
use crate::store::grants::{Grant, GrantStore};
use crate::validation::{is_valid_code_format, is_valid_username};
use crate::GateError;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Phase of a redemption attempt, used in log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedemptionPhase {
    /// Checking the rate limit and input formats.
    Validating,
    /// Building and signing the request.
    Signing,
    /// Waiting on the endpoint.
    Submitting,
    /// Server approved and the grant was recorded.
    Granted,
    /// Server refused the code.
    Rejected,
    /// Attempt budget exhausted.
    Throttled,
    /// Transport failed.
    NetworkError,
}

impl fmt::Display for RedemptionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RedemptionPhase::Validating => "validating",
            RedemptionPhase::Signing => "signing",
            RedemptionPhase::Submitting => "submitting",
            RedemptionPhase::Granted => "granted",
            RedemptionPhase::Rejected => "rejected",
            RedemptionPhase::Throttled => "throttled",
            RedemptionPhase::NetworkError => "network_error",
        };
        f.write_str(name)
    }
}

/// Main entry point for access checks and code redemption.
///
/// Create one per application and share it (it is `Send + Sync`).
pub struct RedemptionManager {
    config: GateConfig,
    clock: Arc<dyn Clock>,
    limiter: RateLimiter,
    transport: Box<dyn RedemptionTransport>,
    grants: GrantStore,
}

impl RedemptionManager {
    /// Create a manager with the system clock, the HTTP client and grant
    /// storage under the platform data directory.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Configuration validation fails
    /// - HTTP client creation fails
    /// - The grant file exists but cannot be read
    pub fn new(config: GateConfig) -> Result<Self, GateError> {
        config.validate()?;
        let transport = RedemptionClient::new(&config)?;
        let grants = GrantStore::open(&config.storage_namespace)?;
        Self::with_components(config, Arc::new(SystemClock), Box::new(transport), grants)
    }

    /// Create a manager from explicit parts.
    ///
    /// Used by tests and by embedders with their own transport.
    pub fn with_components(
        config: GateConfig,
        clock: Arc<dyn Clock>,
        transport: Box<dyn RedemptionTransport>,
        grants: GrantStore,
    ) -> Result<Self, GateError> {
        config.validate()?;
        let limiter = RateLimiter::new(clock.clone());

        Ok(Self {
            config,
            clock,
            limiter,
            transport,
            grants,
        })
    }

    /// Redeem `code` on behalf of `username`.
    ///
    /// Every call counts against the username's attempt budget, including
    /// calls that then fail format validation.
    ///
    /// # Errors
    /// - `Throttled` - attempt budget exhausted for this username
    /// - `InvalidFormat` - code or username malformed (no network call)
    /// - `NetworkError` - transport failure or timeout
    /// - `Rejected` - server refused the code
    /// - `ProtocolError` - response did not match the schema
    /// - `StaleResponse` - server timestamp outside the freshness window
    /// - `Persistence` - server approved but the grant could not be saved
    pub fn redeem(&self, code: &str, username: &str) -> Result<Redemption, GateError> {
        self.enter(RedemptionPhase::Validating, username);

        let decision = self
            .limiter
            .check_policy(&limiter_key(username), &self.config.rate_limit);
        if !decision.allowed {
            let retry_after_seconds = decision.retry_after_seconds.unwrap_or_default();
            self.enter(RedemptionPhase::Throttled, username);
            return Err(GateError::Throttled {
                retry_after_seconds,
            });
        }

        let code = code.trim();
        if code.is_empty() {
            return Err(GateError::InvalidFormat("Code is empty".to_string()));
        }
        if !is_valid_code_format(code) {
            return Err(GateError::InvalidFormat(
                "Code must be 32 to 64 hex characters".to_string(),
            ));
        }
        if !is_valid_username(username) {
            return Err(GateError::InvalidFormat(
                "Username must be 3 to 16 letters, digits or underscores".to_string(),
            ));
        }

        self.enter(RedemptionPhase::Signing, username);
        let request = SignedRequest::new(
            code,
            username,
            self.clock.now_unix_seconds(),
            self.config.secret_bytes(),
        )?;

        self.enter(RedemptionPhase::Submitting, username);
        debug!(
            username = %username,
            code = %code_fingerprint(code),
            timestamp = request.timestamp,
            "submitting redemption"
        );

        let response = match self.transport.submit(&request) {
            Ok(response) => response,
            Err(e) => {
                if matches!(e, GateError::NetworkError(_)) {
                    self.enter(RedemptionPhase::NetworkError, username);
                }
                return Err(e);
            }
        };

        if let Some(server_timestamp) = response.timestamp {
            check_timestamp_freshness(
                server_timestamp,
                MAX_RESPONSE_SKEW_SECONDS,
                self.clock.as_ref(),
            )?;
        }

        let redemption = match response.into_redemption() {
            Ok(redemption) => redemption,
            Err(e) => {
                if matches!(e, GateError::Rejected { .. }) {
                    self.enter(RedemptionPhase::Rejected, username);
                }
                return Err(e);
            }
        };

        if let Err(e) = self.grants.add_grant(username, &redemption.instance) {
            warn!(
                username = %username,
                instance = %redemption.instance,
                error = %e,
                "server approved code but grant was not saved"
            );
            return Err(e);
        }

        self.enter(RedemptionPhase::Granted, username);
        info!(
            username = %username,
            instance = %redemption.instance,
            "code redeemed"
        );

        Ok(redemption)
    }

    /// Decide whether `username` may use `instance`, using stored grants.
    pub fn has_access(&self, instance: &Instance, username: Option<&str>) -> bool {
        let grant = self.grant_for(username);
        access::has_access(instance, username, grant.as_ref())
    }

    /// Instances `username` may use, in list order.
    pub fn visible_instances<'a>(
        &self,
        instances: &'a [Instance],
        username: Option<&str>,
    ) -> Vec<&'a Instance> {
        let grant = self.grant_for(username);
        access::visible_instances(instances, username, grant.as_ref())
    }

    /// Instance to select for `username`, keeping `saved` when still usable.
    pub fn resolve_selection<'a>(
        &self,
        instances: &'a [Instance],
        saved: Option<&str>,
        username: Option<&str>,
    ) -> Option<&'a Instance> {
        let grant = self.grant_for(username);
        access::resolve_selection(instances, saved, username, grant.as_ref())
    }

    /// Stored grants.
    pub fn grants(&self) -> &GrantStore {
        &self.grants
    }

    /// Attempt limiter guarding `redeem`.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Get the current configuration.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    fn grant_for(&self, username: Option<&str>) -> Option<Grant> {
        username
            .filter(|u| !u.is_empty())
            .map(|u| self.grants.grant_for(u))
    }

    fn enter(&self, phase: RedemptionPhase, username: &str) {
        debug!(phase = %phase, username = %username, "redemption phase");
    }
}

/// Longest username kept verbatim as a rate limit key.
const MAX_LIMITER_KEY_LEN: usize = 64;

/// Rate limit key for `username`.
///
/// Oversized names are replaced by their SHA-256 so the limiter never holds
/// arbitrarily large keys; distinct names still get distinct budgets.
fn limiter_key(username: &str) -> String {
    if username.len() <= MAX_LIMITER_KEY_LEN {
        return username.to_string();
    }
    format!("sha256:{}", hex::encode(Sha256::digest(username.as_bytes())))
}

/// Short, non-reversible identifier for a code in logs.
fn code_fingerprint(code: &str) -> String {
    let digest = Sha256::digest(code.as_bytes());
    hex::encode(&digest[..4])
}
