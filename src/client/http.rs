//! Reqwest-based client for the redemption endpoint.
//!
//! The endpoint is an opaque collaborator: one JSON POST in, one JSON
//! object out. Non-2xx statuses still carry the JSON body, so the body is
//! parsed first and the status only matters when it is not JSON.

use crate::config::GateConfig;
use crate::protocol::models::{RedemptionResponse, SignedRequest};
use crate::GateError;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use std::time::Duration;
use tracing::debug;

/// Submits signed redemption requests.
///
/// [`RedemptionClient`] is the HTTP implementation; tests and embedders can
/// supply their own.
pub trait RedemptionTransport: Send + Sync {
    /// Submit one request and return the parsed response.
    ///
    /// # Errors
    /// * `NetworkError` - transport failure or timeout
    /// * `ProtocolError` - body does not match the response schema
    fn submit(&self, request: &SignedRequest) -> Result<RedemptionResponse, GateError>;
}

/// HTTP client for the redemption endpoint.
pub struct RedemptionClient {
    client: Client,
    endpoint: String,
    user_agent: String,
    timeout: Duration,
}

impl RedemptionClient {
    /// Create a client from config.
    pub fn new(config: &GateConfig) -> Result<Self, GateError> {
        let client = build_client(config.request_timeout)?;

        Ok(Self {
            client,
            endpoint: config.endpoint_url.clone(),
            user_agent: build_user_agent(config),
            timeout: config.request_timeout,
        })
    }

    /// Replace the request timeout.
    pub fn try_with_timeout(mut self, timeout: Duration) -> Result<Self, GateError> {
        self.client = build_client(timeout)?;
        self.timeout = timeout;
        Ok(self)
    }

    /// Configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Configured request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl RedemptionTransport for RedemptionClient {
    fn submit(&self, request: &SignedRequest) -> Result<RedemptionResponse, GateError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .json(request)
            .send()
            .map_err(|e| GateError::NetworkError(format!("Request failed: {}", e)))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .map_err(|e| GateError::NetworkError(format!("Failed to read body: {}", e)))?;

        debug!(status = status.as_u16(), len = bytes.len(), "redemption response received");

        parse_response(status.as_u16(), &bytes)
    }
}

/// Interpret a response body given its HTTP status.
///
/// A non-JSON body on an error status is a server/transport problem
/// (`NetworkError`); on a success status it is a contract violation
/// (`ProtocolError`).
pub fn parse_response(status: u16, body: &[u8]) -> Result<RedemptionResponse, GateError> {
    match RedemptionResponse::from_slice(body) {
        Ok(parsed) => Ok(parsed),
        Err(_) if !(200..300).contains(&status) => Err(GateError::NetworkError(format!(
            "Server returned HTTP {}",
            status
        ))),
        Err(e) => Err(e),
    }
}

fn build_client(timeout: Duration) -> Result<Client, GateError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GateError::ConfigError(format!("Failed to build HTTP client: {}", e)))
}

/// Build a User-Agent string from config.
///
/// Format: `instance-gate/<version> <app>`
pub fn build_user_agent(config: &GateConfig) -> String {
    format!("instance-gate/{} {}", env!("CARGO_PKG_VERSION"), config.app_name)
}
