//! Attempt metering for the redemption endpoint.

pub mod rate_limit;

pub use rate_limit::{RateLimitDecision, RateLimitPolicy, RateLimiter};
