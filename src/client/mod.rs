//! Redemption endpoint client.

pub mod http;

pub use http::{RedemptionClient, RedemptionTransport};
