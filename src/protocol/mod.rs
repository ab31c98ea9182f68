//! Redemption protocol types.

pub mod models;

pub use models::{
    parse_instance_list, Instance, Redemption, RedemptionResponse, RequestPayload, SignedRequest,
};
