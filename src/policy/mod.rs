//! Access policy layer.

pub mod access;

pub use access::{evaluate, has_access, resolve_selection, visible_instances, AccessDecision};
