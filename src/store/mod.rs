//! Local grant persistence.

pub mod file;
pub mod grants;

pub use grants::{Grant, GrantStore, STORAGE_KEY};
