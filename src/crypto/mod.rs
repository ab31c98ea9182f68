//! Cryptographic primitives: request signing, symmetric encryption,
//! password hashing, token generation and content integrity.
//!
//! Nothing here holds shared mutable state; every function is safe to call
//! from any thread.

pub mod cipher;
pub mod codes;
pub mod digest;
pub mod freshness;
pub mod password;
pub mod signing;
pub mod token;

pub use cipher::{decrypt, encrypt, Vault};
pub use digest::{file_hash, verify_file_at_path, verify_file_integrity};
pub use password::{hash_password, verify_password};
pub use signing::{sign, verify_signature};
pub use token::generate_secure_token;
