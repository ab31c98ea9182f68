//! # instance-gate
//!
//! **Instance access control and signed code redemption for launcher clients.**
//!
//! instance-gate decides which named instances (content bundles) a local
//! user may use, and lets a server unlock more of them through redemption
//! codes. Every redemption request is HMAC-signed with a shared secret and
//! rate limited per username before it leaves the process.
//!
//! ## Features
//!
//! - **Access decisions** - open instances, whitelists and redeemed grants
//! - **Signed redemption** - HMAC-SHA256 over `{code, username, timestamp}`
//! - **Rate limiting** - fixed windows per username (3 attempts / 5 minutes by default)
//! - **Persistent grants** - atomic JSON writes under the platform data directory
//! - **Crypto vault** - authenticated encryption, PBKDF2 password hashing,
//!   secure tokens and SHA-256 file integrity checks
//!
//! ## Quickstart
//!
//! ```no_run
//! use instance_gate::{GateConfig, Instance, RedemptionManager};
//!
//! fn main() -> Result<(), instance_gate::GateError> {
//!     let config = GateConfig::from_env(
//!         "mylauncher/1.0.0",
//!         "https://launcher.example.com/files/validate_code.php",
//!         "mylauncher",
//!     )?;
//!
//!     let manager = RedemptionManager::new(config)?;
//!     let redemption = manager.redeem("0123456789abcdef0123456789abcdef", "alice")?;
//!     println!("Unlocked {}", redemption.display_name());
//!
//!     let unlocked = Instance::restricted(redemption.instance.clone(), ["admin"]);
//!     assert!(manager.has_access(&unlocked, Some("alice")));
//!     Ok(())
//! }
//! ```
//!
//! ## Threat Model
//!
//! instance-gate protects against:
//! - **Forged requests** - the server can verify every request signature
//! - **Code brute forcing** - attempts are throttled per username
//! - **Replayed responses** - server timestamps outside 5 minutes are rejected
//! - **Blob tampering** - encrypted blobs are authenticated before decryption
//!
//! instance-gate does **not** prevent binary patching or editing the grant
//! file. Client-side access control can always be bypassed by a determined
//! attacker with access to the machine.
//!
//! ## Configuration
//!
//! - `endpoint_url` - redemption endpoint, must be a public http(s) URL
//! - `shared_secret` - at least 32 bytes, usually from `INSTANCE_GATE_SECRET`
//! - `storage_namespace` - directory under the platform data dir for grants
//! - `rate_limit` / `request_timeout` - attempt budget and HTTP bound
//!
//! See [`GateConfig`] for full documentation.

#![deny(missing_docs)]
#![doc(html_root_url = "https://docs.rs/instance-gate/0.1.0")]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Crypto layer
pub mod crypto;

// Input validation
pub mod validation;

// Protocol layer
pub mod protocol;

// Client layer
pub mod client;

// Storage layer
pub mod store;

// Metering layer
pub mod meter;

// Policy layer
pub mod policy;

// Manager (main public API)
pub mod manager;

// Re-exports for public API
pub use clock::{Clock, SystemClock};
pub use config::GateConfig;
pub use errors::GateError;
pub use manager::{RedemptionManager, RedemptionPhase};
pub use meter::rate_limit::{RateLimitPolicy, RateLimiter};
pub use policy::access::AccessDecision;
pub use protocol::models::{Instance, Redemption};
pub use store::grants::{Grant, GrantStore};

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
