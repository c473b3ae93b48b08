//! # Q-SAFE Allowlist Store
//!
//! The leaf component of the Q-SAFE control-flow-integrity monitor: an
//! immutable set of 64-bit context hashes blessed in advance by an
//! offline generator, plus the binary codec for the artifact that
//! carries them into the protected process.
//!
//! ## Components
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`AllowlistStore`] | O(1) membership over legitimate context hashes |
//! | [`artifact`] | Length-prefixed binary artifact encode/decode |
//!
//! ## Quick Start
//!
//! ```rust
//! use qsafe_allowlist::{artifact, AllowlistStore};
//!
//! // Artifact produced offline: count header + context hashes.
//! let bytes = artifact::encode(&[0x1111, 0x2222]);
//!
//! let store = AllowlistStore::from_bytes(&bytes)?;
//! assert!(store.contains(0x1111));
//! # Ok::<(), qsafe_allowlist::AllowlistError>(())
//! ```
//!
//! ## Security Notes
//!
//! - Loading is fail-closed: malformed artifacts refuse to initialize.
//! - The store is immutable after construction and safe to share
//!   lock-free across any number of monitored contexts.

pub mod artifact;
mod error;
mod store;

pub use error::{AllowlistError, Result};
pub use store::{AllowlistStore, ContextHash};
