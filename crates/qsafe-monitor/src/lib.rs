//! # Q-SAFE Context Monitor
//!
//! Rolling context-hash verification: each logical execution context
//! folds every instrumented checkpoint it visits into a 64-bit
//! accumulator, and the fold is admitted only if the resulting hash is a
//! blessed prefix state. A hijacked control flow (ROP chain, smashed
//! return address, skipped call) produces an unblessed hash at the very
//! next checkpoint and trips the monitor before the protected body runs.
//!
//! ## Components
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`ContextMonitor`] | Per-context rolling-hash state machine |
//! | [`mix`] | The deterministic, order-sensitive combining function |
//! | [`MonitorError`] | Violation and halted-state reporting |
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use qsafe_allowlist::AllowlistStore;
//! use qsafe_monitor::{mix::prefix_hashes, ContextMonitor};
//!
//! let store = Arc::new(AllowlistStore::from_hashes(prefix_hashes(&[0x10, 0x20])));
//! let mut monitor = ContextMonitor::new(store);
//!
//! // At each instrumented location, before the protected body:
//! monitor.checkpoint(0x10)?;
//! monitor.checkpoint(0x20)?;
//! # Ok::<(), qsafe_monitor::MonitorError>(())
//! ```
//!
//! ## Security Notes
//!
//! - Checks execute BEFORE the protected code they guard.
//! - A violation is terminal for its context; there is no resume.
//! - One monitor per thread of control flow, never shared.
//!
//! ## References
//!
//! - Abadi, M., Budiu, M., Erlingsson, Ú., Ligatti, J. (2005).
//!   "Control-Flow Integrity: Principles, Implementations, and
//!   Applications". ACM CCS.
//! - Shacham, H. (2007). "The Geometry of Innocent Flesh on the Bone".
//!   ACM CCS.

mod error;
pub mod mix;
mod monitor;

pub use error::{MonitorError, Result};
pub use mix::{CheckpointId, CONTEXT_SEED};
pub use monitor::{ContextMonitor, MonitorState};

// The accumulator type, re-exported from the store crate so hosts can
// depend on this crate alone.
pub use qsafe_allowlist::ContextHash;
