//! # Q-SAFE Core
//!
//! Host-facing facade for the Q-SAFE control-flow-integrity monitor.
//! Wires the Allowlist Store and the Context Monitor together behind a
//! small embedding API: initialize once, mint one context per thread of
//! control flow, report every instrumented checkpoint.
//!
//! ## Threat Coverage
//!
//! | Layer | Component | Threats Caught |
//! |-------|-----------|----------------|
//! | Artifact | Allowlist Store | Truncated/miscounted allowlist data |
//! | Runtime | Context Monitor | ROP chains, smashed returns, skipped calls |
//! | Policy | Guard facade | Violations surviving past detection |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                    CfiGuard                      │
//! │        (allowlist + policy, one per process)     │
//! │                        │                         │
//! │        ┌───────────────┼───────────────┐         │
//! │        ▼               ▼               ▼         │
//! │ GuardedContext  GuardedContext  GuardedContext   │
//! │  (thread A)      (thread B)      (thread C)      │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use qsafe_core::{AllowlistSource, CfiGuard, GuardConfig, ViolationPolicy};
//! use qsafe_monitor::mix::prefix_hashes;
//!
//! let config = GuardConfig {
//!     allowlist: AllowlistSource::Inline(prefix_hashes(&[0x1000, 0x2000])),
//!     violation_policy: ViolationPolicy::Report,
//!     audit_logging: false,
//! };
//!
//! let guard = CfiGuard::initialize(config)?;
//! let mut ctx = guard.context();
//!
//! // At every instrumented location, before the protected body:
//! let outcome = ctx.checkpoint(0x1000);
//! assert!(outcome.is_pass());
//! # Ok::<(), qsafe_core::GuardError>(())
//! ```
//!
//! ## Security Notes
//!
//! - Initialization is fail-closed: a malformed allowlist refuses to
//!   initialize rather than run with partial data.
//! - The default violation policy aborts the process before the
//!   protected body of the violating checkpoint executes.
//! - A context that reported a violation never resumes; recovery means
//!   a fresh context, or more realistically a fresh process.

mod config;
mod error;
mod guard;
mod outcome;

pub use config::{AllowlistSource, GuardConfig, ViolationPolicy};
pub use error::{GuardError, Result};
pub use guard::{CfiGuard, GuardSlot, GuardedContext};
pub use outcome::CheckpointOutcome;

// Re-export component types for convenience
pub use qsafe_allowlist::{AllowlistError, AllowlistStore, ContextHash};
pub use qsafe_monitor::{CheckpointId, ContextMonitor, MonitorError, MonitorState};
