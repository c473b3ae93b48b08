//! Error types for the context monitor.

use qsafe_allowlist::ContextHash;
use thiserror::Error;

use crate::mix::CheckpointId;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors reported by checkpoint enforcement.
///
/// # Security Notes
///
/// Nothing here is retryable. A violation means control flow has already
/// diverged from every blessed path; by that point no further protected
/// code in the context can be trusted to run correctly.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MonitorError {
    /// The candidate context hash is not in the allowlist.
    ///
    /// This is the security-relevant error: evidence of an illegitimate
    /// control-flow transition (ROP chain, smashed return address,
    /// skipped or reordered checkpoints).
    #[error(
        "CFI violation at checkpoint {step}: id {offending_id:#x} folded \
         context {context:#x} into {candidate:#x}, which is not allowlisted"
    )]
    CfiViolation {
        /// The checkpoint id whose fold produced the invalid hash.
        offending_id: CheckpointId,
        /// The (still valid) accumulator before the fold.
        context: ContextHash,
        /// The rejected candidate hash. Never applied to the monitor.
        candidate: ContextHash,
        /// Ordinal of the violating checkpoint call (1-based).
        step: u64,
    },

    /// A checkpoint was reported to a monitor already in the terminal
    /// `Violated` state.
    #[error("monitor halted: CFI violation already detected at checkpoint {violated_at}")]
    Halted {
        /// Step at which the original violation occurred.
        violated_at: u64,
    },
}
