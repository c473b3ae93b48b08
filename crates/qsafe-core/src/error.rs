//! Error types for the Q-SAFE guard facade.

use thiserror::Error;

/// Result type alias for guard operations.
pub type Result<T> = std::result::Result<T, GuardError>;

/// Errors raised while setting up or wiring the guard.
///
/// Runtime violations are not errors at this layer; they surface as
/// [`CheckpointOutcome`](crate::CheckpointOutcome) values so the host
/// keeps control of process lifecycle.
#[derive(Debug, Error)]
pub enum GuardError {
    /// The allowlist artifact was malformed or unreadable. The guard
    /// refuses to initialize rather than run with a partial allowlist.
    #[error("allowlist error: {0}")]
    Allowlist(#[from] qsafe_allowlist::AllowlistError),

    /// A checkpoint context was requested before the guard was
    /// installed. An integration bug: silently defaulting to a
    /// permissive state would defeat the protection entirely.
    #[error("uninitialized monitor: install the guard before requesting contexts")]
    Uninitialized,

    /// The guard slot was installed twice. Initialization happens
    /// exactly once per process.
    #[error("guard already initialized")]
    AlreadyInitialized,
}
