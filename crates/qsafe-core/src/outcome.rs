//! Checkpoint outcome types exposed to the embedding host.

use qsafe_allowlist::ContextHash;
use qsafe_monitor::CheckpointId;
use serde::{Deserialize, Serialize};

/// The result of reporting one checkpoint through a guarded context.
///
/// Under [`ViolationPolicy::Report`](crate::ViolationPolicy::Report)
/// the host receives this value and decides whether to terminate, raise
/// a fault, or hand off to a registered handler. What the host may NOT
/// do is resume normal execution of the same context after a violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use = "a violation outcome must halt the protected context"]
pub enum CheckpointOutcome {
    /// The checkpoint matched a blessed prefix; proceed.
    Pass {
        /// The updated context hash.
        context: ContextHash,
    },

    /// The checkpoint diverged from every blessed path. The protected
    /// body of the violating checkpoint must not execute.
    Violation {
        /// The checkpoint id whose fold produced the invalid hash.
        offending_id: CheckpointId,
        /// The last valid accumulator value (still applied).
        expected_context: ContextHash,
        /// The rejected candidate hash (never applied).
        candidate: ContextHash,
        /// Ordinal of the violating checkpoint call (1-based).
        step: u64,
    },

    /// A checkpoint reached a context already terminally violated.
    Halted {
        /// Step at which the original violation occurred.
        violated_at: u64,
    },
}

impl CheckpointOutcome {
    /// Returns true if the checkpoint was accepted.
    #[must_use]
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass { .. })
    }

    /// Returns true if this outcome means the context is compromised.
    #[must_use]
    pub fn is_violation(&self) -> bool {
        matches!(self, Self::Violation { .. } | Self::Halted { .. })
    }
}

impl std::fmt::Display for CheckpointOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass { context } => write!(f, "pass (context {context:#x})"),
            Self::Violation { offending_id, candidate, step, .. } => write!(
                f,
                "CFI violation at step {step}: id {offending_id:#x} -> unblessed hash {candidate:#x}"
            ),
            Self::Halted { violated_at } => {
                write!(f, "context halted since violation at step {violated_at}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_predicates() {
        let outcome = CheckpointOutcome::Pass { context: 0xAB };
        assert!(outcome.is_pass());
        assert!(!outcome.is_violation());
    }

    #[test]
    fn test_violation_predicates() {
        let outcome = CheckpointOutcome::Violation {
            offending_id: 0x4000,
            expected_context: 0x1,
            candidate: 0x2,
            step: 3,
        };
        assert!(!outcome.is_pass());
        assert!(outcome.is_violation());
    }

    #[test]
    fn test_halted_counts_as_violation() {
        let outcome = CheckpointOutcome::Halted { violated_at: 2 };
        assert!(outcome.is_violation());
    }

    #[test]
    fn test_display() {
        let outcome = CheckpointOutcome::Violation {
            offending_id: 0x4000,
            expected_context: 0x1,
            candidate: 0x2,
            step: 3,
        };
        assert_eq!(
            outcome.to_string(),
            "CFI violation at step 3: id 0x4000 -> unblessed hash 0x2"
        );
    }
}
