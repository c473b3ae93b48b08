//! # Context Monitor
//!
//! The rolling-hash state machine at the heart of Q-SAFE. One monitor
//! owns the folded history of one logical execution context and checks,
//! at every instrumented checkpoint, that the history is still a prefix
//! of some blessed call path.
//!
//! ## Threat Model
//!
//! Control-flow hijacking changes the *sequence* of checkpoints a
//! context visits:
//!
//! - **ROP / return-into-libc** (return lands past the blessed callee)
//! - **Stack smashing** (overwritten return address redirects control)
//! - **Checkpoint skipping** (jump into a function body mid-path)
//!
//! Each of these folds an id into the accumulator in an order no
//! legitimate path produces, so the candidate hash falls outside the
//! allowlist at the very next checkpoint.
//!
//! ## State Machine
//!
//! ```text
//!              checkpoint (hash allowlisted)
//!                 ┌──────┐
//!                 ▼      │
//!   new ──► Active ──────┘
//!              │
//!              │ checkpoint (hash not allowlisted)
//!              ▼
//!          Violated  ◄── terminal, no way out
//! ```
//!
//! Recovery from `Violated` requires a fresh monitor for a fresh
//! context, never resumption of the compromised one.
//!
//! ## Security Notes
//!
//! - The membership check runs BEFORE the protected body executes.
//! - A rejected candidate hash is never applied to the accumulator.
//! - Checkpoint calls for one context are strictly sequential; the
//!   read-modify-check-write on the accumulator goes through `&mut self`
//!   so interleaved checks on stale state are unrepresentable.

use std::sync::Arc;

use qsafe_allowlist::{AllowlistStore, ContextHash};

use crate::error::{MonitorError, Result};
use crate::mix::{mix, CheckpointId, CONTEXT_SEED};

/// Lifecycle state of a context monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Every checkpoint so far matched a blessed prefix.
    Active,
    /// A checkpoint diverged from every blessed path. Terminal.
    Violated,
}

/// Rolling-hash monitor for one logical execution context.
///
/// # Overview
///
/// The monitor holds a single 64-bit accumulator seeded with
/// [`CONTEXT_SEED`]. Each [`checkpoint`](Self::checkpoint) folds the
/// reported id into a candidate hash and admits it only if the
/// allowlist contains it; otherwise the monitor trips into the terminal
/// [`MonitorState::Violated`] state and every later checkpoint is
/// rejected.
///
/// # Thread Safety
///
/// A monitor is inherently sequential: it represents a single thread of
/// control flow. Give each thread (or fiber, or call stack) its own
/// instance; sharing one accumulator across contexts would make
/// legitimate interleavings look like violations and vice versa. The
/// allowlist store itself is immutable and shared freely via `Arc`.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use qsafe_allowlist::AllowlistStore;
/// use qsafe_monitor::{mix::prefix_hashes, ContextMonitor};
///
/// // Bless the trace [0x10, 0x20] — every prefix of it.
/// let store = Arc::new(AllowlistStore::from_hashes(prefix_hashes(&[0x10, 0x20])));
/// let mut monitor = ContextMonitor::new(store);
///
/// monitor.checkpoint(0x10)?;
/// monitor.checkpoint(0x20)?;
/// assert!(!monitor.is_violated());
/// # Ok::<(), qsafe_monitor::MonitorError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ContextMonitor {
    /// The folded history of this context. Invariant: after any
    /// successful checkpoint, this value is a member of the allowlist.
    current: ContextHash,
    /// The blessed prefix hashes, shared across contexts.
    store: Arc<AllowlistStore>,
    /// Lifecycle state.
    state: MonitorState,
    /// Checkpoints accepted or rejected so far (1-based step ordinal).
    steps: u64,
    /// Step at which the violation occurred, if any.
    violated_at: Option<u64>,
}

impl ContextMonitor {
    /// Creates a monitor for a fresh execution context.
    ///
    /// The accumulator starts at [`CONTEXT_SEED`]; the first checkpoint
    /// folds on top of it. The seed itself is not required to be a
    /// member of the allowlist (it represents the empty prefix).
    #[must_use]
    pub fn new(store: Arc<AllowlistStore>) -> Self {
        Self {
            current: CONTEXT_SEED,
            store,
            state: MonitorState::Active,
            steps: 0,
            violated_at: None,
        }
    }

    /// Reports that control reached the instrumented location `id`.
    ///
    /// Folds `id` into the accumulator and verifies the result is a
    /// blessed prefix state. Call this synchronously BEFORE the
    /// protected body executes.
    ///
    /// # Returns
    ///
    /// The updated context hash on success.
    ///
    /// # Errors
    ///
    /// - [`MonitorError::CfiViolation`] if the candidate hash is not in
    ///   the allowlist. The accumulator keeps its last valid value and
    ///   the monitor becomes terminally [`MonitorState::Violated`].
    /// - [`MonitorError::Halted`] if a violation was already detected;
    ///   a compromised context never re-enters enforcement.
    ///
    /// # Security Notes
    ///
    /// The caller MUST NOT execute the protected body after an error.
    /// The default host policy is to abort the process; see the guard
    /// facade in `qsafe-core`.
    pub fn checkpoint(&mut self, id: CheckpointId) -> Result<ContextHash> {
        if let Some(violated_at) = self.violated_at {
            return Err(MonitorError::Halted { violated_at });
        }

        self.steps += 1;
        let candidate = mix(self.current, id);

        if self.store.contains(candidate) {
            self.current = candidate;
            Ok(candidate)
        } else {
            self.state = MonitorState::Violated;
            self.violated_at = Some(self.steps);
            Err(MonitorError::CfiViolation {
                offending_id: id,
                context: self.current,
                candidate,
                step: self.steps,
            })
        }
    }

    /// Returns the current accumulator value.
    #[inline]
    #[must_use]
    pub const fn current_context(&self) -> ContextHash {
        self.current
    }

    /// Returns the lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> MonitorState {
        self.state
    }

    /// Returns true if a violation has been detected.
    #[inline]
    #[must_use]
    pub const fn is_violated(&self) -> bool {
        self.violated_at.is_some()
    }

    /// Returns the number of checkpoint calls observed, including the
    /// violating one if any.
    #[inline]
    #[must_use]
    pub const fn checkpoint_count(&self) -> u64 {
        self.steps
    }

    /// Returns the allowlist store this monitor enforces against.
    #[must_use]
    pub fn store(&self) -> &Arc<AllowlistStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mix::prefix_hashes;

    // Checkpoint ids mirroring a typical protected deployment:
    // main -> init -> A -> B is the only blessed path.
    const MAIN: CheckpointId = 0x1000;
    const INIT: CheckpointId = 0x2000;
    const FUNC_A: CheckpointId = 0x3000;
    const FUNC_B: CheckpointId = 0x4000;

    fn blessed_store() -> Arc<AllowlistStore> {
        Arc::new(AllowlistStore::from_hashes(prefix_hashes(&[
            MAIN, INIT, FUNC_A, FUNC_B,
        ])))
    }

    #[test]
    fn test_legitimate_full_path_accepted() {
        let mut monitor = ContextMonitor::new(blessed_store());

        for id in [MAIN, INIT, FUNC_A, FUNC_B] {
            let hash = monitor.checkpoint(id).unwrap();
            assert!(monitor.store().contains(hash));
        }

        assert_eq!(monitor.state(), MonitorState::Active);
        assert_eq!(monitor.checkpoint_count(), 4);
    }

    #[test]
    fn test_legitimate_partial_path_is_not_an_error() {
        // Stopping after [MAIN, INIT] is a valid prefix, not a violation.
        let mut monitor = ContextMonitor::new(blessed_store());
        monitor.checkpoint(MAIN).unwrap();
        monitor.checkpoint(INIT).unwrap();

        assert_eq!(monitor.state(), MonitorState::Active);
        assert!(!monitor.is_violated());
    }

    #[test]
    fn test_skipped_checkpoint_detected_at_third_step() {
        // [MAIN, INIT, B] skips A: steps 1 and 2 pass, step 3 trips.
        let mut monitor = ContextMonitor::new(blessed_store());
        monitor.checkpoint(MAIN).unwrap();
        monitor.checkpoint(INIT).unwrap();

        let err = monitor.checkpoint(FUNC_B).unwrap_err();
        assert!(matches!(
            err,
            MonitorError::CfiViolation { offending_id: FUNC_B, step: 3, .. }
        ));
    }

    #[test]
    fn test_direct_jump_detected_at_second_step() {
        // [MAIN, B] jumps straight into B.
        let mut monitor = ContextMonitor::new(blessed_store());
        monitor.checkpoint(MAIN).unwrap();

        let err = monitor.checkpoint(FUNC_B).unwrap_err();
        assert!(matches!(
            err,
            MonitorError::CfiViolation { offending_id: FUNC_B, step: 2, .. }
        ));
    }

    #[test]
    fn test_unknown_first_checkpoint_detected() {
        let mut monitor = ContextMonitor::new(blessed_store());
        let err = monitor.checkpoint(0xDEAD).unwrap_err();
        assert!(matches!(err, MonitorError::CfiViolation { step: 1, .. }));
    }

    #[test]
    fn test_determinism_across_fresh_monitors() {
        let store = blessed_store();
        let replay = |store: &Arc<AllowlistStore>| {
            let mut monitor = ContextMonitor::new(Arc::clone(store));
            for id in [MAIN, INIT, FUNC_A, FUNC_B] {
                monitor.checkpoint(id).unwrap();
            }
            monitor.current_context()
        };

        assert_eq!(replay(&store), replay(&store));
    }

    #[test]
    fn test_prefix_monotonicity() {
        // Every prefix of an accepted sequence is itself accepted by a
        // fresh monitor fed that prefix alone.
        let full = [MAIN, INIT, FUNC_A, FUNC_B];
        let store = blessed_store();

        for prefix_len in 1..=full.len() {
            let mut monitor = ContextMonitor::new(Arc::clone(&store));
            for &id in &full[..prefix_len] {
                monitor.checkpoint(id).unwrap();
            }
            assert_eq!(monitor.state(), MonitorState::Active);
        }
    }

    #[test]
    fn test_violation_reports_pre_fold_context() {
        let mut monitor = ContextMonitor::new(blessed_store());
        monitor.checkpoint(MAIN).unwrap();
        let valid = monitor.current_context();

        match monitor.checkpoint(FUNC_B).unwrap_err() {
            MonitorError::CfiViolation { context, candidate, .. } => {
                assert_eq!(context, valid);
                assert_eq!(candidate, mix(valid, FUNC_B));
                assert!(!monitor.store().contains(candidate));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    // Security-focused tests
    #[test]
    fn test_security_rejected_candidate_never_applied() {
        let mut monitor = ContextMonitor::new(blessed_store());
        monitor.checkpoint(MAIN).unwrap();
        let valid = monitor.current_context();

        let _ = monitor.checkpoint(FUNC_B);
        assert_eq!(monitor.current_context(), valid);
    }

    #[test]
    fn test_security_violated_state_is_terminal() {
        let mut monitor = ContextMonitor::new(blessed_store());
        monitor.checkpoint(MAIN).unwrap();
        let _ = monitor.checkpoint(FUNC_B).unwrap_err();

        // Even the id that would have been legitimate next is rejected,
        // and the accumulator never re-enters the allowlist.
        for id in [INIT, MAIN, FUNC_A] {
            let err = monitor.checkpoint(id).unwrap_err();
            assert!(matches!(err, MonitorError::Halted { violated_at: 2 }));
        }
        assert_eq!(monitor.state(), MonitorState::Violated);
        assert_eq!(monitor.checkpoint_count(), 2);
    }

    #[test]
    fn test_security_empty_allowlist_fails_closed() {
        let store = Arc::new(AllowlistStore::from_hashes([]));
        let mut monitor = ContextMonitor::new(store);
        assert!(monitor.checkpoint(MAIN).is_err());
    }

    #[test]
    fn test_security_independent_contexts_do_not_interfere() {
        // Two contexts over one shared store: a violation in one must
        // not taint the other.
        let store = blessed_store();
        let mut first = ContextMonitor::new(Arc::clone(&store));
        let mut second = ContextMonitor::new(Arc::clone(&store));

        first.checkpoint(MAIN).unwrap();
        let _ = first.checkpoint(FUNC_B).unwrap_err();

        second.checkpoint(MAIN).unwrap();
        second.checkpoint(INIT).unwrap();
        assert_eq!(second.state(), MonitorState::Active);
    }
}
