//! The guard facade wiring allowlist, monitors, and host policy.
//!
//! This module is the main entry point for embedding Q-SAFE in a
//! protected process: the [`CfiGuard`] loads the allowlist once at
//! startup and mints one [`GuardedContext`] per logical execution
//! context, each enforcing the prefix-membership invariant at every
//! instrumented checkpoint.

use std::sync::{Arc, OnceLock};

use qsafe_allowlist::AllowlistStore;
use qsafe_monitor::{CheckpointId, ContextMonitor, MonitorError};
use tracing::{debug, error, info};

use crate::config::{AllowlistSource, GuardConfig, ViolationPolicy};
use crate::error::{GuardError, Result};
use crate::outcome::CheckpointOutcome;

/// Process-level guard: one allowlist, many per-context monitors.
///
/// # Security Model
///
/// - `initialize` runs exactly once at startup, before any protected
///   code. A malformed allowlist makes it fail; the host must treat
///   that as fatal rather than continue unprotected.
/// - Each thread of control flow gets its own [`GuardedContext`] via
///   [`context`](Self::context). Contexts never share an accumulator:
///   checkpoints on independent call stacks are logically independent,
///   and sharing would make legitimate interleavings look like
///   violations and vice versa.
///
/// # Example
///
/// ```rust
/// use qsafe_core::{AllowlistSource, CfiGuard, GuardConfig, ViolationPolicy};
/// use qsafe_monitor::mix::prefix_hashes;
///
/// let config = GuardConfig {
///     allowlist: AllowlistSource::Inline(prefix_hashes(&[0x10, 0x20])),
///     violation_policy: ViolationPolicy::Report,
///     audit_logging: false,
/// };
///
/// let guard = CfiGuard::initialize(config)?;
/// let mut ctx = guard.context();
///
/// assert!(ctx.checkpoint(0x10).is_pass());
/// assert!(ctx.checkpoint(0x20).is_pass());
/// # Ok::<(), qsafe_core::GuardError>(())
/// ```
#[derive(Debug)]
pub struct CfiGuard {
    /// Configuration.
    config: GuardConfig,

    /// The blessed context hashes, shared read-only by all contexts.
    store: Arc<AllowlistStore>,
}

impl CfiGuard {
    /// Loads the allowlist and builds the guard.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::Allowlist`] if the artifact is unreadable,
    /// truncated, misaligned, or miscounted. No guard is produced in
    /// that case; a partial allowlist silently hardens nothing.
    pub fn initialize(config: GuardConfig) -> Result<Self> {
        let store = match &config.allowlist {
            AllowlistSource::File(path) => AllowlistStore::from_file(path)?,
            AllowlistSource::Inline(hashes) => {
                AllowlistStore::from_hashes(hashes.iter().copied())
            }
        };

        info!(
            "Q-SAFE guard initialized with {} allowlisted context hashes ({:?} policy)",
            store.len(),
            config.violation_policy
        );

        Ok(Self {
            config,
            store: Arc::new(store),
        })
    }

    /// Mints a monitor for a new logical execution context.
    ///
    /// Call once per thread (or fiber, or call stack) and keep the
    /// returned handle with that context for its whole lifetime.
    #[must_use]
    pub fn context(&self) -> GuardedContext {
        GuardedContext {
            monitor: ContextMonitor::new(Arc::clone(&self.store)),
            policy: self.config.violation_policy,
            audit: self.config.audit_logging,
        }
    }

    /// Returns the loaded allowlist store.
    #[must_use]
    pub fn store(&self) -> &Arc<AllowlistStore> {
        &self.store
    }

    /// Returns the guard configuration.
    #[must_use]
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }
}

/// Per-context checkpoint handle pairing a monitor with host policy.
///
/// # Thread Safety
///
/// Not thread-safe by design: a context represents a single thread of
/// control flow, and its checkpoints are totally ordered through
/// `&mut self`.
#[derive(Debug)]
pub struct GuardedContext {
    /// The rolling-hash state machine for this context.
    monitor: ContextMonitor,
    /// What to do when a violation trips.
    policy: ViolationPolicy,
    /// Emit a trace event per accepted checkpoint.
    audit: bool,
}

impl GuardedContext {
    /// Reports that control reached the instrumented location `id`.
    ///
    /// Must be called synchronously BEFORE the protected body executes.
    /// Under [`ViolationPolicy::Abort`] a violation never returns: the
    /// process is aborted before the hijacked control flow can proceed.
    /// Under [`ViolationPolicy::Report`] the outcome is returned and the
    /// caller must halt the context itself.
    pub fn checkpoint(&mut self, id: CheckpointId) -> CheckpointOutcome {
        match self.monitor.checkpoint(id) {
            Ok(context) => {
                if self.audit {
                    debug!("checkpoint {:#x} accepted, context now {:#x}", id, context);
                }
                CheckpointOutcome::Pass { context }
            }
            Err(MonitorError::CfiViolation { offending_id, context, candidate, step }) => {
                error!(
                    "CFI violation at step {}: id {:#x} folded context {:#x} into unblessed hash {:#x}",
                    step, offending_id, context, candidate
                );
                self.enforce();
                CheckpointOutcome::Violation {
                    offending_id,
                    expected_context: context,
                    candidate,
                    step,
                }
            }
            Err(MonitorError::Halted { violated_at }) => {
                error!("checkpoint on context halted since step {}", violated_at);
                self.enforce();
                CheckpointOutcome::Halted { violated_at }
            }
        }
    }

    /// Applies the violation policy. Under `Abort` this never returns.
    fn enforce(&self) {
        if self.policy == ViolationPolicy::Abort {
            // Control flow is already hijacked; nothing in this process
            // can be trusted to run a graceful shutdown.
            std::process::abort();
        }
    }

    /// Returns the current accumulator value for this context.
    #[inline]
    #[must_use]
    pub const fn current_context(&self) -> qsafe_allowlist::ContextHash {
        self.monitor.current_context()
    }

    /// Returns true if this context has tripped a violation.
    #[inline]
    #[must_use]
    pub const fn is_violated(&self) -> bool {
        self.monitor.is_violated()
    }

    /// Returns the number of checkpoints observed by this context.
    #[inline]
    #[must_use]
    pub const fn checkpoint_count(&self) -> u64 {
        self.monitor.checkpoint_count()
    }
}

/// Process-wide guard slot for hosts with instrumentation that cannot
/// thread a guard reference through call sites.
///
/// The typical deployment style: `install` once from `main`, then
/// every instrumented location asks the slot for its context handle.
/// The slot holds the guard, not any monitor state; contexts are still
/// minted per thread by the caller.
///
/// # Example
///
/// ```rust
/// use qsafe_core::{AllowlistSource, CfiGuard, GuardConfig, GuardSlot, ViolationPolicy};
/// use qsafe_monitor::mix::prefix_hashes;
///
/// static GUARD: GuardSlot = GuardSlot::new();
///
/// let config = GuardConfig {
///     allowlist: AllowlistSource::Inline(prefix_hashes(&[0x10])),
///     violation_policy: ViolationPolicy::Report,
///     audit_logging: false,
/// };
/// GUARD.install(CfiGuard::initialize(config)?)?;
///
/// let mut ctx = GUARD.context()?;
/// assert!(ctx.checkpoint(0x10).is_pass());
/// # Ok::<(), qsafe_core::GuardError>(())
/// ```
#[derive(Debug)]
pub struct GuardSlot {
    guard: OnceLock<CfiGuard>,
}

impl GuardSlot {
    /// Creates an empty slot, suitable for a `static`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            guard: OnceLock::new(),
        }
    }

    /// Installs the guard. Exactly once per process.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::AlreadyInitialized`] on a second install.
    pub fn install(&self, guard: CfiGuard) -> Result<()> {
        self.guard
            .set(guard)
            .map_err(|_| GuardError::AlreadyInitialized)
    }

    /// Mints a context from the installed guard.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::Uninitialized`] if no guard was installed.
    /// This is an integration bug surfaced loudly: defaulting to a
    /// permissive no-op monitor would defeat the protection.
    pub fn context(&self) -> Result<GuardedContext> {
        self.guard
            .get()
            .map(CfiGuard::context)
            .ok_or(GuardError::Uninitialized)
    }

    /// Returns the installed guard, if any.
    #[must_use]
    pub fn get(&self) -> Option<&CfiGuard> {
        self.guard.get()
    }
}

impl Default for GuardSlot {
    fn default() -> Self {
        Self::new()
    }
}
