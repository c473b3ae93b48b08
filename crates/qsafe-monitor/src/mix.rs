//! # Rolling Mix Function
//!
//! The deterministic, order-sensitive combining function that folds a
//! checkpoint identifier into the running context hash. This function is
//! the contract between the runtime monitor and the offline allowlist
//! generator: both sides must compute identical hashes for identical
//! checkpoint sequences.
//!
//! ## Design
//!
//! ```text
//! mix(state, id) = rotl(state XOR (id * K1), R) + K2    (all wrapping)
//! ```
//!
//! Required properties, and how the construction meets them:
//!
//! | Property | Mechanism |
//! |----------|-----------|
//! | Deterministic | Pure fixed arithmetic, no ambient input |
//! | Order-sensitive | Rotation + add between folds; XOR alone would commute |
//! | Diffusion | Odd-constant multiply spreads `id` bits, rotation mixes words |
//! | Cheap | One multiply, one XOR, one rotate, one add per checkpoint |
//!
//! A plain shift-xor accumulator (`state << 1 ^ id`) satisfies only the
//! first and last properties: it sheds history after 64 checkpoints and
//! diffuses one bit position per step, so near-collisions between
//! permuted sequences are easy to construct. The multiply-rotate-add
//! form keeps the collision probability near the 2^-64 floor of the
//! hash width.
//!
//! ## References
//!
//! - Abadi, M. et al. (2005). "Control-Flow Integrity". ACM CCS.
//! - Shacham, H. (2007). "The Geometry of Innocent Flesh on the Bone:
//!   Return-into-libc without Function Calls". ACM CCS.
//! - Steele, G. & Vigna, S. (2021). "Computationally Easy, Spectrally
//!   Good Multipliers for Congruential Pseudorandom Number Generators".

use qsafe_allowlist::ContextHash;

/// Opaque identifier of one instrumented program location, unique per
/// monitored point within one build. Assigned by the instrumentation
/// tooling; the monitor never interprets its value.
pub type CheckpointId = u64;

/// Seed of every fresh context.
///
/// Non-zero so that the "no checkpoints yet" state is distinguishable
/// from any accumulator a real checkpoint sequence could plausibly
/// start from, and so the first fold already has state bits to diffuse.
pub const CONTEXT_SEED: ContextHash = 0x5AFE_C0DE_5AFE_C0DE;

/// Odd multiplier applied to the checkpoint id before folding.
/// The golden-ratio constant used by SplitMix64 and Fibonacci hashing.
const K1: u64 = 0x9E37_79B9_7F4A_7C15;

/// Odd post-rotation addend, decorrelating successive folds.
const K2: u64 = 0x2545_F491_4F6C_DD1D;

/// Rotation distance. 27 pairs well with the golden-ratio multiplier;
/// it moves the well-mixed high bits of the product into the low half.
const R: u32 = 27;

/// Folds one checkpoint id into a context hash.
///
/// Deterministic and order-sensitive: `mix(mix(s, a), b)` and
/// `mix(mix(s, b), a)` disagree with overwhelming probability for
/// `a != b`. All arithmetic wraps; there is no data-dependent branching.
///
/// # Example
///
/// ```rust
/// use qsafe_monitor::mix::{mix, CONTEXT_SEED};
///
/// let h1 = mix(CONTEXT_SEED, 0x1000);
/// let h2 = mix(CONTEXT_SEED, 0x1000);
/// assert_eq!(h1, h2);
/// assert_ne!(h1, CONTEXT_SEED);
/// ```
#[inline]
#[must_use]
pub const fn mix(state: ContextHash, id: CheckpointId) -> ContextHash {
    (state ^ id.wrapping_mul(K1)).rotate_left(R).wrapping_add(K2)
}

/// Computes the context hash of every non-empty prefix of a trace.
///
/// `prefix_hashes(&[a, b, c])` returns the hashes a monitor would hold
/// after `[a]`, `[a, b]`, and `[a, b, c]` — exactly the entries an
/// offline generator must emit to bless the trace. Membership of every
/// prefix, not just the final hash, is what lets the monitor catch a
/// divergence at the next checkpoint rather than at program end.
#[must_use]
pub fn prefix_hashes(trace: &[CheckpointId]) -> Vec<ContextHash> {
    let mut state = CONTEXT_SEED;
    trace
        .iter()
        .map(|&id| {
            state = mix(state, id);
            state
        })
        .collect()
}
