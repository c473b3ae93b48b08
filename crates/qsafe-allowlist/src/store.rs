//! # Allowlist Store
//!
//! Immutable membership set of legitimate context hashes. Each entry is
//! the accumulator value reachable after some blessed sequence of
//! checkpoints starting from program start; the monitor tests membership
//! after folding in every checkpoint, so a deviation is caught at the
//! first checkpoint past the divergence, not at program end.
//!
//! ## Threat Model
//!
//! The store is the ground truth for "legitimate control flow":
//!
//! - **Stale or partial data**: loading is all-or-nothing; a malformed
//!   artifact refuses to initialize rather than silently hardening nothing.
//! - **Runtime tampering**: no mutating API exists after construction.
//! - **Concurrent readers**: immutability makes lock-free sharing across
//!   monitored contexts safe by construction.
//!
//! ## Security Notes
//!
//! - Membership is tested against *every* prefix state, not one final
//!   value. An allowlist of only complete-path hashes would let a
//!   hijacked context run to completion before detection.
//! - Two distinct legitimate paths may collide onto one hash. That is a
//!   controlled false-negative risk bounded by the 64-bit hash width,
//!   accepted in exchange for O(1) state and O(1) checks.

use crate::artifact;
use crate::error::Result;
use std::collections::HashSet;
use std::path::Path;

/// A folded, order-sensitive accumulator over the checkpoints visited by
/// one execution context. Not a reversible digest of the full history.
pub type ContextHash = u64;

/// Immutable set of context hashes considered legitimate.
///
/// # Thread Safety
///
/// The store is never mutated after construction, so any number of
/// monitored contexts can query it concurrently without locking. Share
/// it behind an `Arc`.
///
/// # Example
///
/// ```rust
/// use qsafe_allowlist::AllowlistStore;
///
/// let store = AllowlistStore::from_hashes([0x1111, 0x2222]);
/// assert!(store.contains(0x1111));
/// assert!(!store.contains(0x9999));
/// ```
#[derive(Debug, Clone)]
pub struct AllowlistStore {
    /// The blessed context hashes.
    hashes: HashSet<ContextHash>,
}

impl AllowlistStore {
    /// Builds a store directly from context hashes.
    ///
    /// For hosts that compute prefix hashes from known-good traces in
    /// process, and for tests. Duplicates collapse silently.
    #[must_use]
    pub fn from_hashes(hashes: impl IntoIterator<Item = ContextHash>) -> Self {
        Self {
            hashes: hashes.into_iter().collect(),
        }
    }

    /// Parses a store from an allowlist artifact held in memory.
    ///
    /// # Errors
    ///
    /// Returns [`AllowlistError`](crate::AllowlistError) if the artifact
    /// is truncated, misaligned, or miscounted. No partial store is ever
    /// produced.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::from_hashes(artifact::decode(bytes)?))
    }

    /// Reads an allowlist artifact from disk and parses it.
    ///
    /// # Errors
    ///
    /// Returns [`AllowlistError::Io`](crate::AllowlistError::Io) if the
    /// file cannot be read, or any decoding error from
    /// [`from_bytes`](Self::from_bytes).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Tests whether a context hash is a legitimate prefix state.
    ///
    /// O(1) expected time; this runs on every instrumented checkpoint.
    #[inline]
    #[must_use]
    pub fn contains(&self, hash: ContextHash) -> bool {
        self.hashes.contains(&hash)
    }

    /// Returns the number of blessed context hashes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Returns true if the store holds no hashes.
    ///
    /// An empty store is valid but rejects every checkpoint; useful for
    /// fail-closed defaults, never for a protected deployment.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AllowlistError;
    use std::io::Write;

    #[test]
    fn test_from_hashes_membership() {
        let store = AllowlistStore::from_hashes([1, 2, 3]);
        assert_eq!(store.len(), 3);
        assert!(store.contains(2));
        assert!(!store.contains(4));
    }

    #[test]
    fn test_duplicates_collapse() {
        let store = AllowlistStore::from_hashes([7, 7, 7]);
        assert_eq!(store.len(), 1);
        assert!(store.contains(7));
    }

    #[test]
    fn test_empty_store_rejects_everything() {
        let store = AllowlistStore::from_hashes([]);
        assert!(store.is_empty());
        assert!(!store.contains(0));
    }

    #[test]
    fn test_from_bytes() {
        let bytes = artifact::encode(&[0xAA, 0xBB]);
        let store = AllowlistStore::from_bytes(&bytes).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.contains(0xAA));
        assert!(store.contains(0xBB));
    }

    #[test]
    fn test_from_file_roundtrip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&artifact::encode(&[0x1234, 0x5678])).unwrap();
        file.flush().unwrap();

        let store = AllowlistStore::from_file(file.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.contains(0x1234));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = AllowlistStore::from_file("/nonexistent/allowlist.bin");
        assert!(matches!(result, Err(AllowlistError::Io(_))));
    }

    // Security-focused tests
    #[test]
    fn test_security_malformed_artifact_yields_no_store() {
        // Declared count 5, payload holds 3: must fail outright, never
        // initialize a store with the 3 readable entries.
        let mut bytes = 5u64.to_le_bytes().to_vec();
        for hash in [0x1u64, 0x2, 0x3] {
            bytes.extend_from_slice(&hash.to_le_bytes());
        }

        assert!(matches!(
            AllowlistStore::from_bytes(&bytes),
            Err(AllowlistError::CountMismatch { declared: 5, actual: 3 })
        ));
    }
}
