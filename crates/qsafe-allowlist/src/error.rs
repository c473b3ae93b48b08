//! Error types for allowlist loading.

use thiserror::Error;

/// Result type alias for allowlist operations.
pub type Result<T> = std::result::Result<T, AllowlistError>;

/// Errors that can occur while loading an allowlist artifact.
///
/// # Security Notes
///
/// Every variant here is fatal at startup. A monitor running against a
/// partially loaded allowlist would reject legitimate paths (too small)
/// or admit garbage hashes (too large), so loading is all-or-nothing.
#[derive(Debug, Error)]
pub enum AllowlistError {
    /// The artifact is shorter than its 8-byte count header.
    #[error("malformed allowlist: {actual} bytes is too short for the count header")]
    TruncatedHeader {
        /// Bytes actually available.
        actual: usize,
    },

    /// The payload length is not a whole number of 64-bit entries.
    #[error("malformed allowlist: payload of {payload_len} bytes is not a multiple of {element_width}")]
    MisalignedPayload {
        /// Payload length in bytes (excluding the header).
        payload_len: usize,
        /// Width of one entry in bytes.
        element_width: usize,
    },

    /// The declared entry count disagrees with the payload.
    #[error("malformed allowlist: header declares {declared} entries but payload holds {actual}")]
    CountMismatch {
        /// Entry count from the header.
        declared: u64,
        /// Entries actually present in the payload.
        actual: u64,
    },

    /// The artifact could not be read from disk.
    #[error("failed to read allowlist artifact: {0}")]
    Io(#[from] std::io::Error),
}
