//! # Allowlist Artifact Codec
//!
//! Binary format shared with the offline allowlist generator. The
//! generator enumerates every legitimate prefix of every blessed call
//! path, hashes each prefix, and emits the hashes in this format; the
//! runtime side only ever decodes.
//!
//! ## Wire Format
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0      | 8    | entry count `N`, little-endian u64 |
//! | 8      | 8×N  | context hashes, little-endian u64 each |
//!
//! ## Security Notes
//!
//! - Decoding is all-or-nothing: a truncated, padded, or miscounted
//!   artifact is rejected outright rather than loaded partially.
//! - The count header is cross-checked against the actual payload
//!   length; neither side of that comparison is trusted alone.
//! - The artifact carries no authentication. Integrity of the file at
//!   rest is the deployment's responsibility (signed packaging,
//!   read-only mounts).

use crate::error::{AllowlistError, Result};
use crate::store::ContextHash;

/// Width of one artifact entry (and of the count header) in bytes.
pub const ELEMENT_WIDTH: usize = std::mem::size_of::<u64>();

/// Decodes an allowlist artifact into its context hashes.
///
/// # Errors
///
/// Returns [`AllowlistError::TruncatedHeader`] if the buffer cannot hold
/// the count header, [`AllowlistError::MisalignedPayload`] if the payload
/// is not a whole number of entries, and [`AllowlistError::CountMismatch`]
/// if the declared count disagrees with the payload length.
///
/// # Example
///
/// ```rust
/// use qsafe_allowlist::artifact;
///
/// let bytes = artifact::encode(&[0xAAAA, 0xBBBB]);
/// let hashes = artifact::decode(&bytes).unwrap();
/// assert_eq!(hashes, vec![0xAAAA, 0xBBBB]);
/// ```
pub fn decode(bytes: &[u8]) -> Result<Vec<ContextHash>> {
    if bytes.len() < ELEMENT_WIDTH {
        return Err(AllowlistError::TruncatedHeader { actual: bytes.len() });
    }

    let (header, payload) = bytes.split_at(ELEMENT_WIDTH);
    let declared = u64::from_le_bytes(header.try_into().expect("header is exactly 8 bytes"));

    if payload.len() % ELEMENT_WIDTH != 0 {
        return Err(AllowlistError::MisalignedPayload {
            payload_len: payload.len(),
            element_width: ELEMENT_WIDTH,
        });
    }

    let actual = (payload.len() / ELEMENT_WIDTH) as u64;
    if declared != actual {
        return Err(AllowlistError::CountMismatch { declared, actual });
    }

    Ok(payload
        .chunks_exact(ELEMENT_WIDTH)
        .map(|chunk| u64::from_le_bytes(chunk.try_into().expect("chunk is exactly 8 bytes")))
        .collect())
}

/// Encodes context hashes into the artifact wire format.
///
/// This is the writer half of the codec, used by operator tooling and
/// tests. Production monitors only decode.
#[must_use]
pub fn encode(hashes: &[ContextHash]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(ELEMENT_WIDTH * (hashes.len() + 1));
    bytes.extend_from_slice(&(hashes.len() as u64).to_le_bytes());
    for hash in hashes {
        bytes.extend_from_slice(&hash.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let hashes = vec![0x1111, 0x2222, 0xDEAD_BEEF_CAFE_F00D];
        let bytes = encode(&hashes);
        assert_eq!(decode(&bytes).unwrap(), hashes);
    }

    #[test]
    fn test_empty_artifact() {
        let bytes = encode(&[]);
        assert_eq!(bytes.len(), ELEMENT_WIDTH);
        assert!(decode(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_header_rejected() {
        let result = decode(&[0u8; 5]);
        assert!(matches!(
            result,
            Err(AllowlistError::TruncatedHeader { actual: 5 })
        ));
    }

    #[test]
    fn test_misaligned_payload_rejected() {
        let mut bytes = encode(&[0x1234]);
        bytes.push(0); // One stray byte after a valid artifact.
        assert!(matches!(
            decode(&bytes),
            Err(AllowlistError::MisalignedPayload { payload_len: 9, .. })
        ));
    }

    #[test]
    fn test_count_mismatch_rejected() {
        // Header declares 5 entries, payload holds 3.
        let mut bytes = 5u64.to_le_bytes().to_vec();
        for hash in [0x1u64, 0x2, 0x3] {
            bytes.extend_from_slice(&hash.to_le_bytes());
        }

        assert!(matches!(
            decode(&bytes),
            Err(AllowlistError::CountMismatch { declared: 5, actual: 3 })
        ));
    }

    // Security-focused tests
    #[test]
    fn test_security_overdeclared_count_never_reads_past_payload() {
        // A count of u64::MAX must fail the cross-check, not allocate.
        let mut bytes = u64::MAX.to_le_bytes().to_vec();
        bytes.extend_from_slice(&0x42u64.to_le_bytes());

        assert!(matches!(
            decode(&bytes),
            Err(AllowlistError::CountMismatch { .. })
        ));
    }

    #[test]
    fn test_security_underdeclared_count_rejected() {
        // Extra trailing entries beyond the declared count are suspect:
        // they could be garbage hashes smuggled into the store.
        let mut bytes = 1u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(&0x1u64.to_le_bytes());
        bytes.extend_from_slice(&0x2u64.to_le_bytes());

        assert!(matches!(
            decode(&bytes),
            Err(AllowlistError::CountMismatch { declared: 1, actual: 2 })
        ));
    }
}
