//! CRC-32 computation for log records
//!
//! Uses the CRC-32 IEEE polynomial. The checksum of a serialized record
//! covers every byte after the checksum field itself, so the encoder can lay
//! down a zero placeholder, hash the rest, and patch the result in one pass.

use crc32fast::Hasher;

/// Computes a CRC-32 (IEEE) checksum over the provided bytes.
///
/// Deterministic: the same input always produces the same output.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Verifies that the computed checksum matches the expected value.
pub fn verify_checksum(data: &[u8], expected: u32) -> bool {
    compute_checksum(data) == expected
}
