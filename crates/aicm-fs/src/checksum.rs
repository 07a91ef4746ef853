//! SHA-256 checksum utilities
//!
//! One canonical format, `sha256:<hex>`, used to seal backup payloads.

use sha2::{Digest, Sha256};

const PREFIX: &str = "sha256:";

/// Checksum of raw bytes in the canonical `sha256:<hex>` form.
pub fn compute_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Does `content` hash to `expected`?
pub fn verify_checksum(content: &[u8], expected: &str) -> bool {
    compute_checksum(content) == expected
}
