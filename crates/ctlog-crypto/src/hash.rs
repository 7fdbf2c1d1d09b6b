//! Hashing utilities using aws-lc-rs

use aws_lc_rs::digest::{self, SHA256};

/// Hash data using SHA-256
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let digest = digest::digest(&SHA256, data);
    let mut result = [0u8; 32];
    result.copy_from_slice(digest.as_ref());
    result
}

/// Lowercase hex SHA-256 fingerprint, as printed by `openssl x509 -fingerprint -sha256`
/// without the colons.
pub fn fingerprint(data: &[u8]) -> String {
    hex::encode(sha256(data))
}
