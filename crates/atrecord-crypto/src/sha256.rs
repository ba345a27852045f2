//! # SHA-256 Digest Computation
//!
//! Thin helpers over `sha2`. Content hashes of blocks go through
//! [`atrecord_core::Cid::compute`]; these helpers cover the remaining uses:
//! hashing canonical commit bytes and hashing MST keys to find their layer.

use atrecord_core::CanonicalBytes;
use sha2::{Digest, Sha256};

/// SHA-256 of arbitrary bytes.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 of canonical bytes.
pub fn sha256_canonical(data: &CanonicalBytes) -> [u8; 32] {
    sha256(data.as_bytes())
}
