//! # Error Types
//!
//! Failures while decoding key material or producing signatures.
//! Verification itself never errors: a signature either checks out or it
//! does not.

use atrecord_core::error::{MultibaseError, VarintError};
use thiserror::Error;

/// Error in key decoding or signing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CryptoError {
    /// The multibase wrapper around key material is malformed.
    #[error("key multibase: {0}")]
    Multibase(#[from] MultibaseError),

    /// The multicodec prefix of a Multikey could not be read.
    #[error("key multicodec prefix: {0}")]
    Multicodec(#[from] VarintError),

    /// Multikey carries a codec other than P-256 or secp256k1 public keys.
    #[error("unsupported key multicodec 0x{0:x}")]
    UnsupportedMulticodec(u64),

    /// Multikey must use base58btc (`z`) encoding.
    #[error("multikey must be base58btc encoded, found {0:?} base")]
    WrongMultibase(&'static str),

    /// `did:key` string lacks the `did:key:` prefix.
    #[error("not a did:key identifier: {0}")]
    NotDidKey(String),

    /// The bytes do not encode a point on the named curve.
    #[error("invalid {algorithm} public key: {reason}")]
    InvalidPublicKey {
        /// Curve the key was decoded for.
        algorithm: &'static str,
        /// Underlying parse failure.
        reason: String,
    },

    /// A seed could not be turned into a signing key.
    #[error("invalid signing key seed for {algorithm}")]
    InvalidSeed {
        /// Curve the seed was intended for.
        algorithm: &'static str,
    },
}
