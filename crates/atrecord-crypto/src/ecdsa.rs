//! # ECDSA Signing and Verification
//!
//! Repository commits are signed with ECDSA over SHA-256 on either NIST
//! P-256 or secp256k1. Signatures are the 64-byte compact `r || s` form.
//!
//! ## Security Invariant
//!
//! - The message MUST be `&CanonicalBytes`. A commit is only ever checked
//!   against the canonical encoding of its unsigned form, never against
//!   bytes as they happened to arrive.
//! - High-S signatures are rejected. Each valid `(r, s)` has a malleable
//!   twin `(r, n - s)`; only the low-S member is accepted.
//! - Verification never panics. Wrong lengths, zero scalars and
//!   out-of-range scalars all yield `false`.
//! - Private keys are never serialized or logged. `SigningKeypair` does
//!   not implement `Serialize` and its `Debug` shows only the public key.

use atrecord_core::CanonicalBytes;
use p256::ecdsa::signature::{Signer, Verifier};

use crate::error::CryptoError;
use crate::multikey::{KeyAlgorithm, PublicKey};

/// Length of a compact `r || s` signature.
pub const SIGNATURE_LEN: usize = 64;

/// Verify a compact signature over canonical bytes.
///
/// Returns `false` for any malformed, high-S or non-matching signature.
pub fn verify_signature(key: &PublicKey, signature: &[u8], message: &CanonicalBytes) -> bool {
    if signature.len() != SIGNATURE_LEN {
        return false;
    }
    match key {
        PublicKey::P256(vk) => {
            let Ok(sig) = p256::ecdsa::Signature::from_slice(signature) else {
                return false;
            };
            if sig.normalize_s().is_some() {
                return false;
            }
            vk.verify(message.as_bytes(), &sig).is_ok()
        }
        PublicKey::Secp256k1(vk) => {
            let Ok(sig) = k256::ecdsa::Signature::from_slice(signature) else {
                return false;
            };
            if sig.normalize_s().is_some() {
                return false;
            }
            vk.verify(message.as_bytes(), &sig).is_ok()
        }
    }
}

// ---------------------------------------------------------------------------
// SigningKeypair
// ---------------------------------------------------------------------------

enum SigningKey {
    P256(p256::ecdsa::SigningKey),
    Secp256k1(k256::ecdsa::SigningKey),
}

/// A repository signing key.
///
/// Used to produce commits for test repositories and local fixtures.
/// Signatures are deterministic (RFC 6979) and always low-S.
pub struct SigningKeypair {
    key: SigningKey,
}

impl SigningKeypair {
    /// Generate a fresh key from the OS random source.
    pub fn generate(algorithm: KeyAlgorithm) -> Self {
        let mut rng = rand::rngs::OsRng;
        let key = match algorithm {
            KeyAlgorithm::P256 => SigningKey::P256(p256::ecdsa::SigningKey::random(&mut rng)),
            KeyAlgorithm::Secp256k1 => {
                SigningKey::Secp256k1(k256::ecdsa::SigningKey::random(&mut rng))
            }
        };
        Self { key }
    }

    /// Build a key from a 32-byte big-endian secret scalar.
    ///
    /// # Errors
    ///
    /// Fails if the scalar is zero or not below the curve order.
    pub fn from_seed(algorithm: KeyAlgorithm, seed: &[u8; 32]) -> Result<Self, CryptoError> {
        let invalid = || CryptoError::InvalidSeed {
            algorithm: algorithm.curve_name(),
        };
        let key = match algorithm {
            KeyAlgorithm::P256 => {
                SigningKey::P256(p256::ecdsa::SigningKey::from_slice(seed).map_err(|_| invalid())?)
            }
            KeyAlgorithm::Secp256k1 => {
                SigningKey::Secp256k1(k256::ecdsa::SigningKey::from_slice(seed).map_err(|_| invalid())?)
            }
        };
        Ok(Self { key })
    }

    /// Curve of this key.
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self.key {
            SigningKey::P256(_) => KeyAlgorithm::P256,
            SigningKey::Secp256k1(_) => KeyAlgorithm::Secp256k1,
        }
    }

    /// The matching public key.
    pub fn public_key(&self) -> PublicKey {
        match &self.key {
            SigningKey::P256(sk) => PublicKey::P256(sk.verifying_key().clone()),
            SigningKey::Secp256k1(sk) => PublicKey::Secp256k1(sk.verifying_key().clone()),
        }
    }

    /// Sign canonical bytes, returning a low-S compact signature.
    pub fn sign(&self, message: &CanonicalBytes) -> [u8; SIGNATURE_LEN] {
        let mut out = [0u8; SIGNATURE_LEN];
        match &self.key {
            SigningKey::P256(sk) => {
                let sig: p256::ecdsa::Signature = sk.sign(message.as_bytes());
                let sig = sig.normalize_s().unwrap_or(sig);
                out.copy_from_slice(&sig.to_bytes());
            }
            SigningKey::Secp256k1(sk) => {
                let sig: k256::ecdsa::Signature = sk.sign(message.as_bytes());
                let sig = sig.normalize_s().unwrap_or(sig);
                out.copy_from_slice(&sig.to_bytes());
            }
        }
        out
    }
}

impl std::fmt::Debug for SigningKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeypair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}
