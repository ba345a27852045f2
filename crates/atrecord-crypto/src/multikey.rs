//! # Public Key Encodings
//!
//! A repository signing key appears in a DID document as a multibase
//! string. Three encodings are understood:
//!
//! - **Multikey**: `z` + base58btc(varint(multicodec) || compressed SEC1
//!   point). Multicodec `0x1200` is P-256, `0xe7` is secp256k1.
//! - **did:key**: `did:key:` followed by a Multikey string.
//! - **Legacy** `EcdsaSecp256k1VerificationKey2019` /
//!   `EcdsaSecp256r1VerificationKey2019`: `z` + base58btc(SEC1 point), the
//!   curve implied by the method type and no multicodec prefix.
//!
//! ## Security Invariant
//!
//! Decoding validates that the bytes are a point on the named curve.
//! A `PublicKey` value is therefore always usable for verification.

use std::fmt;

use atrecord_core::multibase::{self, Base};
use atrecord_core::varint;

use crate::error::CryptoError;

/// Multicodec for a compressed P-256 public key.
pub const P256_PUB_MULTICODEC: u64 = 0x1200;
/// Multicodec for a compressed secp256k1 public key.
pub const SECP256K1_PUB_MULTICODEC: u64 = 0xe7;

const DID_KEY_PREFIX: &str = "did:key:";

/// Signature algorithm of a repository key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    /// NIST P-256 (`ES256`).
    P256,
    /// secp256k1 (`ES256K`).
    Secp256k1,
}

impl KeyAlgorithm {
    /// Human-readable curve name.
    pub fn curve_name(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::Secp256k1 => "secp256k1",
        }
    }

    /// The JWT-style algorithm name.
    pub fn jwt_name(self) -> &'static str {
        match self {
            Self::P256 => "ES256",
            Self::Secp256k1 => "ES256K",
        }
    }

    /// The Multikey multicodec for public keys on this curve.
    pub fn multicodec(self) -> u64 {
        match self {
            Self::P256 => P256_PUB_MULTICODEC,
            Self::Secp256k1 => SECP256K1_PUB_MULTICODEC,
        }
    }

    fn from_multicodec(code: u64) -> Result<Self, CryptoError> {
        match code {
            P256_PUB_MULTICODEC => Ok(Self::P256),
            SECP256K1_PUB_MULTICODEC => Ok(Self::Secp256k1),
            other => Err(CryptoError::UnsupportedMulticodec(other)),
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.curve_name())
    }
}

/// A validated public key on one of the supported curves.
#[derive(Clone, PartialEq, Eq)]
pub enum PublicKey {
    /// NIST P-256 verifying key.
    P256(p256::ecdsa::VerifyingKey),
    /// secp256k1 verifying key.
    Secp256k1(k256::ecdsa::VerifyingKey),
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

impl PublicKey {
    /// Parse a SEC1 point (compressed or uncompressed) on `algorithm`'s curve.
    pub fn from_sec1(algorithm: KeyAlgorithm, bytes: &[u8]) -> Result<Self, CryptoError> {
        let invalid = |reason: String| CryptoError::InvalidPublicKey {
            algorithm: algorithm.curve_name(),
            reason,
        };
        match algorithm {
            KeyAlgorithm::P256 => p256::ecdsa::VerifyingKey::from_sec1_bytes(bytes)
                .map(Self::P256)
                .map_err(|e| invalid(e.to_string())),
            KeyAlgorithm::Secp256k1 => k256::ecdsa::VerifyingKey::from_sec1_bytes(bytes)
                .map(Self::Secp256k1)
                .map_err(|e| invalid(e.to_string())),
        }
    }

    /// Parse a `publicKeyMultibase` value in Multikey form.
    pub fn from_multikey(multikey: &str) -> Result<Self, CryptoError> {
        let bytes = decode_base58btc(multikey)?;
        let (code, used) = varint::read_u64(&bytes)?;
        let algorithm = KeyAlgorithm::from_multicodec(code)?;
        Self::from_sec1(algorithm, &bytes[used..])
    }

    /// Parse a `did:key:` identifier.
    pub fn from_did_key(did: &str) -> Result<Self, CryptoError> {
        let multikey = did
            .strip_prefix(DID_KEY_PREFIX)
            .ok_or_else(|| CryptoError::NotDidKey(did.to_string()))?;
        Self::from_multikey(multikey)
    }

    /// Parse a legacy `publicKeyMultibase` value whose curve is implied by the
    /// verification method type.
    pub fn from_legacy_multibase(
        algorithm: KeyAlgorithm,
        encoded: &str,
    ) -> Result<Self, CryptoError> {
        let bytes = decode_base58btc(encoded)?;
        Self::from_sec1(algorithm, &bytes)
    }

    /// Curve of this key.
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            Self::P256(_) => KeyAlgorithm::P256,
            Self::Secp256k1(_) => KeyAlgorithm::Secp256k1,
        }
    }

    /// Compressed SEC1 encoding (33 bytes).
    pub fn to_sec1_compressed(&self) -> Vec<u8> {
        match self {
            Self::P256(vk) => vk.to_encoded_point(true).as_bytes().to_vec(),
            Self::Secp256k1(vk) => vk.to_encoded_point(true).as_bytes().to_vec(),
        }
    }

    /// Render as a Multikey `publicKeyMultibase` string.
    pub fn to_multikey(&self) -> String {
        let mut bytes = varint::encode_u64(self.algorithm().multicodec());
        bytes.extend_from_slice(&self.to_sec1_compressed());
        multibase::encode(Base::Base58Btc, &bytes)
    }

    /// Render as a `did:key:` identifier.
    pub fn to_did_key(&self) -> String {
        format!("{DID_KEY_PREFIX}{}", self.to_multikey())
    }
}

fn decode_base58btc(encoded: &str) -> Result<Vec<u8>, CryptoError> {
    let (base, bytes) = multibase::decode(encoded)?;
    if base != Base::Base58Btc {
        return Err(CryptoError::WrongMultibase(match base {
            Base::Base32Lower | Base::Base32Upper => "base32",
            Base::Base58Btc => "base58btc",
        }));
    }
    Ok(bytes)
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}, {})", self.algorithm(), self.to_multikey())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_did_key())
    }
}
