//! # Signing Key Extraction
//!
//! Selects the repository signing key from a resolved DID document. The
//! `#atproto` verification method is preferred; otherwise the first method
//! carrying `publicKeyMultibase` is used. Once a method is chosen its
//! material must decode. A malformed `#atproto` key is an error, not a
//! reason to fall through to some other key in the document.

use atrecord_core::{DidDocument, VerificationMethod};
use thiserror::Error;

use crate::error::CryptoError;
use crate::multikey::{KeyAlgorithm, PublicKey};

/// Verification method type for Multikey-encoded keys.
pub const MULTIKEY_TYPE: &str = "Multikey";
/// Legacy secp256k1 verification method type.
pub const LEGACY_SECP256K1_TYPE: &str = "EcdsaSecp256k1VerificationKey2019";
/// Legacy P-256 verification method type.
pub const LEGACY_P256_TYPE: &str = "EcdsaSecp256r1VerificationKey2019";

/// Which key encodings to accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyPolicy {
    /// Accept the `EcdsaSecp256*VerificationKey2019` method types.
    pub accept_legacy_key_types: bool,
}

/// Why no signing key could be taken from a DID document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KeyExtractionError {
    /// No verification method carries key material at all.
    #[error("DID document {did} has no verification method with key material")]
    NoVerificationMaterial {
        /// The document's `id`.
        did: String,
    },

    /// The chosen method's type is not a supported key encoding.
    #[error("verification method {method_id} has unsupported type {method_type:?}")]
    UnsupportedType {
        /// Method id.
        method_id: String,
        /// Declared method type.
        method_type: String,
    },

    /// The chosen method's material does not decode to a valid key.
    #[error("verification method {method_id} key material is invalid: {source}")]
    InvalidMaterial {
        /// Method id.
        method_id: String,
        /// Decoding failure.
        #[source]
        source: CryptoError,
    },
}

/// Extract the repository signing key from `doc`.
pub fn extract_signing_key(
    doc: &DidDocument,
    policy: KeyPolicy,
) -> Result<PublicKey, KeyExtractionError> {
    let (method, encoded) = doc
        .signing_key_candidates()
        .find_map(|m| m.public_key_multibase.as_deref().map(|k| (m, k)))
        .ok_or_else(|| KeyExtractionError::NoVerificationMaterial {
            did: doc.id.clone(),
        })?;

    tracing::debug!(
        method_id = %method.id,
        method_type = %method.method_type,
        "selected verification method"
    );

    let decoded = match method.method_type.as_str() {
        MULTIKEY_TYPE => PublicKey::from_multikey(encoded),
        LEGACY_SECP256K1_TYPE if policy.accept_legacy_key_types => {
            PublicKey::from_legacy_multibase(KeyAlgorithm::Secp256k1, encoded)
        }
        LEGACY_P256_TYPE if policy.accept_legacy_key_types => {
            PublicKey::from_legacy_multibase(KeyAlgorithm::P256, encoded)
        }
        _ => return Err(unsupported(method)),
    };
    decoded.map_err(|source| KeyExtractionError::InvalidMaterial {
        method_id: method.id.clone(),
        source,
    })
}

fn unsupported(method: &VerificationMethod) -> KeyExtractionError {
    KeyExtractionError::UnsupportedType {
        method_id: method.id.clone(),
        method_type: method.method_type.clone(),
    }
}
