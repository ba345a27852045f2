//! # atrecord-crypto — Cryptographic Primitives
//!
//! Provides the cryptographic building blocks for record verification:
//!
//! - **SHA-256** helpers over `CanonicalBytes` and raw keys (for MST layer
//!   assignment).
//! - **Public keys** in the encodings a DID document may carry: `Multikey`,
//!   `did:key`, and the legacy `EcdsaSecp256*VerificationKey2019` forms.
//! - **ECDSA** verification for P-256 and secp256k1 over SHA-256 with
//!   64-byte compact signatures, rejecting high-S encodings.
//! - **Key extraction** from a resolved [`atrecord_core::DidDocument`].
//!
//! ## Crate Policy
//!
//! - Depends only on `atrecord-core` internally.
//! - No mocking of cryptographic operations in tests. All tests use real
//!   curve arithmetic and real SHA-256, and the fixed vectors were produced
//!   by an independent ECDSA implementation.
//! - No `unsafe` code.

pub mod did_keys;
pub mod ecdsa;
pub mod error;
pub mod multikey;
pub mod sha256;

pub use did_keys::{extract_signing_key, KeyExtractionError, KeyPolicy};
pub use ecdsa::{verify_signature, SigningKeypair, SIGNATURE_LEN};
pub use error::CryptoError;
pub use multikey::{KeyAlgorithm, PublicKey};
pub use sha256::{sha256, sha256_canonical};
