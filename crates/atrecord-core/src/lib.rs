//! # atrecord-core — Foundational Types for Record Verification
//!
//! This crate is the leaf of the workspace. It defines the data model that
//! every other crate speaks: structured values, their canonical byte form,
//! the content identifiers derived from those bytes, and the identity
//! primitives (DIDs, AT-URIs, DID documents) that name a repository.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** All hashing and signature checking flows
//!    through `CanonicalBytes::new()`. Map-key order, integer width and float
//!    width are fixed by the encoder, so two constructions of the same
//!    logical value always produce the same bytes.
//!
//! 2. **Byte equality for identifiers.** `Cid` compares by its binary form.
//!    String forms are parsed back into bytes before any comparison.
//!
//! 3. **Validated newtypes.** `Did`, `Nsid`, `RecordKey` and `AtUri` can only
//!    be constructed through validating constructors.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `atrecord-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests. Malformed input is always
//!   an `Err`, never a panic.

pub mod canonical;
pub mod cid;
pub mod decode;
pub mod did_document;
pub mod error;
pub mod identity;
pub mod multibase;
pub mod value;
pub mod varint;

// Re-export primary types for ergonomic imports.
pub use canonical::{CanonicalBytes, MAX_DEPTH};
pub use cid::{Cid, DAG_CBOR, RAW, SHA2_256};
pub use decode::decode;
pub use did_document::{DidDocument, Service, VerificationMethod};
pub use error::{
    CanonicalizationError, CidError, DataModelError, DecodeError, MultibaseError,
    ValidationError, VarintError,
};
pub use identity::{AtUri, Did, Nsid, RecordKey};
pub use value::Value;
