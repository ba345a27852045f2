//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types produced by the core data model. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Decoding errors carry the byte offset where parsing stopped.
//! - Identifier errors carry the offending input so diagnostics can show it.
//! - Nothing in this crate panics on malformed input; every failure is one
//!   of the variants below.

use thiserror::Error;

/// Error while producing canonical bytes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CanonicalizationError {
    /// NaN and the infinities have no canonical encoding.
    #[error("non-finite float cannot be canonically encoded: {0}")]
    NonFiniteFloat(f64),

    /// The value nests deeper than the encoder allows.
    #[error("value nesting exceeds maximum depth of {0}")]
    DepthExceeded(usize),
}

/// Error while decoding DAG-CBOR bytes into a [`crate::Value`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Input ended in the middle of an item.
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof {
        /// Offset at which more bytes were required.
        offset: usize,
    },

    /// Indefinite-length items are not part of the canonical subset.
    #[error("indefinite-length item at offset {offset}")]
    IndefiniteLength {
        /// Offset of the item header.
        offset: usize,
    },

    /// Additional-information values 28..=30 are reserved.
    #[error("reserved additional information {info} at offset {offset}")]
    ReservedInfo {
        /// The reserved additional-information value.
        info: u8,
        /// Offset of the item header.
        offset: usize,
    },

    /// Integer does not fit the signed 64-bit range of the data model.
    #[error("integer out of range at offset {offset}")]
    IntegerOutOfRange {
        /// Offset of the item header.
        offset: usize,
    },

    /// Text string is not valid UTF-8.
    #[error("invalid UTF-8 in text string at offset {offset}")]
    InvalidUtf8 {
        /// Offset of the string payload.
        offset: usize,
    },

    /// Map key is not a text string.
    #[error("map key at offset {offset} is not a text string")]
    NonStringKey {
        /// Offset of the key item.
        offset: usize,
    },

    /// The same key appears twice in one map.
    #[error("duplicate map key {key:?}")]
    DuplicateKey {
        /// The repeated key.
        key: String,
    },

    /// Only tag 42 (CID link) is permitted.
    #[error("unsupported tag {tag} at offset {offset}")]
    UnsupportedTag {
        /// The tag number found.
        tag: u64,
        /// Offset of the tag header.
        offset: usize,
    },

    /// A tag-42 payload is not a valid link.
    #[error("invalid CID link at offset {offset}: {reason}")]
    InvalidLink {
        /// Offset of the tag payload.
        offset: usize,
        /// Why the link failed to parse.
        reason: String,
    },

    /// Simple value other than false/true/null.
    #[error("unsupported simple value {value} at offset {offset}")]
    UnsupportedSimple {
        /// The simple value number.
        value: u8,
        /// Offset of the item header.
        offset: usize,
    },

    /// Half- and single-precision floats, NaN and infinities are rejected.
    #[error("non-canonical float at offset {offset}")]
    NonCanonicalFloat {
        /// Offset of the item header.
        offset: usize,
    },

    /// Nesting exceeds the decoder's depth limit.
    #[error("nesting exceeds maximum depth of {max}")]
    DepthExceeded {
        /// The configured limit.
        max: usize,
    },

    /// Bytes remain after the top-level item.
    #[error("{remaining} trailing bytes after top-level item")]
    TrailingBytes {
        /// Number of unconsumed bytes.
        remaining: usize,
    },
}

/// Error in unsigned-varint decoding.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarintError {
    /// Input ended before the final varint byte.
    #[error("truncated varint")]
    Truncated,

    /// More than nine bytes, i.e. larger than 2^63 - 1.
    #[error("varint overflows 63 bits")]
    Overflow,

    /// Trailing zero continuation byte.
    #[error("varint is not minimally encoded")]
    NotMinimal,
}

/// Error in multibase decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultibaseError {
    /// Empty input.
    #[error("empty multibase string")]
    Empty,

    /// Prefix character names a base this crate does not implement.
    #[error("unsupported multibase prefix {0:?}")]
    UnsupportedBase(char),

    /// A character outside the base's alphabet.
    #[error("invalid {base} character {ch:?}")]
    InvalidCharacter {
        /// The alphabet being decoded.
        base: &'static str,
        /// The offending character.
        ch: char,
    },
}

/// Error parsing or computing a content identifier (the `MalformedCid` kind).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CidError {
    /// Empty string or byte slice.
    #[error("empty CID")]
    Empty,

    /// Multibase layer failed.
    #[error("malformed CID: {0}")]
    Multibase(#[from] MultibaseError),

    /// Varint layer failed.
    #[error("malformed CID: {0}")]
    Varint(#[from] VarintError),

    /// CID version other than 0 or 1.
    #[error("unsupported CID version {0}")]
    UnsupportedVersion(u64),

    /// Digest length disagrees with the multihash header or exceeds limits.
    #[error("bad multihash digest length: declared {declared}, available {available}")]
    DigestLength {
        /// Length declared in the multihash header.
        declared: u64,
        /// Bytes actually available.
        available: usize,
    },

    /// Bytes remain after a complete CID.
    #[error("{0} trailing bytes after CID")]
    TrailingBytes(usize),

    /// Multihash function this crate cannot compute.
    #[error("unsupported multihash function 0x{0:x}")]
    UnsupportedHash(u64),
}

/// Error bridging the JSON representation of the data model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataModelError {
    /// `{"$link": ...}` object with an unparseable CID.
    #[error("invalid $link: {0}")]
    InvalidLink(#[from] CidError),

    /// `{"$bytes": ...}` object with invalid base64.
    #[error("invalid $bytes: {0}")]
    InvalidBytes(String),

    /// JSON number outside the signed 64-bit integer range.
    #[error("number out of range: {0}")]
    NumberOutOfRange(String),
}

/// Error validating an identifier string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Not a syntactically valid DID.
    #[error("invalid DID: {0:?}")]
    InvalidDid(String),

    /// Not a syntactically valid NSID.
    #[error("invalid NSID: {0:?}")]
    InvalidNsid(String),

    /// Not a syntactically valid record key.
    #[error("invalid record key: {0:?}")]
    InvalidRecordKey(String),

    /// Not a syntactically valid handle.
    #[error("invalid handle: {0:?}")]
    InvalidHandle(String),

    /// AT-URI failed to parse.
    #[error("invalid AT-URI {uri:?}: {reason}")]
    InvalidAtUri {
        /// The input URI.
        uri: String,
        /// What was wrong with it.
        reason: String,
    },
}
