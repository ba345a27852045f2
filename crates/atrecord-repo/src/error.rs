//! # Error Types
//!
//! One enum per structure, plus [`RepoError`] for callers that load a whole
//! repository at once. Block *absence* and block *shape* failures are
//! separate variants so that callers can tell "the host did not send it"
//! from "the host sent something malformed".

use atrecord_core::{CanonicalizationError, Cid, CidError, DecodeError, ValidationError};
use atrecord_core::error::VarintError;
use thiserror::Error;

/// Error reading or writing a CAR v1 container.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CarError {
    /// Whole container exceeds the configured size.
    #[error("CAR is {size} bytes, limit is {limit}")]
    TooLarge {
        /// Container size.
        size: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// Header length prefix is unreadable.
    #[error("CAR header length: {0}")]
    HeaderLength(VarintError),

    /// Header length prefix points past the end of input.
    #[error("CAR header truncated: declared {declared} bytes, {available} available")]
    HeaderTruncated {
        /// Declared header length.
        declared: u64,
        /// Bytes remaining.
        available: usize,
    },

    /// Header bytes are not DAG-CBOR.
    #[error("CAR header is not DAG-CBOR: {0}")]
    HeaderDecode(DecodeError),

    /// Header decoded but lacks the required fields.
    #[error("invalid CAR header: {0}")]
    InvalidHeader(String),

    /// Only CAR v1 is supported.
    #[error("unsupported CAR version {0}")]
    UnsupportedVersion(i64),

    /// A block frame's length prefix is unreadable.
    #[error("block frame at offset {offset}: {source}")]
    FrameLength {
        /// Offset of the frame.
        offset: usize,
        /// Varint failure.
        #[source]
        source: VarintError,
    },

    /// A block frame declares zero length.
    #[error("zero-length block frame at offset {offset}")]
    ZeroLengthFrame {
        /// Offset of the frame.
        offset: usize,
    },

    /// A block frame extends past the end of input.
    #[error("block frame at offset {offset} truncated: declared {declared} bytes, {available} available")]
    FrameTruncated {
        /// Offset of the frame.
        offset: usize,
        /// Declared frame length.
        declared: u64,
        /// Bytes remaining.
        available: usize,
    },

    /// A block frame's CID is malformed or truncated.
    #[error("block frame at offset {offset} has malformed CID: {source}")]
    FrameCid {
        /// Offset of the frame.
        offset: usize,
        /// CID failure.
        #[source]
        source: CidError,
    },

    /// A block exceeds the configured per-block size.
    #[error("block {cid} is {size} bytes, limit is {limit}")]
    BlockTooLarge {
        /// The block's CID.
        cid: Cid,
        /// Block size.
        size: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// A block's bytes do not hash to its CID.
    #[error("block content does not match CID {cid}")]
    DigestMismatch {
        /// The claimed CID.
        cid: Cid,
    },

    /// A block's CID uses a hash function that cannot be checked.
    #[error("block {cid} cannot be verified: {source}")]
    UnverifiableBlock {
        /// The claimed CID.
        cid: Cid,
        /// Hash failure.
        #[source]
        source: CidError,
    },

    /// Header could not be encoded when writing.
    #[error("CAR header encoding: {0}")]
    HeaderEncode(CanonicalizationError),
}

/// Error reading a block out of a [`crate::BlockStore`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BlockError {
    /// No block with this CID is present.
    #[error("block {0} not found")]
    NotFound(Cid),

    /// The block is present but not valid DAG-CBOR.
    #[error("block {cid} is not valid DAG-CBOR: {source}")]
    Decode {
        /// The block's CID.
        cid: Cid,
        /// Decode failure.
        #[source]
        source: DecodeError,
    },

    /// The block decoded but does not have the expected shape.
    #[error("block {cid} has unexpected shape: {reason}")]
    ShapeMismatch {
        /// The block's CID.
        cid: Cid,
        /// What the shape check rejected.
        reason: String,
    },
}

impl BlockError {
    /// True for [`BlockError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Error interpreting a value as a signed commit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommitError {
    /// The commit is not a map.
    #[error("commit is a {0}, expected map")]
    NotAMap(&'static str),

    /// A required field is absent.
    #[error("commit field {0:?} is missing")]
    MissingField(&'static str),

    /// A field has the wrong kind.
    #[error("commit field {field:?} is a {found}, expected {expected}")]
    WrongType {
        /// Field name.
        field: &'static str,
        /// Expected kind.
        expected: &'static str,
        /// Actual kind.
        found: &'static str,
    },

    /// Commit format version is not 2 or 3.
    #[error("unsupported commit version {0}")]
    UnsupportedVersion(i64),

    /// The `did` field is not a valid DID.
    #[error("commit did: {0}")]
    InvalidDid(#[from] ValidationError),

    /// The unsigned commit could not be canonically encoded.
    #[error("commit encoding: {0}")]
    Encode(#[from] CanonicalizationError),
}

/// Error walking, searching or building a Merkle Search Tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MstError {
    /// A tree node could not be loaded.
    #[error("MST node: {0}")]
    Node(#[from] BlockError),

    /// An entry's prefix length exceeds the previous key in its node.
    #[error("MST node {node} entry {index}: prefix length {prefix_len} exceeds previous key length {previous_len}")]
    PrefixOutOfRange {
        /// Node CID.
        node: Cid,
        /// Entry index within the node.
        index: usize,
        /// Declared shared-prefix length.
        prefix_len: usize,
        /// Length of the previous key.
        previous_len: usize,
    },

    /// A reconstructed key is not UTF-8.
    #[error("MST node {node} entry {index}: key is not UTF-8")]
    InvalidKey {
        /// Node CID.
        node: Cid,
        /// Entry index within the node.
        index: usize,
    },

    /// Keys are not strictly ascending.
    #[error("MST keys out of order at {key:?} (node {node})")]
    KeyOrder {
        /// Node CID.
        node: Cid,
        /// The out-of-order key.
        key: String,
    },

    /// A node is reachable twice.
    #[error("MST cycle through node {0}")]
    Cycle(Cid),

    /// The walk visited more nodes than the store holds blocks.
    #[error("MST walk exceeded budget of {0} nodes")]
    BudgetExceeded(usize),

    /// An empty key was added to a builder.
    #[error("MST keys must be non-empty")]
    EmptyKey,

    /// A node could not be canonically encoded while building.
    #[error("MST node encoding: {0}")]
    Encode(#[from] CanonicalizationError),
}

/// Any failure loading or querying a repository.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepoError {
    /// Container failure.
    #[error(transparent)]
    Car(#[from] CarError),

    /// Block lookup failure.
    #[error(transparent)]
    Block(#[from] BlockError),

    /// Commit failure.
    #[error(transparent)]
    Commit(#[from] CommitError),

    /// Tree failure.
    #[error(transparent)]
    Mst(#[from] MstError),

    /// The container does not have exactly one root.
    #[error("expected exactly one root, found {0}")]
    RootCount(usize),
}
