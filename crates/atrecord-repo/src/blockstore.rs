//! # Content-Addressed Block Store
//!
//! An in-memory map from [`Cid`] to raw block bytes, filled from a CAR
//! container or by the MST builder.
//!
//! ## Security Invariant
//!
//! Blocks are returned exactly as stored. Whether they hash to their CID
//! is checked when they enter the store from a container
//! (see [`crate::car::CarLimits::verify_block_digests`]) and by
//! [`BlockStore::put`], which derives the CID from the bytes itself.

use std::collections::HashMap;

use atrecord_core::decode::decode_with_depth;
use atrecord_core::{CanonicalBytes, CanonicalizationError, Cid, Value, MAX_DEPTH};

use crate::error::BlockError;

/// In-memory content-addressed block storage.
#[derive(Debug, Clone)]
pub struct BlockStore {
    blocks: HashMap<Cid, Vec<u8>>,
    max_decode_depth: usize,
}

impl Default for BlockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            blocks: HashMap::new(),
            max_decode_depth: MAX_DEPTH,
        }
    }

    /// Set the nesting limit used when decoding blocks.
    pub fn with_decode_depth(mut self, max_depth: usize) -> Self {
        self.max_decode_depth = max_depth;
        self
    }

    /// Insert raw bytes under `cid`. The first block stored for a CID wins;
    /// returns `false` if one was already present.
    pub fn insert(&mut self, cid: Cid, bytes: Vec<u8>) -> bool {
        match self.blocks.entry(cid) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(bytes);
                true
            }
        }
    }

    /// Canonically encode `value`, store it, and return its CID.
    pub fn put(&mut self, value: &Value) -> Result<Cid, CanonicalizationError> {
        let bytes = CanonicalBytes::new(value)?;
        let cid = bytes.cid();
        self.insert(cid.clone(), bytes.into_vec());
        Ok(cid)
    }

    /// Raw bytes of a block.
    pub fn get(&self, cid: &Cid) -> Option<&[u8]> {
        self.blocks.get(cid).map(Vec::as_slice)
    }

    /// Raw bytes of a block, or [`BlockError::NotFound`].
    pub fn get_required(&self, cid: &Cid) -> Result<&[u8], BlockError> {
        self.get(cid).ok_or_else(|| BlockError::NotFound(cid.clone()))
    }

    pub fn contains(&self, cid: &Cid) -> bool {
        self.blocks.contains_key(cid)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// All stored CIDs, in no particular order.
    pub fn cids(&self) -> impl Iterator<Item = &Cid> {
        self.blocks.keys()
    }

    /// Iterate `(cid, bytes)` pairs, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&Cid, &[u8])> {
        self.blocks.iter().map(|(c, b)| (c, b.as_slice()))
    }

    /// Decode a block as DAG-CBOR.
    pub fn read_value(&self, cid: &Cid) -> Result<Value, BlockError> {
        let bytes = self.get_required(cid)?;
        decode_with_depth(bytes, self.max_decode_depth).map_err(|source| BlockError::Decode {
            cid: cid.clone(),
            source,
        })
    }

    /// Decode a block and convert it with `shape`.
    ///
    /// A missing block is [`BlockError::NotFound`]; undecodable bytes are
    /// [`BlockError::Decode`]; a `shape` rejection is
    /// [`BlockError::ShapeMismatch`] carrying the rejection's message.
    pub fn read_block<T, E, F>(&self, cid: &Cid, shape: F) -> Result<T, BlockError>
    where
        F: FnOnce(Value) -> Result<T, E>,
        E: std::fmt::Display,
    {
        let value = self.read_value(cid)?;
        shape(value).map_err(|e| BlockError::ShapeMismatch {
            cid: cid.clone(),
            reason: e.to_string(),
        })
    }
}
