//! # CAR v1 Containers
//!
//! A CAR file is a varint-length-prefixed DAG-CBOR header
//! `{version: 1, roots: [link]}` followed by block frames, each
//! `varint(len) || CID || data` with `len` covering CID and data.
//!
//! [`CarReader`] yields blocks lazily; [`read_car`] collects them into a
//! [`BlockStore`]. [`write_car`] produces containers from a store.
//!
//! ## Security Invariant
//!
//! Input comes from an untrusted host. Every truncation (length prefix,
//! CID or body) and every zero-length frame is a fatal error rather than a
//! quiet end of stream, so a cut-off container can never pass as a
//! shorter valid one. With `verify_block_digests` set, every block is
//! re-hashed and compared to its CID before it is handed out.
//!
//! The reader places no constraint on the number of roots; single-root
//! policy belongs to callers.

use atrecord_core::decode::decode_with_depth;
use atrecord_core::{canonical, varint, Cid, Value};

use crate::blockstore::BlockStore;
use crate::error::CarError;

/// The only supported CAR version.
pub const CAR_VERSION: i64 = 1;

/// Default limit on the whole container.
pub const DEFAULT_MAX_CAR_BYTES: usize = 64 * 1024 * 1024;
/// Default limit on a single block's data.
pub const DEFAULT_MAX_BLOCK_BYTES: usize = 2 * 1024 * 1024;

/// Resource limits and checks applied while reading a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarLimits {
    /// Reject containers larger than this many bytes.
    pub max_car_bytes: usize,
    /// Reject blocks whose data exceeds this many bytes.
    pub max_block_bytes: usize,
    /// Re-hash each block and compare to its CID.
    pub verify_block_digests: bool,
    /// Nesting limit for the header and for blocks decoded from the store.
    pub max_decode_depth: usize,
}

impl Default for CarLimits {
    fn default() -> Self {
        Self {
            max_car_bytes: DEFAULT_MAX_CAR_BYTES,
            max_block_bytes: DEFAULT_MAX_BLOCK_BYTES,
            verify_block_digests: true,
            max_decode_depth: atrecord_core::MAX_DEPTH,
        }
    }
}

/// Parsed CAR header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarHeader {
    pub version: i64,
    pub roots: Vec<Cid>,
}

impl CarHeader {
    fn from_value(value: &Value) -> Result<Self, CarError> {
        let map = value
            .as_map()
            .ok_or_else(|| CarError::InvalidHeader(format!("header is a {}", value.kind())))?;
        let version = map
            .get("version")
            .ok_or_else(|| CarError::InvalidHeader("missing version".into()))?
            .as_integer()
            .ok_or_else(|| CarError::InvalidHeader("version is not an integer".into()))?;
        if version != CAR_VERSION {
            return Err(CarError::UnsupportedVersion(version));
        }
        let roots = map
            .get("roots")
            .ok_or_else(|| CarError::InvalidHeader("missing roots".into()))?
            .as_list()
            .ok_or_else(|| CarError::InvalidHeader("roots is not a list".into()))?
            .iter()
            .map(|r| {
                r.as_link()
                    .cloned()
                    .ok_or_else(|| CarError::InvalidHeader(format!("root is a {}", r.kind())))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { version, roots })
    }

    fn to_value(&self) -> Value {
        Value::map([
            ("version", Value::Integer(self.version)),
            (
                "roots",
                Value::List(self.roots.iter().cloned().map(Value::Link).collect()),
            ),
        ])
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Lazy iterator over the blocks of a CAR container.
///
/// Yields `Ok((cid, data))` per frame and stops after the first `Err`.
#[derive(Debug)]
pub struct CarReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    header: CarHeader,
    limits: CarLimits,
    done: bool,
}

impl<'a> CarReader<'a> {
    /// Parse the header with default limits.
    pub fn new(bytes: &'a [u8]) -> Result<Self, CarError> {
        Self::with_limits(bytes, CarLimits::default())
    }

    /// Parse the header with explicit limits.
    pub fn with_limits(bytes: &'a [u8], limits: CarLimits) -> Result<Self, CarError> {
        if bytes.len() > limits.max_car_bytes {
            return Err(CarError::TooLarge {
                size: bytes.len(),
                limit: limits.max_car_bytes,
            });
        }
        let (header_len, used) = varint::read_u64(bytes).map_err(CarError::HeaderLength)?;
        let available = bytes.len() - used;
        let header_end = usize::try_from(header_len)
            .ok()
            .filter(|&n| n <= available)
            .map(|n| used + n)
            .ok_or(CarError::HeaderTruncated {
                declared: header_len,
                available,
            })?;
        if header_len == 0 {
            return Err(CarError::InvalidHeader("empty header".into()));
        }
        let value = decode_with_depth(&bytes[used..header_end], limits.max_decode_depth)
            .map_err(CarError::HeaderDecode)?;
        let header = CarHeader::from_value(&value)?;
        Ok(Self {
            bytes,
            pos: header_end,
            header,
            limits,
            done: false,
        })
    }

    pub fn header(&self) -> &CarHeader {
        &self.header
    }

    pub fn roots(&self) -> &[Cid] {
        &self.header.roots
    }

    fn read_frame(&mut self) -> Result<(Cid, Vec<u8>), CarError> {
        let offset = self.pos;
        let rest = &self.bytes[offset..];
        let (frame_len, used) =
            varint::read_u64(rest).map_err(|source| CarError::FrameLength { offset, source })?;
        if frame_len == 0 {
            return Err(CarError::ZeroLengthFrame { offset });
        }
        let available = rest.len() - used;
        let frame = usize::try_from(frame_len)
            .ok()
            .filter(|&n| n <= available)
            .map(|n| &rest[used..used + n])
            .ok_or(CarError::FrameTruncated {
                offset,
                declared: frame_len,
                available,
            })?;
        let (cid, cid_len) =
            Cid::read_bytes(frame).map_err(|source| CarError::FrameCid { offset, source })?;
        let data = &frame[cid_len..];
        if data.len() > self.limits.max_block_bytes {
            return Err(CarError::BlockTooLarge {
                cid,
                size: data.len(),
                limit: self.limits.max_block_bytes,
            });
        }
        if self.limits.verify_block_digests {
            match cid.matches(data) {
                Ok(true) => {}
                Ok(false) => return Err(CarError::DigestMismatch { cid }),
                Err(source) => return Err(CarError::UnverifiableBlock { cid, source }),
            }
        }
        self.pos = offset + used + frame.len();
        Ok((cid, data.to_vec()))
    }
}

impl Iterator for CarReader<'_> {
    type Item = Result<(Cid, Vec<u8>), CarError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.bytes.len() {
            return None;
        }
        let item = self.read_frame();
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}

impl std::iter::FusedIterator for CarReader<'_> {}

/// A fully read container.
#[derive(Debug, Clone)]
pub struct Car {
    pub header: CarHeader,
    pub blocks: BlockStore,
}

impl Car {
    pub fn roots(&self) -> &[Cid] {
        &self.header.roots
    }
}

/// Read a whole container with default limits.
pub fn read_car(bytes: &[u8]) -> Result<Car, CarError> {
    read_car_with_limits(bytes, CarLimits::default())
}

/// Read a whole container into a [`BlockStore`].
pub fn read_car_with_limits(bytes: &[u8], limits: CarLimits) -> Result<Car, CarError> {
    let mut reader = CarReader::with_limits(bytes, limits)?;
    let mut blocks = BlockStore::new().with_decode_depth(limits.max_decode_depth);
    for item in reader.by_ref() {
        let (cid, data) = item?;
        blocks.insert(cid, data);
    }
    tracing::debug!(
        roots = reader.roots().len(),
        blocks = blocks.len(),
        bytes = bytes.len(),
        "read CAR"
    );
    Ok(Car {
        header: reader.header,
        blocks,
    })
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Write a CAR v1 container with `roots` and the given blocks, in order.
pub fn write_car<'b, I>(roots: &[Cid], blocks: I) -> Result<Vec<u8>, CarError>
where
    I: IntoIterator<Item = (&'b Cid, &'b [u8])>,
{
    let header = CarHeader {
        version: CAR_VERSION,
        roots: roots.to_vec(),
    };
    let header_bytes = canonical::encode(&header.to_value()).map_err(CarError::HeaderEncode)?;
    let mut out = Vec::with_capacity(header_bytes.len() + 16);
    varint::write_u64(header_bytes.len() as u64, &mut out);
    out.extend_from_slice(&header_bytes);
    for (cid, data) in blocks {
        let cid_bytes = cid.to_bytes();
        varint::write_u64((cid_bytes.len() + data.len()) as u64, &mut out);
        out.extend_from_slice(&cid_bytes);
        out.extend_from_slice(data);
    }
    Ok(out)
}

/// Write every block of `store` after the roots. Blocks are ordered by
/// CID so the output is deterministic.
pub fn write_store(roots: &[Cid], store: &BlockStore) -> Result<Vec<u8>, CarError> {
    let mut blocks: Vec<_> = store.iter().collect();
    blocks.sort_by(|a, b| a.0.cmp(b.0));
    write_car(roots, blocks)
}
