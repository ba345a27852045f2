//! # DAG-CBOR Decoding
//!
//! Parses bytes fetched from an untrusted host into a [`Value`]. Only the
//! DAG-CBOR subset is accepted: definite lengths, text-string map keys,
//! tag 42 links, 64-bit finite floats. Every read is bounds-checked and
//! every failure is a [`DecodeError`] carrying the offending offset.
//!
//! Length prefixes are never trusted for preallocation; collections grow as
//! items are actually decoded.

use std::collections::BTreeMap;

use crate::canonical::{
    CID_TAG, MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_TAG, MAJOR_TEXT,
    MAJOR_UNSIGNED, MAX_DEPTH,
};
use crate::cid::Cid;
use crate::error::DecodeError;
use crate::value::Value;

/// Decode a single DAG-CBOR item occupying all of `bytes`, nested at most
/// [`MAX_DEPTH`] deep.
pub fn decode(bytes: &[u8]) -> Result<Value, DecodeError> {
    decode_with_depth(bytes, MAX_DEPTH)
}

/// Decode with an explicit nesting limit.
pub fn decode_with_depth(bytes: &[u8], max_depth: usize) -> Result<Value, DecodeError> {
    let mut decoder = Decoder {
        buf: bytes,
        pos: 0,
        max_depth,
    };
    let value = decoder.read_value(0)?;
    if decoder.pos != bytes.len() {
        return Err(DecodeError::TrailingBytes {
            remaining: bytes.len() - decoder.pos,
        });
    }
    Ok(value)
}

struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
    max_depth: usize,
}

impl<'a> Decoder<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or(DecodeError::UnexpectedEof { offset: self.pos })?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn take_len(&mut self, len: u64) -> Result<&'a [u8], DecodeError> {
        let n = usize::try_from(len).map_err(|_| DecodeError::UnexpectedEof { offset: self.pos })?;
        self.take(n)
    }

    /// Read an item header, returning `(major, info, argument)`.
    ///
    /// For major type 7 the argument of a float is its raw bit pattern.
    fn read_head(&mut self) -> Result<(u8, u8, u64), DecodeError> {
        let offset = self.pos;
        let initial = self.take(1)?[0];
        let major = initial >> 5;
        let info = initial & 0x1f;
        let arg = match info {
            0..=23 => u64::from(info),
            24 => u64::from(self.take(1)?[0]),
            25 => {
                let b = self.take(2)?;
                u64::from(u16::from_be_bytes([b[0], b[1]]))
            }
            26 => {
                let b = self.take(4)?;
                u64::from(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            }
            27 => {
                let b = self.take(8)?;
                u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
            }
            31 => return Err(DecodeError::IndefiniteLength { offset }),
            _ => return Err(DecodeError::ReservedInfo { info, offset }),
        };
        Ok((major, info, arg))
    }

    fn read_value(&mut self, depth: usize) -> Result<Value, DecodeError> {
        if depth > self.max_depth {
            return Err(DecodeError::DepthExceeded {
                max: self.max_depth,
            });
        }
        let offset = self.pos;
        let (major, info, arg) = self.read_head()?;
        match major {
            MAJOR_UNSIGNED => i64::try_from(arg)
                .map(Value::Integer)
                .map_err(|_| DecodeError::IntegerOutOfRange { offset }),
            MAJOR_NEGATIVE => i64::try_from(arg)
                .map(|n| Value::Integer(-1 - n))
                .map_err(|_| DecodeError::IntegerOutOfRange { offset }),
            MAJOR_BYTES => Ok(Value::Bytes(self.take_len(arg)?.to_vec())),
            MAJOR_TEXT => self.read_text(arg).map(Value::String),
            MAJOR_ARRAY => {
                let mut items = Vec::new();
                for _ in 0..arg {
                    items.push(self.read_value(depth + 1)?);
                }
                Ok(Value::List(items))
            }
            MAJOR_MAP => {
                let mut map = BTreeMap::new();
                for _ in 0..arg {
                    let key_offset = self.pos;
                    let (key_major, _, key_len) = self.read_head()?;
                    if key_major != MAJOR_TEXT {
                        return Err(DecodeError::NonStringKey { offset: key_offset });
                    }
                    let key = self.read_text(key_len)?;
                    let value = self.read_value(depth + 1)?;
                    if map.contains_key(&key) {
                        return Err(DecodeError::DuplicateKey { key });
                    }
                    map.insert(key, value);
                }
                Ok(Value::Map(map))
            }
            MAJOR_TAG => {
                if arg != CID_TAG {
                    return Err(DecodeError::UnsupportedTag { tag: arg, offset });
                }
                self.read_link().map(Value::Link)
            }
            // Major type 7: simple values and floats.
            _ => match info {
                20 => Ok(Value::Bool(false)),
                21 => Ok(Value::Bool(true)),
                22 => Ok(Value::Null),
                27 => {
                    let f = f64::from_bits(arg);
                    if f.is_finite() {
                        Ok(Value::Float(f))
                    } else {
                        Err(DecodeError::NonCanonicalFloat { offset })
                    }
                }
                25 | 26 => Err(DecodeError::NonCanonicalFloat { offset }),
                _ => Err(DecodeError::UnsupportedSimple {
                    value: arg as u8,
                    offset,
                }),
            },
        }
    }

    fn read_text(&mut self, len: u64) -> Result<String, DecodeError> {
        let offset = self.pos;
        let raw = self.take_len(len)?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8 { offset })
    }

    fn read_link(&mut self) -> Result<Cid, DecodeError> {
        let offset = self.pos;
        let (major, _, len) = self.read_head()?;
        if major != MAJOR_BYTES {
            return Err(DecodeError::InvalidLink {
                offset,
                reason: "tag 42 payload is not a byte string".to_string(),
            });
        }
        let raw = self.take_len(len)?;
        match raw.split_first() {
            Some((0x00, cid_bytes)) => {
                Cid::from_bytes(cid_bytes).map_err(|e| DecodeError::InvalidLink {
                    offset,
                    reason: e.to_string(),
                })
            }
            _ => Err(DecodeError::InvalidLink {
                offset,
                reason: "missing 0x00 multibase prefix".to_string(),
            }),
        }
    }
}
