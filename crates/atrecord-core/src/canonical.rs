//! # Canonical Serialization — DAG-CBOR Byte Production
//!
//! This module defines `CanonicalBytes`, the sole construction path for bytes
//! used in CID computation and signature verification across the workspace.
//!
//! ## Security Invariant
//!
//! The `CanonicalBytes` newtype has a private inner field. The only way to
//! construct it from a [`Value`] is `CanonicalBytes::new()`, which applies
//! the full set of DAG-CBOR canonical rules. Any function that needs bytes
//! for hashing or signing accepts `&CanonicalBytes`, so a raw fetched byte
//! string (which may order its fields differently) cannot be passed by
//! mistake.
//!
//! ## Canonical rules
//!
//! 1. **Shortest integer headers.** Every length and integer uses the
//!    smallest CBOR argument width that holds it.
//! 2. **Sorted map keys.** By encoded key length first, then bytewise. This
//!    is the order of the keys' canonical byte representation, so it is
//!    independent of insertion order.
//! 3. **64-bit floats only.** NaN and the infinities are rejected.
//! 4. **Links.** CBOR tag 42 wrapping a byte string `0x00 || binary CID`.
//! 5. **Definite lengths only.** No indefinite strings, lists or maps.

use crate::cid::{Cid, DAG_CBOR};
use crate::error::CanonicalizationError;
use crate::value::Value;

/// Deepest nesting of lists and maps. The encoder refuses anything deeper
/// and the decoder uses it as its default limit, so every encodable value
/// also decodes.
pub const MAX_DEPTH: usize = 128;

/// CBOR tag for CID links.
pub(crate) const CID_TAG: u64 = 42;

pub(crate) const MAJOR_UNSIGNED: u8 = 0;
pub(crate) const MAJOR_NEGATIVE: u8 = 1;
pub(crate) const MAJOR_BYTES: u8 = 2;
pub(crate) const MAJOR_TEXT: u8 = 3;
pub(crate) const MAJOR_ARRAY: u8 = 4;
pub(crate) const MAJOR_MAP: u8 = 5;
pub(crate) const MAJOR_TAG: u8 = 6;
pub(crate) const MAJOR_SIMPLE: u8 = 7;

/// Bytes produced exclusively by canonical DAG-CBOR encoding.
///
/// # Invariants
///
/// - The only constructor from a value is `CanonicalBytes::new()`.
/// - Map keys appear in canonical order; integers use minimal headers.
/// - Floats are finite and 64-bit.
///
/// These invariants hold for every instance because the inner `Vec<u8>` is
/// private.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonically encode `value`.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::NonFiniteFloat` for NaN or infinite
    /// floats and `CanonicalizationError::DepthExceeded` for values nested
    /// deeper than [`MAX_DEPTH`].
    pub fn new(value: &Value) -> Result<Self, CanonicalizationError> {
        let mut out = Vec::new();
        encode_value(value, &mut out, 0)?;
        Ok(Self(out))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The DAG-CBOR CIDv1 of these bytes.
    pub fn cid(&self) -> Cid {
        Cid::compute(DAG_CBOR, &self.0)
    }

    /// Consume and return the underlying buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Canonically encode `value` and return the raw bytes.
pub fn encode(value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
    CanonicalBytes::new(value).map(CanonicalBytes::into_vec)
}

/// Write a CBOR item header with the shortest argument encoding.
fn write_head(major: u8, arg: u64, out: &mut Vec<u8>) {
    let m = major << 5;
    if arg < 24 {
        out.push(m | arg as u8);
    } else if arg <= u64::from(u8::MAX) {
        out.push(m | 24);
        out.push(arg as u8);
    } else if arg <= u64::from(u16::MAX) {
        out.push(m | 25);
        out.extend_from_slice(&(arg as u16).to_be_bytes());
    } else if arg <= u64::from(u32::MAX) {
        out.push(m | 26);
        out.extend_from_slice(&(arg as u32).to_be_bytes());
    } else {
        out.push(m | 27);
        out.extend_from_slice(&arg.to_be_bytes());
    }
}

fn encode_value(
    value: &Value,
    out: &mut Vec<u8>,
    depth: usize,
) -> Result<(), CanonicalizationError> {
    if depth > MAX_DEPTH {
        return Err(CanonicalizationError::DepthExceeded(MAX_DEPTH));
    }
    match value {
        Value::Null => out.push(0xf6),
        Value::Bool(false) => out.push(0xf4),
        Value::Bool(true) => out.push(0xf5),
        Value::Integer(i) => {
            if *i >= 0 {
                write_head(MAJOR_UNSIGNED, *i as u64, out);
            } else {
                // -1 - i never overflows for i < 0.
                write_head(MAJOR_NEGATIVE, (-1 - *i) as u64, out);
            }
        }
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(CanonicalizationError::NonFiniteFloat(*f));
            }
            out.push((MAJOR_SIMPLE << 5) | 27);
            out.extend_from_slice(&f.to_bits().to_be_bytes());
        }
        Value::String(s) => {
            write_head(MAJOR_TEXT, s.len() as u64, out);
            out.extend_from_slice(s.as_bytes());
        }
        Value::Bytes(b) => {
            write_head(MAJOR_BYTES, b.len() as u64, out);
            out.extend_from_slice(b);
        }
        Value::List(items) => {
            write_head(MAJOR_ARRAY, items.len() as u64, out);
            for item in items {
                encode_value(item, out, depth + 1)?;
            }
        }
        Value::Map(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| {
                a.len()
                    .cmp(&b.len())
                    .then_with(|| a.as_bytes().cmp(b.as_bytes()))
            });
            write_head(MAJOR_MAP, entries.len() as u64, out);
            for (key, val) in entries {
                write_head(MAJOR_TEXT, key.len() as u64, out);
                out.extend_from_slice(key.as_bytes());
                encode_value(val, out, depth + 1)?;
            }
        }
        Value::Link(cid) => {
            write_head(MAJOR_TAG, CID_TAG, out);
            let bytes = cid.to_bytes();
            write_head(MAJOR_BYTES, bytes.len() as u64 + 1, out);
            out.push(0x00);
            out.extend_from_slice(&bytes);
        }
    }
    Ok(())
}
