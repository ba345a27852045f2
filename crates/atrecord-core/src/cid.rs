//! # Content Identifiers
//!
//! A CID names a block by the hash of its bytes: `{version, codec,
//! multihash(code, digest)}`. Repository blocks are CIDv1 with the
//! `dag-cbor` codec (records, commits, MST nodes) and SHA-256 multihash.
//!
//! ## Security Invariant
//!
//! Two CIDs are equal iff their binary forms are equal. The derived
//! `PartialEq` compares version, codec, hash code and digest, which is
//! exactly the binary form; string comparison is never used. Different
//! string spellings of one CID (`b…` and `B…`) parse to the same value.
//!
//! ## String forms
//!
//! - CIDv1: multibase base32-lower, e.g. `bafyrei…`.
//! - CIDv0: bare base58btc of the multihash, e.g. `Qm…`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::CidError;
use crate::multibase::{self, Base};
use crate::varint;

/// Multicodec code for DAG-CBOR.
pub const DAG_CBOR: u64 = 0x71;
/// Multicodec code for raw bytes.
pub const RAW: u64 = 0x55;
/// Multicodec code for DAG-PB (implied by CIDv0).
pub const DAG_PB: u64 = 0x70;
/// Multihash code for SHA2-256.
pub const SHA2_256: u64 = 0x12;

/// Upper bound on digest length accepted from untrusted input.
const MAX_DIGEST_LEN: u64 = 128;

/// A content identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cid {
    version: u64,
    codec: u64,
    hash_code: u64,
    digest: Vec<u8>,
}

impl Cid {
    /// Construct a CIDv1 from its parts.
    pub fn new_v1(codec: u64, hash_code: u64, digest: impl Into<Vec<u8>>) -> Self {
        Self {
            version: 1,
            codec,
            hash_code,
            digest: digest.into(),
        }
    }

    /// Hash `bytes` with SHA-256 and wrap the digest as a CIDv1 with `codec`.
    pub fn compute(codec: u64, bytes: &[u8]) -> Self {
        Self::new_v1(codec, SHA2_256, Sha256::digest(bytes).to_vec())
    }

    /// CID version (0 or 1).
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Multicodec of the addressed content.
    pub fn codec(&self) -> u64 {
        self.codec
    }

    /// Multihash function code.
    pub fn hash_code(&self) -> u64 {
        self.hash_code
    }

    /// Raw digest bytes.
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// Check that `bytes` hash to this CID's digest.
    ///
    /// # Errors
    ///
    /// Returns [`CidError::UnsupportedHash`] for multihash functions other
    /// than SHA2-256.
    pub fn matches(&self, bytes: &[u8]) -> Result<bool, CidError> {
        if self.hash_code != SHA2_256 {
            return Err(CidError::UnsupportedHash(self.hash_code));
        }
        Ok(Sha256::digest(bytes).as_slice() == self.digest.as_slice())
    }

    /// Binary form: bare multihash for v0, varint-prefixed for v1.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.digest.len() + 8);
        if self.version == 1 {
            varint::write_u64(1, &mut out);
            varint::write_u64(self.codec, &mut out);
        }
        varint::write_u64(self.hash_code, &mut out);
        varint::write_u64(self.digest.len() as u64, &mut out);
        out.extend_from_slice(&self.digest);
        out
    }

    /// Parse a CID that occupies all of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CidError> {
        let (cid, used) = Self::read_bytes(bytes)?;
        if used != bytes.len() {
            return Err(CidError::TrailingBytes(bytes.len() - used));
        }
        Ok(cid)
    }

    /// Parse a CID from the front of `bytes`, returning it and the number of
    /// bytes consumed. Used by framed formats where the CID is followed by
    /// other data.
    pub fn read_bytes(bytes: &[u8]) -> Result<(Self, usize), CidError> {
        if bytes.is_empty() {
            return Err(CidError::Empty);
        }
        // CIDv0 is a bare sha2-256 multihash.
        if bytes.len() >= 2 && bytes[0] == 0x12 && bytes[1] == 0x20 {
            let (hash_code, digest, used) = read_multihash(bytes, 0)?;
            return Ok((
                Self {
                    version: 0,
                    codec: DAG_PB,
                    hash_code,
                    digest,
                },
                used,
            ));
        }
        let (version, mut pos) = varint::read_u64(bytes)?;
        if version != 1 {
            return Err(CidError::UnsupportedVersion(version));
        }
        let (codec, n) = varint::read_u64(&bytes[pos..])?;
        pos += n;
        let (hash_code, digest, used) = read_multihash(bytes, pos)?;
        Ok((
            Self {
                version,
                codec,
                hash_code,
                digest,
            },
            used,
        ))
    }
}

/// Read `code || len || digest` starting at `start`; returns the code, the
/// digest and the absolute end offset.
fn read_multihash(bytes: &[u8], start: usize) -> Result<(u64, Vec<u8>, usize), CidError> {
    let (code, n) = varint::read_u64(&bytes[start..])?;
    let mut pos = start + n;
    let (len, n) = varint::read_u64(&bytes[pos..])?;
    pos += n;
    let available = bytes.len() - pos;
    if len > MAX_DIGEST_LEN || len as usize > available {
        return Err(CidError::DigestLength {
            declared: len,
            available,
        });
    }
    let end = pos + len as usize;
    Ok((code, bytes[pos..end].to_vec(), end))
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version == 0 {
            f.write_str(&multibase::base58_encode(&self.to_bytes()))
        } else {
            f.write_str(&multibase::encode(Base::Base32Lower, &self.to_bytes()))
        }
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({self})")
    }
}

impl FromStr for Cid {
    type Err = CidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(CidError::Empty);
        }
        if s.len() == 46 && s.starts_with("Qm") {
            let bytes = multibase::base58_decode(s)?;
            return Self::from_bytes(&bytes);
        }
        let (_, bytes) = multibase::decode(s)?;
        Self::from_bytes(&bytes)
    }
}

impl Serialize for Cid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Cid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // CID of the empty DAG-CBOR map `{}` (single byte 0xa0).
    const EMPTY_MAP_CID: &str = "bafyreigbtj4x7ip5legnfznufuopl4sg4knzc2cof6duas4b3q2fy6swua";

    #[test]
    fn test_compute_known_vector() {
        let cid = Cid::compute(DAG_CBOR, &[0xa0]);
        assert_eq!(cid.to_string(), EMPTY_MAP_CID);
        assert_eq!(cid.version(), 1);
        assert_eq!(cid.codec(), DAG_CBOR);
        assert_eq!(cid.hash_code(), SHA2_256);
        assert_eq!(cid.digest().len(), 32);
    }

    #[test]
    fn test_parse_roundtrip() {
        let cid: Cid = EMPTY_MAP_CID.parse().unwrap();
        assert_eq!(cid, Cid::compute(DAG_CBOR, &[0xa0]));
        assert_eq!(cid.to_string(), EMPTY_MAP_CID);
    }

    #[test]
    fn test_upper_case_spelling_is_equal() {
        let lower: Cid = EMPTY_MAP_CID.parse().unwrap();
        let upper_str = format!("B{}", EMPTY_MAP_CID[1..].to_ascii_uppercase());
        let upper: Cid = upper_str.parse().unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_v0_roundtrip() {
        let v0 = "QmdfTbBqBPQ7VNxZEYEj14VmRuZBkqFbiwReogJgS1zR1n";
        let cid: Cid = v0.parse().unwrap();
        assert_eq!(cid.version(), 0);
        assert_eq!(cid.codec(), DAG_PB);
        assert_eq!(cid.to_string(), v0);
    }

    #[test]
    fn test_read_bytes_stops_at_cid_end() {
        let cid = Cid::compute(RAW, b"block");
        let mut framed = cid.to_bytes();
        framed.extend_from_slice(b"payload");
        let (parsed, used) = Cid::read_bytes(&framed).unwrap();
        assert_eq!(parsed, cid);
        assert_eq!(&framed[used..], b"payload");
        assert_eq!(Cid::from_bytes(&framed), Err(CidError::TrailingBytes(7)));
    }

    #[test]
    fn test_malformed_strings_are_errors() {
        assert_eq!("".parse::<Cid>(), Err(CidError::Empty));
        assert!(matches!("xyz".parse::<Cid>(), Err(CidError::Multibase(_))));
        assert!(matches!("b!!!".parse::<Cid>(), Err(CidError::Multibase(_))));
        assert!(matches!(
            "bafyrei".parse::<Cid>(),
            Err(CidError::Varint(_)) | Err(CidError::DigestLength { .. })
        ));
        // Version 2 is unknown.
        let bytes = [0x02, 0x71, 0x12, 0x20];
        assert_eq!(Cid::from_bytes(&bytes), Err(CidError::UnsupportedVersion(2)));
    }

    #[test]
    fn test_truncated_digest() {
        let mut bytes = Cid::compute(DAG_CBOR, b"x").to_bytes();
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(
            Cid::from_bytes(&bytes),
            Err(CidError::DigestLength { declared: 32, available: 31 })
        ));
    }

    #[test]
    fn test_matches() {
        let cid = Cid::compute(DAG_CBOR, b"abc");
        assert_eq!(cid.matches(b"abc"), Ok(true));
        assert_eq!(cid.matches(b"abd"), Ok(false));
        let other = Cid::new_v1(DAG_CBOR, 0x1e, vec![0u8; 32]);
        assert_eq!(other.matches(b"abc"), Err(CidError::UnsupportedHash(0x1e)));
    }

    #[test]
    fn test_serde_as_string() {
        let cid = Cid::compute(DAG_CBOR, &[0xa0]);
        let json = serde_json::to_string(&cid).unwrap();
        assert_eq!(json, format!("\"{EMPTY_MAP_CID}\""));
        let back: Cid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cid);
    }

    proptest! {
        #[test]
        fn cid_string_roundtrip(
            codec in prop::sample::select(vec![DAG_CBOR, RAW]),
            data in prop::collection::vec(any::<u8>(), 0..256),
        ) {
            let cid = Cid::compute(codec, &data);
            let parsed: Cid = cid.to_string().parse().unwrap();
            prop_assert_eq!(&parsed, &cid);
            prop_assert_eq!(parsed.to_bytes(), cid.to_bytes());
        }

        #[test]
        fn single_byte_flip_changes_cid(
            data in prop::collection::vec(any::<u8>(), 1..256),
            index in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let mut tampered = data.clone();
            let i = index.index(tampered.len());
            tampered[i] ^= 1 << bit;
            prop_assert_ne!(Cid::compute(DAG_CBOR, &data), Cid::compute(DAG_CBOR, &tampered));
        }

        #[test]
        fn arbitrary_strings_never_panic(s in "\\PC{0,80}") {
            let _ = s.parse::<Cid>();
        }
    }
}
