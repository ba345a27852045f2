//! # Multibase Codecs
//!
//! The two bases the repository format needs: RFC 4648 base32 (no padding)
//! for CIDv1 strings, and the Bitcoin base58 alphabet for CIDv0 strings,
//! Multikey public keys and `did:key` identifiers.
//!
//! Multibase strings carry a one-character prefix naming their base:
//! `b` base32 lower, `B` base32 upper, `z` base58btc.

use crate::error::MultibaseError;

const BASE32_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";
const BASE58_ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// A multibase encoding supported by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Base {
    /// RFC 4648 base32, lower case, no padding (prefix `b`).
    Base32Lower,
    /// RFC 4648 base32, upper case, no padding (prefix `B`).
    Base32Upper,
    /// Bitcoin base58 (prefix `z`).
    Base58Btc,
}

impl Base {
    /// The multibase prefix character.
    pub fn prefix(self) -> char {
        match self {
            Self::Base32Lower => 'b',
            Self::Base32Upper => 'B',
            Self::Base58Btc => 'z',
        }
    }

    fn from_prefix(c: char) -> Result<Self, MultibaseError> {
        match c {
            'b' => Ok(Self::Base32Lower),
            'B' => Ok(Self::Base32Upper),
            'z' => Ok(Self::Base58Btc),
            other => Err(MultibaseError::UnsupportedBase(other)),
        }
    }
}

/// Encode `data` with `base`, including the prefix character.
pub fn encode(base: Base, data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2 + 1);
    out.push(base.prefix());
    match base {
        Base::Base32Lower => out.push_str(&base32_encode(data)),
        Base::Base32Upper => out.push_str(&base32_encode(data).to_ascii_uppercase()),
        Base::Base58Btc => out.push_str(&base58_encode(data)),
    }
    out
}

/// Decode a prefixed multibase string.
pub fn decode(input: &str) -> Result<(Base, Vec<u8>), MultibaseError> {
    let mut chars = input.chars();
    let prefix = chars.next().ok_or(MultibaseError::Empty)?;
    let base = Base::from_prefix(prefix)?;
    let body = chars.as_str();
    let bytes = match base {
        Base::Base32Lower => base32_decode(body)?,
        Base::Base32Upper => base32_decode(&body.to_ascii_lowercase())?,
        Base::Base58Btc => base58_decode(body)?,
    };
    Ok((base, bytes))
}

// ---------------------------------------------------------------------------
// base32
// ---------------------------------------------------------------------------

/// Lower-case RFC 4648 base32 without padding.
pub fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;
    for &byte in data {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
        buffer &= (1 << bits) - 1;
    }
    if bits > 0 {
        out.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

/// Decode lower-case RFC 4648 base32 without padding.
pub fn base32_decode(input: &str) -> Result<Vec<u8>, MultibaseError> {
    let mut out = Vec::with_capacity(input.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;
    for ch in input.chars() {
        let value = match ch {
            'a'..='z' => ch as u32 - 'a' as u32,
            '2'..='7' => ch as u32 - '2' as u32 + 26,
            _ => {
                return Err(MultibaseError::InvalidCharacter {
                    base: "base32",
                    ch,
                })
            }
        };
        buffer = (buffer << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((buffer >> bits) & 0xff) as u8);
        }
        buffer &= (1 << bits) - 1;
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// base58btc
// ---------------------------------------------------------------------------

/// Bitcoin-alphabet base58.
pub fn base58_encode(data: &[u8]) -> String {
    let zeros = data.iter().take_while(|&&b| b == 0).count();
    // Little-endian base-58 digits.
    let mut digits: Vec<u8> = Vec::with_capacity(data.len() * 138 / 100 + 1);
    for &byte in &data[zeros..] {
        let mut carry = u32::from(byte);
        for digit in digits.iter_mut() {
            carry += u32::from(*digit) << 8;
            *digit = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }
    let mut out = String::with_capacity(zeros + digits.len());
    out.extend(std::iter::repeat('1').take(zeros));
    out.extend(
        digits
            .iter()
            .rev()
            .map(|&d| BASE58_ALPHABET[d as usize] as char),
    );
    out
}

/// Decode Bitcoin-alphabet base58.
pub fn base58_decode(input: &str) -> Result<Vec<u8>, MultibaseError> {
    let zeros = input.chars().take_while(|&c| c == '1').count();
    // Little-endian base-256 bytes.
    let mut bytes: Vec<u8> = Vec::with_capacity(input.len() * 733 / 1000 + 1);
    for ch in input.chars().skip(zeros) {
        let value = BASE58_ALPHABET
            .iter()
            .position(|&a| a as char == ch)
            .ok_or(MultibaseError::InvalidCharacter {
                base: "base58btc",
                ch,
            })?;
        let mut carry = value as u32;
        for byte in bytes.iter_mut() {
            carry += u32::from(*byte) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }
    let mut out = vec![0u8; zeros];
    out.extend(bytes.iter().rev());
    Ok(out)
}
