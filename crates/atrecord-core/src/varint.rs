//! Unsigned LEB128 varints as used by multiformats and CAR framing.
//!
//! Values are limited to 63 bits (nine bytes) and must be minimally encoded.

use crate::error::VarintError;

/// Longest permitted encoding.
pub const MAX_VARINT_LEN: usize = 9;

/// Append the varint encoding of `value` to `out`.
pub fn write_u64(mut value: u64, out: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Encode `value` into a fresh buffer.
pub fn encode_u64(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_VARINT_LEN);
    write_u64(value, &mut out);
    out
}

/// Decode a varint from the front of `input`, returning the value and the
/// number of bytes consumed.
pub fn read_u64(input: &[u8]) -> Result<(u64, usize), VarintError> {
    let mut value: u64 = 0;
    for (i, &byte) in input.iter().enumerate() {
        if i >= MAX_VARINT_LEN {
            return Err(VarintError::Overflow);
        }
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            if byte == 0 && i > 0 {
                return Err(VarintError::NotMinimal);
            }
            return Ok((value, i + 1));
        }
    }
    if input.len() >= MAX_VARINT_LEN {
        Err(VarintError::Overflow)
    } else {
        Err(VarintError::Truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_encodings() {
        assert_eq!(encode_u64(0), vec![0x00]);
        assert_eq!(encode_u64(1), vec![0x01]);
        assert_eq!(encode_u64(127), vec![0x7f]);
        assert_eq!(encode_u64(128), vec![0x80, 0x01]);
        assert_eq!(encode_u64(0x1200), vec![0x80, 0x24]);
        assert_eq!(encode_u64(300), vec![0xac, 0x02]);
    }

    #[test]
    fn test_read_reports_consumed_length() {
        let (v, n) = read_u64(&[0xac, 0x02, 0xff]).unwrap();
        assert_eq!((v, n), (300, 2));
    }

    #[test]
    fn test_truncated() {
        assert_eq!(read_u64(&[]), Err(VarintError::Truncated));
        assert_eq!(read_u64(&[0x80]), Err(VarintError::Truncated));
    }

    #[test]
    fn test_not_minimal() {
        assert_eq!(read_u64(&[0x81, 0x00]), Err(VarintError::NotMinimal));
    }

    #[test]
    fn test_overflow() {
        assert_eq!(read_u64(&[0xff; 10]), Err(VarintError::Overflow));
        let max = encode_u64(i64::MAX as u64);
        assert_eq!(max.len(), MAX_VARINT_LEN);
        assert_eq!(read_u64(&max).unwrap().0, i64::MAX as u64);
    }
}
