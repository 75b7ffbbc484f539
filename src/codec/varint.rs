//! Variable-length integer encoding/decoding
//!
//! Protocol Buffers encodes integers in 7-bit chunks with the most
//! significant bit of each byte indicating continuation.

use bytes::BufMut;

/// Append a u64 value as a variable-length integer
#[inline]
pub fn encode_varint<B: BufMut>(mut value: u64, buf: &mut B) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

/// Number of bytes `encode_varint` writes for `value`
#[inline]
pub fn varint_len(value: u64) -> usize {
    // Each byte carries 7 bits; zero still takes one byte.
    ((64 - (value | 1).leading_zeros() as usize) + 6) / 7
}

/// Decode a variable-length integer from a byte slice
///
/// Returns the value and the number of bytes consumed.
pub fn decode_varint_from_bytes(data: &[u8]) -> Result<(u64, usize), &'static str> {
    let mut value: u64 = 0;
    let mut shift = 0;

    for (consumed, &byte) in data.iter().enumerate() {
        // Check for overflow
        if shift >= 64 {
            return Err("Variable-length integer overflow");
        }

        value |= ((byte & 0x7F) as u64) << shift;

        if (byte & 0x80) == 0 {
            return Ok((value, consumed + 1));
        }

        shift += 7;
    }

    Err("Truncated variable-length integer")
}

/// Map a signed integer onto the unsigned zigzag space
#[inline]
pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode`]
#[inline]
pub fn zigzag_decode(value: u64) -> i64 {
    (value >> 1) as i64 ^ -((value & 1) as i64)
}
