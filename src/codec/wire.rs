//! Wire-format framing: tags and length-delimited records.

use bytes::BufMut;

use super::varint::encode_varint;

/// The 3-bit encoding-kind selector stored in every tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    Fixed32 = 5,
}

impl WireType {
    /// Parse the low three bits of a tag.
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::LengthDelimited),
            5 => Some(WireType::Fixed32),
            _ => None,
        }
    }
}

/// Tag value for a field: `(field_number << 3) | wire_type`.
#[inline]
pub fn tag(field_number: u32, wire_type: WireType) -> u64 {
    ((field_number as u64) << 3) | wire_type as u64
}

/// Append the tag of a field.
#[inline]
pub fn encode_tag<B: BufMut>(field_number: u32, wire_type: WireType, buf: &mut B) {
    encode_varint(tag(field_number, wire_type), buf);
}

/// Append `payload` as a length-delimited field: tag, length, bytes.
#[inline]
pub fn encode_length_delimited<B: BufMut>(field_number: u32, payload: &[u8], buf: &mut B) {
    encode_tag(field_number, WireType::LengthDelimited, buf);
    encode_varint(payload.len() as u64, buf);
    buf.put_slice(payload);
}
