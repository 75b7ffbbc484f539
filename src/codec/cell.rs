//! Typed cell encoding.
//!
//! [`encode_cell`] turns one cell's text into `tag + value` bytes according
//! to the declared scalar type. A blank cell produces no bytes. A cell that
//! cannot be parsed produces no bytes either and reports
//! [`Error::FormatInvalid`]; the buffer is never left with a dangling tag.

use std::fmt;

use bytes::BufMut;

use super::varint::{encode_varint, zigzag_encode};
use super::wire::{WireType, encode_tag};
use crate::common::{Error, Result};
use crate::grid::Cell;

/// Declared type of a scalar column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Float32,
    Float64,
    String,
}

impl ScalarType {
    /// Parse a declared-type header cell. `float` and `double` are accepted
    /// as aliases of `float32` and `float64`.
    ///
    /// Values of the integer types must be integral text: `1.5` in an
    /// `int32` column is [`Error::FormatInvalid`], it is not truncated.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "int32" => Some(ScalarType::Int32),
            "int64" => Some(ScalarType::Int64),
            "uint32" => Some(ScalarType::Uint32),
            "uint64" => Some(ScalarType::Uint64),
            "sint32" => Some(ScalarType::Sint32),
            "sint64" => Some(ScalarType::Sint64),
            "float32" | "float" => Some(ScalarType::Float32),
            "float64" | "double" => Some(ScalarType::Float64),
            "string" => Some(ScalarType::String),
            _ => None,
        }
    }

    /// Wire type used for values of this type.
    pub fn wire_type(self) -> WireType {
        match self {
            ScalarType::Int32
            | ScalarType::Int64
            | ScalarType::Uint32
            | ScalarType::Uint64
            | ScalarType::Sint32
            | ScalarType::Sint64 => WireType::Varint,
            ScalarType::Float32 => WireType::Fixed32,
            ScalarType::Float64 => WireType::Fixed64,
            ScalarType::String => WireType::LengthDelimited,
        }
    }

    /// Type keyword in generated schema text.
    pub fn schema_name(self) -> &'static str {
        match self {
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::Uint32 => "uint32",
            ScalarType::Uint64 => "uint64",
            ScalarType::Sint32 => "sint32",
            ScalarType::Sint64 => "sint64",
            ScalarType::Float32 => "float",
            ScalarType::Float64 => "double",
            ScalarType::String => "string",
        }
    }

    /// Whether the type is numeric.
    pub fn is_numeric(self) -> bool {
        !matches!(self, ScalarType::String)
    }

    /// Check that `text` is a literal of this type, with the same rules as
    /// cell encoding.
    pub fn validate(self, text: &str) -> Result<()> {
        parse_value(self, text.trim()).map(|_| ())
    }

    /// Default literal assumed when a header gives none.
    pub fn zero_default(self) -> &'static str {
        if self.is_numeric() { "0" } else { "" }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::Float32 => "float32",
            ScalarType::Float64 => "float64",
            other => other.schema_name(),
        };
        f.write_str(name)
    }
}

fn invalid(text: &str, ty: ScalarType) -> Error {
    Error::FormatInvalid(format!("'{}' is not a valid {}", text, ty))
}

fn parse_int<T: std::str::FromStr>(text: &str, ty: ScalarType) -> Result<T> {
    text.parse::<T>().map_err(|_| invalid(text, ty))
}

fn parse_float(text: &str, ty: ScalarType) -> Result<f64> {
    fast_float2::parse::<f64, _>(text).map_err(|_| invalid(text, ty))
}

/// A cell value parsed according to its declared type.
enum Value<'a> {
    Varint(u64),
    Fixed32(u32),
    Fixed64(u64),
    Bytes(&'a [u8]),
}

fn parse_value(ty: ScalarType, text: &str) -> Result<Value<'_>> {
    Ok(match ty {
        // Negative int32/int64 are sign-extended to ten varint bytes.
        ScalarType::Int32 => Value::Varint(parse_int::<i32>(text, ty)? as i64 as u64),
        ScalarType::Int64 => Value::Varint(parse_int::<i64>(text, ty)? as u64),
        ScalarType::Uint32 => Value::Varint(parse_int::<u32>(text, ty)? as u64),
        ScalarType::Uint64 => Value::Varint(parse_int::<u64>(text, ty)?),
        ScalarType::Sint32 => Value::Varint(zigzag_encode(parse_int::<i32>(text, ty)? as i64)),
        ScalarType::Sint64 => Value::Varint(zigzag_encode(parse_int::<i64>(text, ty)?)),
        ScalarType::Float32 => {
            let wide = parse_float(text, ty)?;
            let narrow = wide as f32;
            if wide.is_finite() && !narrow.is_finite() {
                return Err(invalid(text, ty));
            }
            Value::Fixed32(narrow.to_bits())
        },
        ScalarType::Float64 => Value::Fixed64(parse_float(text, ty)?.to_bits()),
        ScalarType::String => Value::Bytes(text.as_bytes()),
    })
}

/// Append the encoding of `cell` as field `field_number` of type `ty`.
pub fn encode_cell<B: BufMut>(
    buf: &mut B,
    field_number: u32,
    ty: ScalarType,
    cell: &Cell,
) -> Result<()> {
    if cell.is_blank() {
        return Ok(());
    }

    let value = parse_value(ty, cell.trimmed())?;
    encode_tag(field_number, ty.wire_type(), buf);
    match value {
        Value::Varint(v) => encode_varint(v, buf),
        Value::Fixed32(bits) => buf.put_u32_le(bits),
        Value::Fixed64(bits) => buf.put_u64_le(bits),
        Value::Bytes(bytes) => {
            encode_varint(bytes.len() as u64, buf);
            buf.put_slice(bytes);
        },
    }
    Ok(())
}
