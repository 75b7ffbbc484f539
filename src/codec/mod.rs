//! Protocol Buffers wire encoding for single cells.
//!
//! Only the subset needed by generated table messages is implemented:
//! varint and zigzag integers, fixed32/fixed64 floats, and length-delimited
//! strings and sub-records.

pub mod cell;
pub mod varint;
pub mod wire;

/// Re-export commonly used items
pub use cell::{ScalarType, encode_cell};
pub use wire::{WireType, encode_length_delimited, encode_tag, tag};
