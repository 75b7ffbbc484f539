//! Encoding data rows into the binary data blob.

mod row;
mod unique;

pub use row::RowEncoder;
pub use unique::UniqueIndex;
