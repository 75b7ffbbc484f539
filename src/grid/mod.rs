//! Worksheet grids.
//!
//! The pipeline only sees a worksheet as rows of string cells. This module
//! defines that view ([`Grid`], [`Cell`]) and the [`GridSource`] trait that
//! produces it, with an in-memory implementation and, behind the `xlsx`
//! feature, a calamine-backed reader.
//!
//! # Header layout
//!
//! ```text
//! row 0  attribute     required | optional | unique | repeated | optional_struct
//! row 1  type          int32 ... string, or a count for repeated/optional_struct
//! row 2  identifier    field name, optionally `name=default`
//! row 3  comment       free text
//! row 4+ data
//! ```

// Submodule declarations
pub mod memory;
pub mod traits;
pub mod types;
#[cfg(feature = "xlsx")]
pub mod xlsx;

// Re-exports
pub use memory::MemorySource;
pub use traits::GridSource;
pub use types::{Cell, Grid};
#[cfg(feature = "xlsx")]
pub use xlsx::XlsxSource;
