//! Header classification: turning the four header rows of a sheet into a
//! [`FieldDescriptorTree`].
//!
//! | row | content |
//! |-----|---------|
//! | 0 | attribute: `required`, `optional`, `unique`, `repeated`, `optional_struct` |
//! | 1 | scalar type, or the replica count / struct width of a group |
//! | 2 | identifier, optionally `name=default` |
//! | 3 | comment |
//!
//! A repeated group of structs is laid out as N blocks, each one
//! `optional_struct` column followed by its M child columns:
//!
//! ```text
//! repeated | optional_struct | optional | optional | optional_struct | optional | optional
//!    2     |        2        |  int32   |  string  |        2        |  int32   |  string
//!          |     Reward      |   Id     |  Name    |     Reward      |   Id     |  Name
//! ```

pub mod classifier;
pub mod tree;
pub mod types;

pub use classifier::{Classifier, ClassifyOptions, ROW_DATA, classify};
pub use tree::FieldDescriptorTree;
pub use types::{
    Diagnostic, FieldDescriptor, FieldKind, RepeatedElement, RepeatedField, ScalarField,
    StructField,
};
