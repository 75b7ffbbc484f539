//! Schema generation.
//!
//! Renders a [`FieldDescriptorTree`](crate::header::FieldDescriptorTree) as
//! Protocol Buffers schema text in either the `proto2` or `proto3` dialect.

mod config;
mod writer;

pub use config::{Dialect, SchemaOptions};
pub use writer::{RenderedSchema, SchemaWriter};
