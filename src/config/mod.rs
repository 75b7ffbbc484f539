//! Run configuration: settings, output layout and artifact mapping.

mod layout;
pub mod mapping;
mod settings;

pub use layout::OutputLayout;
pub use mapping::{ArtifactSpec, MappingSet, SourceSpec, discover};
pub use settings::{FailurePolicy, Settings};
