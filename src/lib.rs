//! sheet2pb - An incremental compiler from spreadsheet tables to Protocol Buffers
//!
//! Every worksheet carries a four-row header (attribute, type, identifier,
//! comment) above its data rows. The header is classified into a tree of
//! field descriptors, rendered as `.proto` schema text, and every data row is
//! encoded in the Protocol Buffers wire format into a single data blob that
//! decodes as the schema's `<Name>_ARRAY` message.
//!
//! # Features
//!
//! - **Header classification**: scalars, inline structs and fixed-size repeats,
//!   merged across several worksheets with stable field numbers
//! - **Schema generation**: proto2 text with defaults and comments, or proto3
//! - **Wire encoding**: varint, zigzag, fixed and length-delimited fields
//! - **Incremental builds**: SHA-256 fingerprints of sources and outputs skip
//!   unchanged artifacts and report what changed
//! - **Parallel runs**: artifacts are compiled as independent rayon tasks
//!
//! # Example - Compiling an in-memory sheet
//!
//! ```rust
//! use sheet2pb::grid::{Grid, MemorySource};
//! use sheet2pb::{ArtifactSpec, Pipeline, Settings};
//!
//! # fn main() -> sheet2pb::Result<()> {
//! let dir = tempfile::tempdir()?;
//! let grid = Grid::from_rows("Hero", [
//!     ["required", "optional", "repeated", "optional", "optional"],
//!     ["string", "int32", "2", "uint32", "uint32"],
//!     ["Name", "Level=1", "", "Skills", "Skills"],
//!     ["hero name", "", "", "skill ids", ""],
//!     ["knight", "3", "2", "7", "9"],
//! ]);
//! let source = MemorySource::new().with_sheet("heroes", grid);
//! let settings = Settings::new().with_output_root(dir.path());
//!
//! let spec = ArtifactSpec::new("Hero").with_source("heroes", ["Hero"]);
//! let report = Pipeline::from_settings(source, &settings).run(&[spec], None)?;
//! assert_eq!(report.built(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Running from a settings file
//!
//! ```no_run
//! use sheet2pb::Settings;
//! use sheet2pb::pipeline::{CacheMode, run_configured};
//!
//! # fn main() -> sheet2pb::Result<()> {
//! let settings = Settings::load("conf/config.toml")?;
//! let report = run_configured(&settings, CacheMode::Enabled)?;
//! for failure in &report.failures {
//!     eprintln!("{}", failure);
//! }
//! # Ok(())
//! # }
//! ```

/// Fingerprint tables and their persistence
pub mod cache;

/// Protocol Buffers wire-format primitives
pub mod codec;

/// Error types, fingerprints and file helpers shared by every stage
pub mod common;

/// Settings, mapping files and the output layout
pub mod config;

/// Data-row encoding
pub mod encoder;

/// Worksheet access
///
/// The pipeline reads sheets through the [`grid::GridSource`] trait; the
/// `xlsx` feature provides a calamine-backed implementation.
pub mod grid;

/// Header classification into field descriptor trees
pub mod header;

/// Artifact orchestration
pub mod pipeline;

/// Schema text generation
pub mod schema;

pub use cache::{ArtifactCache, FingerprintStatus};
pub use common::{Error, Fingerprint, Result};
pub use config::{ArtifactSpec, FailurePolicy, Settings};
pub use header::{Diagnostic, FieldDescriptorTree};
pub use pipeline::{Pipeline, RunReport};
