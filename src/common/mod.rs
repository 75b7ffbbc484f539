//! Common types and utilities shared across the pipeline stages.

// Submodule declarations
pub mod error;
pub mod fingerprint;
pub mod fs;

// Re-exports for convenience
pub use error::{Error, Result};
pub use fingerprint::Fingerprint;
