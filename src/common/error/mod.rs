//! Unified error types for sheet2pb.
//!
//! This module provides one error type shared by the classifier, encoder,
//! cache and pipeline, presenting a consistent API to users.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
