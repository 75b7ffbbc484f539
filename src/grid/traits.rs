//! Traits for grid sources.

use super::types::Grid;
use crate::common::{Fingerprint, Result};

/// A provider of worksheets, keyed by the file names used in mapping files.
///
/// Implementations must be shareable across the per-artifact worker threads.
pub trait GridSource: Send + Sync {
    /// Whether the backing file for `file` exists.
    fn exists(&self, file: &str) -> bool;

    /// Fingerprint of the whole backing file, used for change detection.
    fn fingerprint(&self, file: &str) -> Result<Fingerprint>;

    /// Load the named worksheets of `file`, in the requested order.
    ///
    /// A missing file or worksheet is reported as
    /// [`Error::SourceMissing`](crate::Error::SourceMissing).
    fn load(&self, file: &str, sheets: &[String]) -> Result<Vec<Grid>>;
}
