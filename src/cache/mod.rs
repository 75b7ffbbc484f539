//! Incremental-build fingerprints.
//!
//! Three tables (sources, schemas, data blobs) map a name to the SHA-256 of
//! its content. Statuses are always computed against what the previous run
//! stored, so observing the same file from several artifacts gives the same
//! answer each time. The tables are persisted together as one JSON document.

mod store;
mod table;

pub use store::{ArtifactCache, CachePaths, SaveSummary};
pub use table::{FingerprintEntry, FingerprintKind, FingerprintStatus, FingerprintTable};
