//! The orchestrator.
//!
//! For every configured artifact the pipeline fingerprints its source files,
//! skips it when nothing changed, and otherwise classifies each merged sheet,
//! renders the schema, encodes the data rows and writes whichever output
//! changed. Artifacts run as independent rayon tasks; the
//! [`ArtifactCache`] is the only state they share.

mod report;
mod runner;

pub use report::{ArtifactOutcome, ArtifactReport, BuildSummary, RunReport};
pub use runner::Pipeline;

pub use crate::config::{ArtifactSpec, SourceSpec};

#[cfg(feature = "xlsx")]
use crate::cache::ArtifactCache;
#[cfg(feature = "xlsx")]
use crate::common::Result;
#[cfg(feature = "xlsx")]
use crate::config::{Settings, discover};
#[cfg(feature = "xlsx")]
use crate::grid::XlsxSource;

/// How the persisted cache is used by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Load the cache, skip unchanged artifacts, save at the end.
    #[default]
    Enabled,
    /// Delete the cache first, then behave as `Enabled`.
    Cleared,
    /// Rebuild everything and persist nothing.
    Disabled,
}

/// Run every artifact of the mapping files found through `settings`,
/// reading spreadsheets from the configured source directory.
#[cfg(feature = "xlsx")]
pub fn run_configured(settings: &Settings, mode: CacheMode) -> Result<RunReport> {
    let artifacts = discover(settings)?;
    tracing::info!(artifacts = artifacts.len(), ?mode, "starting run");

    let cache = match mode {
        CacheMode::Enabled => Some(ArtifactCache::load(settings.cache_paths())?),
        CacheMode::Cleared => Some(ArtifactCache::clear(settings.cache_paths())?),
        CacheMode::Disabled => None,
    };
    let source = XlsxSource::new(&settings.source_dir, &settings.source_ext);
    Pipeline::from_settings(source, settings).run(&artifacts, cache.as_ref())
}
