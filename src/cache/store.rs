use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::table::{FingerprintEntry, FingerprintKind, FingerprintStatus, FingerprintTable};
use crate::common::fs::{atomic_write_bytes, copy_file, remove_dir_if_exists};
use crate::common::{Error, Fingerprint, Result};
use crate::config::OutputLayout;

/// Files written when the cache is saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    /// The persisted fingerprint tables
    pub cache_file: PathBuf,
    /// Manifest of the entries that changed in the last run
    pub changes_file: PathBuf,
    /// Mirror of changed output files, emptied on every save
    pub review_dir: PathBuf,
}

/// On-disk shape of the cache and the changes manifest.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Persisted {
    #[serde(default)]
    source: BTreeMap<String, FingerprintEntry>,
    #[serde(default)]
    schema: BTreeMap<String, FingerprintEntry>,
    #[serde(default)]
    data: BTreeMap<String, FingerprintEntry>,
}

/// Artifacts whose output files were copied to the review directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub changed_schemas: Vec<String>,
    pub changed_data: Vec<String>,
}

/// Fingerprints of sources and outputs, shared by all artifact tasks.
#[derive(Debug)]
pub struct ArtifactCache {
    paths: CachePaths,
    source: Mutex<FingerprintTable>,
    schema: Mutex<FingerprintTable>,
    data: Mutex<FingerprintTable>,
}

impl ArtifactCache {
    /// A cache with no stored fingerprints.
    pub fn empty(paths: CachePaths) -> Self {
        Self::from_persisted(paths, Persisted::default())
    }

    /// Load the persisted tables. A missing file is an empty cache.
    pub fn load(paths: CachePaths) -> Result<Self> {
        let raw = match fs::read(&paths.cache_file) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(file = %paths.cache_file.display(), "no cache file, starting empty");
                return Ok(Self::empty(paths));
            },
            Err(e) => return Err(cache_io(&paths.cache_file, e)),
        };
        let persisted: Persisted = serde_json::from_slice(&raw)
            .map_err(|e| Error::CacheIo(format!("{}: {}", paths.cache_file.display(), e)))?;
        info!(
            file = %paths.cache_file.display(),
            sources = persisted.source.len(),
            schemas = persisted.schema.len(),
            data = persisted.data.len(),
            "loaded cache"
        );
        Ok(Self::from_persisted(paths, persisted))
    }

    /// Delete the persisted tables and start empty.
    pub fn clear(paths: CachePaths) -> Result<Self> {
        match fs::remove_file(&paths.cache_file) {
            Ok(()) => info!(file = %paths.cache_file.display(), "cache cleared"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {},
            Err(e) => return Err(cache_io(&paths.cache_file, e)),
        }
        Ok(Self::empty(paths))
    }

    fn from_persisted(paths: CachePaths, persisted: Persisted) -> Self {
        Self {
            paths,
            source: Mutex::new(FingerprintTable::from_stored(persisted.source)),
            schema: Mutex::new(FingerprintTable::from_stored(persisted.schema)),
            data: Mutex::new(FingerprintTable::from_stored(persisted.data)),
        }
    }

    pub fn paths(&self) -> &CachePaths {
        &self.paths
    }

    fn table(&self, kind: FingerprintKind) -> &Mutex<FingerprintTable> {
        match kind {
            FingerprintKind::Source => &self.source,
            FingerprintKind::Schema => &self.schema,
            FingerprintKind::Data => &self.data,
        }
    }

    /// Status `hash` would get, without recording it.
    pub fn peek(&self, kind: FingerprintKind, name: &str, hash: &Fingerprint) -> FingerprintStatus {
        self.table(kind).lock().peek(name, hash)
    }

    /// Record `hash` and return its status.
    pub fn update(&self, kind: FingerprintKind, name: &str, hash: Fingerprint) -> FingerprintStatus {
        self.table(kind).lock().update(name, hash)
    }

    /// Carry the stored fingerprint of `name` into this run.
    pub fn retain(&self, kind: FingerprintKind, name: &str) {
        self.table(kind).lock().retain(name)
    }

    /// Keep the stored fingerprint of `name` for good in this run.
    pub fn pin(&self, kind: FingerprintKind, name: &str) {
        self.table(kind).lock().pin(name)
    }

    /// Status recorded for `name` in this run.
    pub fn status(&self, kind: FingerprintKind, name: &str) -> Option<FingerprintStatus> {
        self.table(kind).lock().status(name)
    }

    /// Write the tables, the changes manifest and the review copies.
    ///
    /// Entries not observed in this run are dropped.
    pub fn save(&self, layout: &OutputLayout) -> Result<SaveSummary> {
        let (cache, changes) = self.snapshot();
        let summary = SaveSummary {
            changed_schemas: changes.schema.keys().cloned().collect(),
            changed_data: changes.data.keys().cloned().collect(),
        };

        self.write_review(layout, &summary)?;
        write_json(&self.paths.changes_file, &changes)?;
        write_json(&self.paths.cache_file, &cache)?;
        info!(
            file = %self.paths.cache_file.display(),
            changed_schemas = summary.changed_schemas.len(),
            changed_data = summary.changed_data.len(),
            "saved cache"
        );
        Ok(summary)
    }

    fn snapshot(&self) -> (Persisted, Persisted) {
        let mut cache = Persisted::default();
        let mut changes = Persisted::default();
        for (kind, cache_map, changes_map) in [
            (FingerprintKind::Source, &mut cache.source, &mut changes.source),
            (FingerprintKind::Schema, &mut cache.schema, &mut changes.schema),
            (FingerprintKind::Data, &mut cache.data, &mut changes.data),
        ] {
            let table = self.table(kind).lock();
            cache_map.extend(table.entries().iter().map(|(k, v)| (k.clone(), v.clone())));
            changes_map.extend(table.changes().map(|e| (e.name.clone(), e.clone())));
        }
        (cache, changes)
    }

    fn write_review(&self, layout: &OutputLayout, summary: &SaveSummary) -> Result<()> {
        let review = &self.paths.review_dir;
        remove_dir_if_exists(review)?;
        let schema_dir = review.join("schema");
        let data_dir = review.join("data");
        fs::create_dir_all(&schema_dir)?;
        fs::create_dir_all(&data_dir)?;

        for name in &summary.changed_schemas {
            copy_file(layout.schema_path(name), schema_dir.join(layout.schema_file_name(name)))?;
        }
        for name in &summary.changed_data {
            copy_file(layout.data_path(name), data_dir.join(layout.data_file_name(name)))?;
        }
        Ok(())
    }
}

fn cache_io(path: &Path, err: io::Error) -> Error {
    Error::CacheIo(format!("{}: {}", path.display(), err))
}

fn write_json(path: &Path, value: &Persisted) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    atomic_write_bytes(path, &bytes).map_err(|e| cache_io(path, e))
}
