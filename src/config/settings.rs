//! Run settings.
//!
//! Settings are read from the `[config]` table of a TOML file. Every key is
//! optional; missing keys take the values of [`Settings::default`]. Relative
//! paths are resolved against the directory of the settings file.
//!
//! # Examples
//!
//! ```rust
//! use sheet2pb::config::Settings;
//!
//! let settings = Settings::new()
//!     .with_package_name("Game")
//!     .with_proto3(true)
//!     .with_jobs(4);
//! assert_eq!(settings.schema_options().package, "Game");
//! ```
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::layout::OutputLayout;
use crate::cache::CachePaths;
use crate::common::{Error, Result};
use crate::header::ClassifyOptions;
use crate::schema::{Dialect, SchemaOptions};

/// What happens to the rest of a run when one artifact fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Finish the other artifacts and save the cache.
    #[default]
    ContinueOthers,
    /// Stop at the first failure without saving the cache.
    AbortRun,
}

/// All settings of a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the spreadsheets and mapping files
    pub source_dir: PathBuf,
    /// Extension appended to file names in mapping lines
    pub source_ext: String,
    /// Glob matched inside `source_dir` to find mapping files
    pub mapping_glob: String,
    pub package_name: String,
    pub use_proto3: bool,
    pub schema_dir: PathBuf,
    pub schema_ext: String,
    pub data_dir: PathBuf,
    pub data_ext: String,
    pub cache_file: PathBuf,
    pub changes_file: PathBuf,
    /// Receives copies of changed output files
    pub review_dir: PathBuf,
    /// Register top-level `optional_struct` groups instead of ignoring them
    pub standalone_structs: bool,
    pub parallel: bool,
    /// Worker threads, 0 for the rayon default
    pub jobs: usize,
    /// Abort the run at the first failing artifact
    pub fail_fast: bool,
}

/// Shape of the settings file.
#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    config: Settings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("xlsx"),
            source_ext: ".xlsx".to_string(),
            mapping_glob: "xlsx*.config".to_string(),
            package_name: "ProtobufGen".to_string(),
            use_proto3: false,
            schema_dir: PathBuf::from("proto"),
            schema_ext: ".proto".to_string(),
            data_dir: PathBuf::from("data"),
            data_ext: ".bytes".to_string(),
            cache_file: PathBuf::from("cache/sheetcache.json"),
            changes_file: PathBuf::from("cache/changes.json"),
            review_dir: PathBuf::from("changes"),
            standalone_structs: false,
            parallel: true,
            jobs: 0,
            fail_fast: false,
        }
    }
}

impl Settings {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a TOML file and resolve its relative paths.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let settings = Self::from_toml(&text)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(settings.resolved_against(base))
    }

    /// Parse settings from TOML text without touching paths.
    pub fn from_toml(text: &str) -> Result<Self> {
        let file: SettingsFile = toml::from_str(text)?;
        Ok(file.config)
    }

    /// Make every relative path relative to `base`.
    pub fn resolved_against(mut self, base: &Path) -> Self {
        for path in [
            &mut self.source_dir,
            &mut self.schema_dir,
            &mut self.data_dir,
            &mut self.cache_file,
            &mut self.changes_file,
            &mut self.review_dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }

    #[inline]
    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = dir.into();
        self
    }

    #[inline]
    pub fn with_package_name(mut self, name: impl Into<String>) -> Self {
        self.package_name = name.into();
        self
    }

    #[inline]
    pub fn with_proto3(mut self, enabled: bool) -> Self {
        self.use_proto3 = enabled;
        self
    }

    /// Put every output under `root`: schemas, data, cache files and the
    /// review directory.
    pub fn with_output_root(mut self, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        self.schema_dir = root.join("proto");
        self.data_dir = root.join("data");
        self.cache_file = root.join("cache/sheetcache.json");
        self.changes_file = root.join("cache/changes.json");
        self.review_dir = root.join("changes");
        self
    }

    #[inline]
    pub fn with_standalone_structs(mut self, enabled: bool) -> Self {
        self.standalone_structs = enabled;
        self
    }

    #[inline]
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    #[inline]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    #[inline]
    pub fn with_fail_fast(mut self, enabled: bool) -> Self {
        self.fail_fast = enabled;
        self
    }

    pub fn schema_options(&self) -> SchemaOptions {
        SchemaOptions::new()
            .with_package(self.package_name.clone())
            .with_dialect(Dialect::from_proto3(self.use_proto3))
    }

    pub fn output_layout(&self) -> OutputLayout {
        OutputLayout {
            schema_dir: self.schema_dir.clone(),
            schema_ext: self.schema_ext.clone(),
            data_dir: self.data_dir.clone(),
            data_ext: self.data_ext.clone(),
        }
    }

    pub fn cache_paths(&self) -> CachePaths {
        CachePaths {
            cache_file: self.cache_file.clone(),
            changes_file: self.changes_file.clone(),
            review_dir: self.review_dir.clone(),
        }
    }

    pub fn classify_options(&self) -> ClassifyOptions {
        ClassifyOptions::default().with_standalone_structs(self.standalone_structs)
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        if self.fail_fast {
            FailurePolicy::AbortRun
        } else {
            FailurePolicy::ContinueOthers
        }
    }
}
