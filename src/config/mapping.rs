//! Mapping files.
//!
//! A mapping file lists one artifact per line:
//!
//! ```text
//! # comment
//! Item                 items
//! Skill,Buff           combat.tables
//! Monster              monsters_a|monsters_b
//! ```
//!
//! The first field names worksheets, the second names spreadsheet files
//! (without extension). Every sheet listed in a line is read from every file
//! of that line, in order, and merged into one artifact.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use super::settings::Settings;
use crate::common::{Error, Result};

/// Worksheets read from one spreadsheet file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub file: String,
    pub sheets: Vec<String>,
}

/// One output unit and the worksheets merged into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSpec {
    pub name: String,
    pub sources: Vec<SourceSpec>,
}

impl ArtifactSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sources: Vec::new(),
        }
    }

    /// Builder: add a source file with its sheets.
    pub fn with_source<I, S>(mut self, file: impl Into<String>, sheets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources.push(SourceSpec {
            file: file.into(),
            sheets: sheets.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Distinct source files in configured order.
    pub fn files(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.sources
            .iter()
            .map(|s| s.file.as_str())
            .filter(|f| seen.insert(*f))
            .collect()
    }
}

/// Whether `name` can be used as a message name: an ASCII letter followed by
/// letters, digits or underscores.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Artifacts collected from one or more mapping files.
#[derive(Debug, Default)]
pub struct MappingSet {
    artifacts: Vec<ArtifactSpec>,
    sheets: HashSet<String>,
    names: HashSet<String>,
}

impl MappingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifacts(&self) -> &[ArtifactSpec] {
        &self.artifacts
    }

    pub fn into_artifacts(self) -> Vec<ArtifactSpec> {
        self.artifacts
    }

    /// Parse mapping text. `origin` names the text in error messages.
    pub fn parse_str(&mut self, text: &str, origin: &str) -> Result<()> {
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            self.parse_line(line)
                .map_err(|reason| Error::Config(format!("{}:{}: {}", origin, index + 1, reason)))?;
        }
        Ok(())
    }

    /// Parse one mapping file.
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        info!(file = %path.display(), "reading mapping file");
        self.parse_str(&text, &path.display().to_string())
    }

    fn parse_line(&mut self, line: &str) -> std::result::Result<(), String> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let [sheets, files] = parts.as_slice() else {
            return Err(format!("expected `SHEETS FILES`, got {:?}", line));
        };
        let sheets: Vec<&str> = sheets.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
        let files: Vec<&str> = files.split('|').map(str::trim).filter(|f| !f.is_empty()).collect();
        let (Some(&first_sheet), Some(&first_file)) = (sheets.first(), files.first()) else {
            return Err(format!("no sheet or file in {:?}", line));
        };

        let name = if sheets.len() == 1 {
            first_sheet
        } else {
            first_file.split('.').next().unwrap_or(first_file)
        };
        if !is_identifier(name) {
            return Err(format!("artifact name {:?} is not a valid identifier", name));
        }

        for sheet in &sheets {
            if self.sheets.contains(*sheet) {
                return Err(format!("sheet {} is mapped more than once", sheet));
            }
        }
        if !self.names.insert(name.to_string()) {
            return Err(format!("artifact {} is mapped more than once", name));
        }
        self.sheets.extend(sheets.iter().map(|s| s.to_string()));

        let mut artifact = ArtifactSpec::new(name);
        for file in files {
            artifact = artifact.with_source(file, sheets.iter().copied());
        }
        debug!(artifact = name, sources = artifact.sources.len(), "mapped artifact");
        self.artifacts.push(artifact);
        Ok(())
    }
}

/// Find the mapping files of `settings` and parse them in path order.
pub fn discover(settings: &Settings) -> Result<Vec<ArtifactSpec>> {
    let dir = glob::Pattern::escape(&settings.source_dir.to_string_lossy());
    let pattern = format!("{}/{}", dir.trim_end_matches('/'), settings.mapping_glob);

    let mut files = Vec::new();
    for entry in glob::glob(&pattern)? {
        files.push(entry.map_err(|e| Error::Io(e.into_error()))?);
    }
    files.sort();
    if files.is_empty() {
        return Err(Error::Config(format!("no mapping file matches {}", pattern)));
    }

    let mut set = MappingSet::new();
    for file in &files {
        set.parse_file(file)?;
    }
    Ok(set.into_artifacts())
}
