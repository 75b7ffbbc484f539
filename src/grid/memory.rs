//! In-memory grid source.

use std::collections::HashMap;

use super::traits::GridSource;
use super::types::Grid;
use crate::common::{Error, Fingerprint, Result};

/// A [`GridSource`] holding worksheets in memory.
///
/// Useful for tests and for callers that read spreadsheets themselves.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<Grid>>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a worksheet of `file`, matched by the grid's name.
    pub fn insert(&mut self, file: impl Into<String>, grid: Grid) -> &mut Self {
        let sheets = self.files.entry(file.into()).or_default();
        match sheets.iter_mut().find(|g| g.name() == grid.name()) {
            Some(existing) => *existing = grid,
            None => sheets.push(grid),
        }
        self
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_sheet(mut self, file: impl Into<String>, grid: Grid) -> Self {
        self.insert(file, grid);
        self
    }
}

impl GridSource for MemorySource {
    fn exists(&self, file: &str) -> bool {
        self.files.contains_key(file)
    }

    fn fingerprint(&self, file: &str) -> Result<Fingerprint> {
        let sheets = self
            .files
            .get(file)
            .ok_or_else(|| Error::SourceMissing(format!("file {} does not exist", file)))?;

        // Unit and record separators keep distinct layouts from colliding.
        let mut content = String::new();
        for grid in sheets {
            content.push_str(grid.name());
            content.push('\u{1d}');
            for row in grid.rows() {
                for cell in row {
                    content.push_str(cell.value());
                    content.push('\u{1f}');
                }
                content.push('\u{1e}');
            }
        }
        Ok(Fingerprint::of(content.as_bytes()))
    }

    fn load(&self, file: &str, sheets: &[String]) -> Result<Vec<Grid>> {
        let available = self
            .files
            .get(file)
            .ok_or_else(|| Error::SourceMissing(format!("file {} does not exist", file)))?;

        sheets
            .iter()
            .map(|name| {
                available
                    .iter()
                    .find(|g| g.name() == name)
                    .cloned()
                    .ok_or_else(|| {
                        Error::SourceMissing(format!(
                            "file {} does not contain sheet {}",
                            file, name
                        ))
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_in_requested_order() {
        let source = MemorySource::new()
            .with_sheet("Book", Grid::from_rows("A", [vec!["1"]]))
            .with_sheet("Book", Grid::from_rows("B", [vec!["2"]]));

        let grids = source
            .load("Book", &["B".to_string(), "A".to_string()])
            .expect("load");
        assert_eq!(grids[0].name(), "B");
        assert_eq!(grids[1].name(), "A");
    }

    #[test]
    fn test_missing_sheet_and_file() {
        let source = MemorySource::new().with_sheet("Book", Grid::from_rows("A", [vec!["1"]]));

        assert!(matches!(
            source.load("Book", &["Z".to_string()]),
            Err(Error::SourceMissing(_))
        ));
        assert!(matches!(
            source.load("Other", &["A".to_string()]),
            Err(Error::SourceMissing(_))
        ));
        assert!(!source.exists("Other"));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let mut source = MemorySource::new();
        source.insert("Book", Grid::from_rows("A", [vec!["1", "2"]]));
        let before = source.fingerprint("Book").expect("fingerprint");

        source.insert("Book", Grid::from_rows("A", [vec!["12"]]));
        let after = source.fingerprint("Book").expect("fingerprint");

        assert_ne!(before, after);
    }
}
