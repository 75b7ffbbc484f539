//! Spreadsheet files read through calamine.
//!
//! Supports every format calamine auto-detects (`.xlsx`, `.xlsm`, `.xlsb`,
//! `.xls`, `.ods`). Cells are converted to their display strings; numeric
//! cells without a fractional part render as plain integers, so `3.0` in the
//! workbook becomes the text `3`.

use std::fs;
use std::path::{Path, PathBuf};

use calamine::{Data, Range, Reader, open_workbook_auto};

use super::traits::GridSource;
use super::types::{Cell, Grid};
use crate::common::{Error, Fingerprint, Result};

/// A [`GridSource`] reading spreadsheet files from a directory.
#[derive(Debug, Clone)]
pub struct XlsxSource {
    dir: PathBuf,
    ext: String,
}

impl XlsxSource {
    /// Read files named `<dir>/<file><ext>`.
    ///
    /// `ext` is only appended when the configured file name does not already
    /// end with it.
    pub fn new(dir: impl Into<PathBuf>, ext: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            ext: ext.into(),
        }
    }

    /// Full path of a configured file.
    pub fn path_of(&self, file: &str) -> PathBuf {
        if self.ext.is_empty() || file.ends_with(&self.ext) {
            self.dir.join(file)
        } else {
            self.dir.join(format!("{}{}", file, self.ext))
        }
    }

    fn require(&self, file: &str) -> Result<PathBuf> {
        let path = self.path_of(file);
        if path.is_file() {
            Ok(path)
        } else {
            Err(Error::SourceMissing(format!(
                "file {} does not exist",
                path.display()
            )))
        }
    }
}

impl GridSource for XlsxSource {
    fn exists(&self, file: &str) -> bool {
        self.path_of(file).is_file()
    }

    fn fingerprint(&self, file: &str) -> Result<Fingerprint> {
        let path = self.require(file)?;
        Ok(Fingerprint::of(&fs::read(path)?))
    }

    fn load(&self, file: &str, sheets: &[String]) -> Result<Vec<Grid>> {
        let path = self.require(file)?;
        tracing::debug!(file = %path.display(), ?sheets, "reading workbook");

        let mut workbook = open_workbook_auto(&path)?;
        let names = workbook.sheet_names();

        let mut grids = Vec::with_capacity(sheets.len());
        for sheet in sheets {
            if !names.iter().any(|n| n == sheet) {
                return Err(Error::SourceMissing(format!(
                    "{} does not contain sheet {}",
                    display_name(&path),
                    sheet
                )));
            }
            let range = workbook.worksheet_range(sheet)?;
            grids.push(range_to_grid(sheet.trim(), &range));
        }
        Ok(grids)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Convert a calamine range into a grid anchored at A1.
///
/// calamine ranges start at the first populated cell; header and data rows
/// are addressed by absolute position, so leading empty rows and columns are
/// materialised as empty cells.
fn range_to_grid(name: &str, range: &Range<Data>) -> Grid {
    let Some((end_row, end_col)) = range.end() else {
        return Grid::new(name, Vec::new());
    };

    let rows = (0..=end_row)
        .map(|r| {
            (0..=end_col)
                .map(|c| {
                    range
                        .get_value((r, c))
                        .map(data_to_cell)
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();
    Grid::new(name, rows)
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::empty(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 => {
            Cell::new((*f as i64).to_string())
        },
        other => Cell::new(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::tempdir;

    fn write_fixture(path: &Path) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Items").expect("set name");
        // Leave A1 empty so the populated range starts at B1.
        sheet.write_string(0, 1, "required").expect("write");
        sheet.write_string(1, 1, "uint32").expect("write");
        sheet.write_string(2, 1, "ItemID").expect("write");
        sheet.write_string(3, 1, "id").expect("write");
        sheet.write_number(4, 1, 3.0).expect("write");
        sheet.write_number(5, 1, 2.5).expect("write");
        workbook.save(path).expect("save fixture");
    }

    #[test]
    fn test_load_anchors_grid_at_a1() {
        let dir = tempdir().expect("create temp dir");
        write_fixture(&dir.path().join("Book.xlsx"));

        let source = XlsxSource::new(dir.path(), ".xlsx");
        assert!(source.exists("Book"));
        assert!(source.exists("Book.xlsx"));

        let grids = source.load("Book", &["Items".to_string()]).expect("load");
        let grid = &grids[0];
        assert_eq!(grid.name(), "Items");
        assert_eq!(grid.text(0, 0), "");
        assert_eq!(grid.text(0, 1), "required");
        assert_eq!(grid.text(4, 1), "3");
        assert_eq!(grid.text(5, 1), "2.5");
    }

    #[test]
    fn test_missing_file_and_sheet() {
        let dir = tempdir().expect("create temp dir");
        write_fixture(&dir.path().join("Book.xlsx"));
        let source = XlsxSource::new(dir.path(), ".xlsx");

        assert!(matches!(
            source.load("Nope", &["Items".to_string()]),
            Err(Error::SourceMissing(_))
        ));
        assert!(matches!(
            source.load("Book", &["Other".to_string()]),
            Err(Error::SourceMissing(_))
        ));
    }

    #[test]
    fn test_fingerprint_is_file_hash() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("Book.xlsx");
        write_fixture(&path);
        let source = XlsxSource::new(dir.path(), ".xlsx");

        let expected = Fingerprint::of(&fs::read(&path).expect("read"));
        assert_eq!(source.fingerprint("Book").expect("fingerprint"), expected);
    }
}
