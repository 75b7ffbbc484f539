//! Cell and grid types consumed by the classifier and the encoder.

/// One spreadsheet cell, reduced to its displayed string value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    value: String,
}

impl Cell {
    /// Create a cell holding `value`.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// An empty cell, used for columns a row does not reach.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The raw cell text.
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The cell text with surrounding whitespace removed.
    #[inline]
    pub fn trimmed(&self) -> &str {
        self.value.trim()
    }

    /// Whether the cell is empty or whitespace only.
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.trimmed().is_empty()
    }

    /// Parse the cell as a signed integer.
    pub fn to_int(&self) -> Option<i64> {
        self.trimmed().parse().ok()
    }

    /// Parse the cell as a floating-point number.
    pub fn to_float(&self) -> Option<f64> {
        fast_float2::parse::<f64, _>(self.trimmed()).ok()
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::new(value)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::new(value)
    }
}

/// A worksheet as rows of cells.
///
/// Rows may have different lengths; missing trailing cells read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    name: String,
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    /// Create a grid from already-converted rows.
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Build a grid from string slices, convenient for fixtures.
    pub fn from_rows<R, C>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<Cell>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        Self::new(name, rows)
    }

    /// The worksheet name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// A row by 0-based index.
    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// All rows.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// The cell at (`row`, `column`), 0-based; `None` outside the populated area.
    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Text of the cell at (`row`, `column`), empty outside the populated area.
    pub fn text(&self, row: usize, column: usize) -> &str {
        self.cell(row, column).map(Cell::value).unwrap_or("")
    }
}
