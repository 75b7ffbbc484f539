//! Row encoding.
//!
//! Each data row becomes one serialized table message: scalars first, then
//! struct sub-records, then repeated replicas, in definition order. Rows are
//! appended to the data blob as field 1 of the `<Name>_ARRAY` wrapper.

use bytes::BytesMut;
use tracing::{debug, warn};

use super::unique::UniqueIndex;
use crate::codec::{encode_cell, encode_length_delimited};
use crate::common::{Error, Result};
use crate::grid::{Cell, Grid};
use crate::header::{FieldDescriptorTree, ROW_DATA, RepeatedElement, RepeatedField, ScalarField};

/// Field number of `items` in the wrapper message.
const ITEMS_FIELD: u32 = 1;

/// Encodes rows of one sheet against the current field tree.
///
/// The unique index is borrowed so it can span every sheet merged into an
/// artifact.
pub struct RowEncoder<'a> {
    tree: &'a FieldDescriptorTree,
    unique: &'a mut UniqueIndex,
    invalid_cells: usize,
}

impl<'a> RowEncoder<'a> {
    pub fn new(tree: &'a FieldDescriptorTree, unique: &'a mut UniqueIndex) -> Self {
        Self {
            tree,
            unique,
            invalid_cells: 0,
        }
    }

    /// Cells that failed to parse so far and were left out.
    pub fn invalid_cells(&self) -> usize {
        self.invalid_cells
    }

    /// Encode one data row. A row whose first cell is blank yields no bytes.
    ///
    /// Unparseable cells are logged and omitted; a repeated unique value is
    /// an error.
    pub fn encode_row(&mut self, row: &[Cell]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        if row.first().is_none_or(Cell::is_blank) {
            return Ok(out);
        }

        let tree = self.tree;
        for field in tree.scalars() {
            self.scalar(&mut out, row, field, field.column, None)?;
        }

        let mut payload = Vec::new();
        for st in tree.structs() {
            payload.clear();
            for child in &st.fields {
                self.scalar(&mut payload, row, child, child.column, Some(&st.name))?;
            }
            encode_length_delimited(st.number, &payload, &mut out);
        }

        for rep in tree.repeats() {
            self.repeated(&mut out, row, rep);
        }
        Ok(out)
    }

    /// Encode every data row of `grid` into `buf` as framed records.
    /// Returns the number of records appended.
    pub fn encode_grid(&mut self, grid: &Grid, buf: &mut BytesMut) -> Result<usize> {
        let mut records = 0;
        for row in grid.rows().skip(ROW_DATA) {
            let encoded = self.encode_row(row)?;
            if encoded.is_empty() {
                continue;
            }
            encode_length_delimited(ITEMS_FIELD, &encoded, buf);
            records += 1;
        }
        debug!(artifact = self.tree.name(), sheet = grid.name(), records, "encoded rows");
        Ok(records)
    }

    fn scalar(
        &mut self,
        out: &mut Vec<u8>,
        row: &[Cell],
        field: &ScalarField,
        column: Option<usize>,
        parent: Option<&str>,
    ) -> Result<()> {
        let empty = Cell::empty();
        let cell = cell_at(row, column).unwrap_or(&empty);
        if field.is_unique() && !cell.is_blank() {
            match parent {
                Some(parent) => self
                    .unique
                    .check(&format!("{}.{}", parent, field.name), cell.trimmed())?,
                None => self.unique.check(&field.name, cell.trimmed())?,
            }
        }
        self.cell(out, field, field.number, cell, column);
        Ok(())
    }

    fn repeated(&mut self, out: &mut Vec<u8>, row: &[Cell], rep: &RepeatedField) {
        let Some(column) = rep.column else {
            return;
        };
        let count = self.count(row, rep, column);
        match &rep.element {
            RepeatedElement::Scalar(field) => {
                let empty = Cell::empty();
                for i in 0..count {
                    let at = column + i + 1;
                    let cell = row.get(at).unwrap_or(&empty);
                    self.cell(out, field, rep.number, cell, Some(at));
                }
            },
            RepeatedElement::Struct(st) => {
                let stride = st.width + 1;
                let mut payload = Vec::new();
                let empty = Cell::empty();
                for i in 0..count {
                    payload.clear();
                    for child in &st.fields {
                        let at = child.column.map(|c| c + i * stride);
                        let cell = cell_at(row, at).unwrap_or(&empty);
                        self.cell(&mut payload, child, child.number, cell, at);
                    }
                    encode_length_delimited(rep.number, &payload, out);
                }
            },
        }
    }

    /// Replica count of `rep` in this row, clamped to its declared maximum.
    fn count(&self, row: &[Cell], rep: &RepeatedField, column: usize) -> usize {
        let Some(cell) = row.get(column).filter(|c| !c.is_blank()) else {
            return 0;
        };
        let Some(count) = cell.to_int() else {
            warn!(
                artifact = self.tree.name(),
                field = rep.name(),
                column,
                value = cell.value(),
                "repeat count is not a number"
            );
            return 0;
        };
        if count <= 0 {
            return 0;
        }
        let count = count as usize;
        if count > rep.max_count {
            warn!(
                artifact = self.tree.name(),
                field = rep.name(),
                column,
                count,
                max = rep.max_count,
                "repeat count exceeds declared maximum"
            );
            return rep.max_count;
        }
        count
    }

    fn cell(
        &mut self,
        out: &mut Vec<u8>,
        field: &ScalarField,
        number: u32,
        cell: &Cell,
        column: Option<usize>,
    ) {
        if let Err(err) = encode_cell(out, number, field.ty, cell) {
            self.invalid_cells += 1;
            match err {
                Error::FormatInvalid(reason) => warn!(
                    artifact = self.tree.name(),
                    field = field.name.as_str(),
                    column,
                    "{}",
                    reason
                ),
                other => warn!(
                    artifact = self.tree.name(),
                    field = field.name.as_str(),
                    "{}",
                    other
                ),
            }
        }
    }
}

fn cell_at(row: &[Cell], column: Option<usize>) -> Option<&Cell> {
    column.and_then(|c| row.get(c))
}
