//! The in-memory row set for one sheet.

use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::columns::Field;

/// A sheet's used range: row 0 is the header, everything after is data.
/// The grid owns row order and any extra columns; the engine only reads
/// and writes the positions a [`crate::columns::ColumnMap`] names.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    pub rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub const HEADER_ROW: usize = 0;
    pub const FIRST_DATA_ROW: usize = 1;

    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Grid { rows }
    }

    pub fn header(&self) -> Option<&[Cell]> {
        self.rows.first().map(|row| row.as_slice())
    }

    /// True when the grid has no usable header: no rows at all, or a
    /// first row of nothing but blank cells (a freshly created sheet).
    pub fn has_placeholder_header(&self) -> bool {
        match self.rows.first() {
            None => true,
            Some(row) => row.iter().all(|cell| cell.is_blank()),
        }
    }

    /// Install the canonical label row, replacing a placeholder header.
    pub fn install_canonical_header(&mut self) {
        let header: Vec<Cell> = Field::ALL
            .iter()
            .map(|f| Cell::Text(f.label().to_string()))
            .collect();
        if self.rows.is_empty() {
            self.rows.push(header);
        } else {
            self.rows[0] = header;
        }
    }

    /// Append a blank data row of the given width, returning its index.
    pub fn push_blank_row(&mut self, width: usize) -> usize {
        self.rows.push(vec![Cell::Empty; width]);
        self.rows.len() - 1
    }
}
