//! Destination template editing.
//!
//! - [`cell`] - Column letters and A1 references
//! - [`sheet`] - Cell model of one worksheet's `<sheetData>`
//! - [`package`] - The xlsx zip package: sheet lookup and atomic save
//! - [`writer`] - Writes a dataset into a grid through the column mapping
//!
//! Only the cells the writer touches change. Everything else in the package
//! (styles, other sheets, header rows, images) is copied through unchanged.

pub mod cell;
pub mod package;
pub mod sheet;
pub mod writer;

use std::collections::BTreeMap;

pub use cell::CellRef;
pub use package::XlsxTemplate;
pub use sheet::Worksheet;
pub use writer::{SheetWriter, WriteStats};

/// Addressable cell space the writer fills.
pub trait Grid {
    /// Highest row holding a row entry, 0 when there is none.
    fn max_row(&self) -> u32;

    /// Empty a cell, keeping its formatting.
    fn clear(&mut self, cell: CellRef);

    /// Store a text value. An empty value clears the cell.
    fn set_text(&mut self, cell: CellRef, value: &str);
}

/// In-memory grid for tests and dry runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryGrid {
    cells: BTreeMap<CellRef, String>,
}

impl MemoryGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str, row: u32) -> Option<&str> {
        let column = cell::column_index(column)?;
        self.cells.get(&CellRef::new(column, row)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Grid for MemoryGrid {
    fn max_row(&self) -> u32 {
        self.cells.keys().map(|c| c.row).max().unwrap_or(0)
    }

    fn clear(&mut self, cell: CellRef) {
        self.cells.remove(&cell);
    }

    fn set_text(&mut self, cell: CellRef, value: &str) {
        if value.is_empty() {
            self.clear(cell);
        } else {
            self.cells.insert(cell, value.to_string());
        }
    }
}
