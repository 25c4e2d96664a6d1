//! Spreadsheet cell coordinates.
//!
//! Columns are 1-based (`A` = 1, `Z` = 26, `AA` = 27), rows are 1-based.

use std::fmt;

use crate::error::{WorkbookError, WorkbookResult};

/// Largest column index allowed by the xlsx format (`XFD`).
pub const MAX_COLUMN: u32 = 16_384;

/// Parse column letters (`"A"`, `"bx"`) into a 1-based index.
pub fn column_index(letters: &str) -> Option<u32> {
    let letters = letters.trim();
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut index: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        index = index * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    (index <= MAX_COLUMN).then_some(index)
}

/// Render a 1-based column index as letters.
pub fn column_letters(mut index: u32) -> String {
    let mut letters = Vec::new();
    while index > 0 {
        let rem = (index - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        index = (index - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Inclusive list of column letters from `start` to `end`.
///
/// Returns `None` if either end is invalid or the range is reversed.
pub fn column_range(start: &str, end: &str) -> Option<Vec<String>> {
    let from = column_index(start)?;
    let to = column_index(end)?;
    (from <= to).then(|| (from..=to).map(column_letters).collect())
}

/// A single cell position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub column: u32,
    pub row: u32,
}

impl CellRef {
    pub fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Parse an A1-style reference such as `"DK5"`.
    pub fn parse(reference: &str) -> WorkbookResult<Self> {
        let split = reference
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| WorkbookError::InvalidCellRef(reference.to_string()))?;
        let (letters, digits) = reference.split_at(split);
        let column = column_index(letters.trim_start_matches('$'))
            .ok_or_else(|| WorkbookError::InvalidCellRef(reference.to_string()))?;
        let row = digits
            .parse::<u32>()
            .ok()
            .filter(|r| *r > 0)
            .ok_or_else(|| WorkbookError::InvalidCellRef(reference.to_string()))?;
        Ok(Self { column, row })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.column), self.row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_index_roundtrip_edges() {
        assert_eq!(column_index("A"), Some(1));
        assert_eq!(column_index("z"), Some(26));
        assert_eq!(column_index("AA"), Some(27));
        assert_eq!(column_index("BX"), Some(76));
        assert_eq!(column_index("XFD"), Some(MAX_COLUMN));
        assert_eq!(column_letters(76), "BX");
        assert_eq!(column_letters(211), "HC");
    }

    #[test]
    fn test_invalid_columns() {
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
        assert_eq!(column_index("XFE"), None);
        assert_eq!(column_index("ABCD"), None);
    }

    #[test]
    fn test_column_range() {
        let bullets = column_range("U", "Z").unwrap();
        assert_eq!(bullets, vec!["U", "V", "W", "X", "Y", "Z"]);

        let images = column_range("AA", "BX").unwrap();
        assert_eq!(images.len(), 50);
        assert_eq!(images.first().map(String::as_str), Some("AA"));
        assert_eq!(images.last().map(String::as_str), Some("BX"));

        assert!(column_range("Z", "U").is_none());
    }

    #[test]
    fn test_cell_ref_parse_and_display() {
        let cell = CellRef::parse("DK5").unwrap();
        assert_eq!(cell, CellRef::new(115, 5));
        assert_eq!(cell.to_string(), "DK5");
        assert!(CellRef::parse("A0").is_err());
        assert!(CellRef::parse("17").is_err());
    }
}
