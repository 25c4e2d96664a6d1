//! Writes a dataset into a grid through the profile's column mapping.
//!
//! The mapped window (every mapped column, from the start row to the last
//! existing row) is cleared first, so a shorter export never leaves rows of
//! the previous one behind.

use crate::error::{WorkbookError, WorkbookResult};
use crate::logs::{log_info, log_success, log_warning};
use crate::models::{Dataset, Record};
use crate::profile::{ColumnTarget, Profile, Split};
use crate::transform::split::{join_images, split_bullets, split_images};
use crate::transform::text::{truncate, TextSanitizer};

use super::cell::{column_index, CellRef};
use super::Grid;

/// Counts reported by [`SheetWriter::write`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Rows in the cleared window
    pub rows_cleared: u32,
    /// Distinct destination columns cleared
    pub columns_cleared: usize,
    pub rows_written: usize,
    /// Non-empty cells written
    pub cells_written: usize,
    /// Mapped source columns missing from the dataset
    pub missing_sources: Vec<String>,
}

/// A column target with its destination columns resolved to indices.
struct ResolvedTarget<'a> {
    mapping: &'a ColumnTarget,
    columns: Vec<u32>,
}

/// Fills the destination sheet from a dataset.
pub struct SheetWriter<'a> {
    columns: &'a [ColumnTarget],
    start_row: u32,
    sanitizer: TextSanitizer,
}

impl<'a> SheetWriter<'a> {
    pub fn new(profile: &'a Profile) -> Self {
        Self {
            columns: &profile.columns,
            start_row: profile.destination.start_row,
            sanitizer: TextSanitizer::new(&profile.sanitize.markdown_markers),
        }
    }

    /// Clear the mapped window, then write one row per record from the
    /// start row on.
    pub fn write<G: Grid>(&self, grid: &mut G, dataset: &Dataset) -> WorkbookResult<WriteStats> {
        let targets = self.resolve()?;
        let mut stats = WriteStats::default();

        self.clear_window(grid, &targets, &mut stats);

        let mut present = Vec::with_capacity(targets.len());
        for target in &targets {
            if dataset.has_column(&target.mapping.source) {
                present.push(target);
            } else if !stats.missing_sources.contains(&target.mapping.source) {
                log_warning(format!("Column '{}' not in CSV, skipped", target.mapping.source));
                stats.missing_sources.push(target.mapping.source.clone());
            }
        }

        log_info("Writing new data...");
        for (offset, record) in dataset.records.iter().enumerate() {
            let row = self.start_row + offset as u32;
            for target in &present {
                stats.cells_written += self.write_target(grid, target, record, row);
            }
            stats.rows_written += 1;
        }
        log_success(format!(
            "{} rows written from row {}",
            stats.rows_written, self.start_row
        ));

        Ok(stats)
    }

    /// Cell values of one record for one target, left to right.
    pub fn cell_values(&self, mapping: &ColumnTarget, record: &Record) -> Vec<String> {
        let raw = record.get(&mapping.source).unwrap_or("");
        let cap = |value: String| match mapping.max_len {
            Some(max_len) => truncate(&value, max_len),
            None => value,
        };

        if !mapping.target.is_sequence() {
            let value = match mapping.split {
                Split::Images => join_images(raw),
                _ => raw.to_string(),
            };
            return vec![cap(self.sanitizer.clean(&value))];
        }

        let width = mapping.target.columns().len();
        let parts = match mapping.split {
            Split::Bullets => split_bullets(raw),
            Split::Images => split_images(raw),
            Split::None => vec![raw.to_string()],
        };
        let mut values: Vec<String> = parts
            .iter()
            .take(width)
            .map(|part| cap(self.sanitizer.clean(part)))
            .collect();
        values.resize(width, String::new());
        values
    }

    fn resolve(&self) -> WorkbookResult<Vec<ResolvedTarget<'a>>> {
        self.columns
            .iter()
            .map(|mapping| {
                let columns = mapping
                    .target
                    .columns()
                    .into_iter()
                    .map(|letters| {
                        column_index(letters)
                            .ok_or_else(|| WorkbookError::InvalidCellRef(letters.to_string()))
                    })
                    .collect::<WorkbookResult<Vec<_>>>()?;
                Ok(ResolvedTarget { mapping, columns })
            })
            .collect()
    }

    fn clear_window<G: Grid>(&self, grid: &mut G, targets: &[ResolvedTarget], stats: &mut WriteStats) {
        let mut columns: Vec<u32> = targets.iter().flat_map(|t| t.columns.iter().copied()).collect();
        columns.sort_unstable();
        columns.dedup();
        stats.columns_cleared = columns.len();

        let max_row = grid.max_row();
        if max_row < self.start_row {
            return;
        }
        log_info(format!(
            "Clearing old entries from row {} to {}...",
            self.start_row, max_row
        ));
        for row in self.start_row..=max_row {
            for &column in &columns {
                grid.clear(CellRef::new(column, row));
            }
        }
        stats.rows_cleared = max_row - self.start_row + 1;
        log_success("Old data removed");
    }

    /// Write one target; returns the number of non-empty cells.
    fn write_target<G: Grid>(&self, grid: &mut G, target: &ResolvedTarget, record: &Record, row: u32) -> usize {
        let values = self.cell_values(target.mapping, record);

        let mut written = 0;
        for (&column, value) in target.columns.iter().zip(&values) {
            grid.set_text(CellRef::new(column, row), value);
            if !value.is_empty() {
                written += 1;
            }
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Target;
    use crate::workbook::MemoryGrid;

    fn profile(columns: Vec<ColumnTarget>) -> Profile {
        let mut profile = Profile::from_json(
            r#"{"name": "test", "destination": {"sheet_name": "Template", "start_row": 5}, "columns": []}"#,
        )
        .unwrap();
        profile.columns = columns;
        profile
    }

    fn letters(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    fn grid_with_old_rows(rows: u32) -> MemoryGrid {
        let mut grid = MemoryGrid::new();
        grid.set_text(CellRef::new(1, 1), "Header");
        for row in 5..5 + rows {
            grid.set_text(CellRef::new(1, row), "alt");
            grid.set_text(CellRef::new(3, row), "unmapped");
        }
        grid
    }

    #[test]
    fn test_clear_before_write() {
        let profile = profile(vec![ColumnTarget::single("SKU-ID", "A")]);
        let dataset = Dataset::new(
            vec!["SKU-ID".into()],
            (0..10).map(|i| Record::from_pairs([("SKU-ID", format!("N{}", i))])).collect(),
        );
        let mut grid = grid_with_old_rows(100);

        let stats = SheetWriter::new(&profile).write(&mut grid, &dataset).unwrap();

        assert_eq!(stats.rows_cleared, 100);
        assert_eq!(stats.rows_written, 10);
        assert_eq!(grid.get("A", 5), Some("N0"));
        assert_eq!(grid.get("A", 14), Some("N9"));
        assert_eq!(grid.get("A", 15), None);
        assert_eq!(grid.get("A", 104), None);
        // header and unmapped columns untouched
        assert_eq!(grid.get("A", 1), Some("Header"));
        assert_eq!(grid.get("C", 104), Some("unmapped"));
    }

    #[test]
    fn test_bullets_fan_out_and_blank_rest() {
        let profile = profile(vec![ColumnTarget::sequence(
            "Aufzählungspunkt",
            letters(&["U", "V", "W"]),
            Split::Bullets,
        )
        .with_max_len(5)]);
        let dataset = Dataset::new(
            vec!["Aufzählungspunkt".into()],
            vec![Record::from_pairs([("Aufzählungspunkt", "<li>**Robust**</li><li>Leichtgewicht</li>")])],
        );
        let mut grid = MemoryGrid::new();
        grid.set_text(CellRef::new(23, 5), "alt");

        let stats = SheetWriter::new(&profile).write(&mut grid, &dataset).unwrap();

        assert_eq!(grid.get("U", 5), Some("Robus"));
        assert_eq!(grid.get("V", 5), Some("Leich"));
        assert_eq!(grid.get("W", 5), None);
        assert_eq!(stats.cells_written, 2);
    }

    #[test]
    fn test_images_drop_extra_urls() {
        let profile = profile(vec![ColumnTarget::sequence(
            "URL für Detailbilder",
            letters(&["AA", "AB"]),
            Split::Images,
        )]);
        let dataset = Dataset::new(
            vec!["URL für Detailbilder".into()],
            vec![Record::from_pairs([("URL für Detailbilder", "http://a.jpg;0,http://b.jpg;1,http://c.jpg;2")])],
        );
        let mut grid = MemoryGrid::new();

        SheetWriter::new(&profile).write(&mut grid, &dataset).unwrap();

        assert_eq!(grid.get("AA", 5), Some("http://a.jpg"));
        assert_eq!(grid.get("AB", 5), Some("http://b.jpg"));
        assert_eq!(grid.get("AC", 5), None);
    }

    #[test]
    fn test_single_target_sanitizes_and_truncates() {
        let profile = profile(vec![
            ColumnTarget::single("Produktname", "D"),
            ColumnTarget::single("URL für SKU-Bilder", "DO").with_max_len(8),
        ]);
        let record = Record::from_pairs([
            ("Produktname", "<b>Spiegel</b>&nbsp;links"),
            ("URL für SKU-Bilder", "http://cdn/abc.jpg"),
        ]);
        let writer = SheetWriter::new(&profile);

        assert_eq!(writer.cell_values(&profile.columns[0], &record), vec!["Spiegel links"]);
        assert_eq!(writer.cell_values(&profile.columns[1], &record), vec!["http://c"]);
    }

    #[test]
    fn test_single_target_with_image_split_joins() {
        let mapping = ColumnTarget {
            split: Split::Images,
            ..ColumnTarget::single("URL für Detailbilder", "AA")
        };
        let profile = profile(vec![mapping]);
        let record = Record::from_pairs([("URL für Detailbilder", "http://a.jpg;0,http://b.jpg;1,")]);

        let values = SheetWriter::new(&profile).cell_values(&profile.columns[0], &record);
        assert_eq!(values, vec!["http://a.jpg|http://b.jpg"]);
    }

    #[test]
    fn test_sequence_without_split_uses_first_column() {
        let profile = profile(vec![ColumnTarget {
            target: Target::Sequence(letters(&["E", "F"])),
            ..ColumnTarget::single("Farbe", "E")
        }]);
        let record = Record::from_pairs([("Farbe", "_Rot_")]);

        let values = SheetWriter::new(&profile).cell_values(&profile.columns[0], &record);
        assert_eq!(values, vec!["Rot".to_string(), String::new()]);
    }

    #[test]
    fn test_missing_source_warns_once_and_still_clears() {
        let profile = profile(vec![
            ColumnTarget::single("Marke", "A"),
            ColumnTarget::single("Marke", "B"),
        ]);
        let dataset = Dataset::new(vec!["SKU-ID".into()], vec![Record::from_pairs([("SKU-ID", "1")])]);
        let mut grid = grid_with_old_rows(3);

        let stats = SheetWriter::new(&profile).write(&mut grid, &dataset).unwrap();

        assert_eq!(stats.missing_sources, vec!["Marke".to_string()]);
        assert_eq!(grid.get("A", 5), None);
        assert_eq!(stats.cells_written, 0);
    }

    #[test]
    fn test_absent_value_blanks_cell() {
        let profile = profile(vec![ColumnTarget::single("Marke", "A")]);
        let dataset = Dataset::new(vec!["Marke".into()], vec![Record::new()]);
        let mut grid = MemoryGrid::new();

        SheetWriter::new(&profile).write(&mut grid, &dataset).unwrap();
        assert!(grid.is_empty());
    }
}
