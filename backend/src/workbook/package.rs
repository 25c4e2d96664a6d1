//! The xlsx package of a destination template.
//!
//! The package is held in memory. Saving rebuilds the zip: every entry except
//! the edited worksheet is copied compressed as-is, the worksheet is written
//! with its original timestamp, so the same input always gives the same bytes.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use tempfile::NamedTempFile;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::sheet::Worksheet;
use crate::error::{WorkbookError, WorkbookResult};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

/// A sheet listed in `xl/workbook.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    /// Zip entry of the worksheet part, e.g. `xl/worksheets/sheet1.xml`
    pub part: String,
}

/// An opened template with one worksheet loaded for editing.
#[derive(Debug, Clone)]
pub struct XlsxTemplate {
    source: Option<PathBuf>,
    package: Vec<u8>,
    sheets: Vec<SheetEntry>,
    target: SheetEntry,
    sheet: Worksheet,
}

impl XlsxTemplate {
    /// Open `path` and load `sheet_name`.
    pub fn open(path: impl AsRef<Path>, sheet_name: &str) -> WorkbookResult<Self> {
        let path = path.as_ref();
        let package = std::fs::read(path)?;
        let mut template = Self::from_bytes(package, sheet_name)?;
        template.source = Some(path.to_path_buf());
        Ok(template)
    }

    /// Load `sheet_name` from package bytes.
    pub fn from_bytes(package: Vec<u8>, sheet_name: &str) -> WorkbookResult<Self> {
        let mut archive = ZipArchive::new(Cursor::new(package.as_slice()))?;
        let sheets = list_sheets(&mut archive)?;

        let target = sheets
            .iter()
            .find(|s| s.name == sheet_name)
            .cloned()
            .ok_or_else(|| WorkbookError::SheetNotFound {
                name: sheet_name.to_string(),
                available: sheets
                    .iter()
                    .map(|s| s.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;

        let xml = read_part(&mut archive, &target.part)?;
        let sheet = Worksheet::parse(&target.part, &xml)?;
        drop(archive);

        Ok(Self {
            source: None,
            package,
            sheets,
            target,
            sheet,
        })
    }

    /// Path the template was opened from.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn sheets(&self) -> &[SheetEntry] {
        &self.sheets
    }

    pub fn sheet_name(&self) -> &str {
        &self.target.name
    }

    pub fn sheet(&self) -> &Worksheet {
        &self.sheet
    }

    pub fn sheet_mut(&mut self) -> &mut Worksheet {
        &mut self.sheet
    }

    /// Serialize the package with the edited worksheet.
    pub fn to_bytes(&self) -> WorkbookResult<Vec<u8>> {
        let mut archive = ZipArchive::new(Cursor::new(self.package.as_slice()))?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(self.package.len())));

        for index in 0..archive.len() {
            let entry = archive.by_index_raw(index)?;
            if entry.name() == self.target.part {
                let options = FileOptions::default()
                    .compression_method(CompressionMethod::Deflated)
                    .last_modified_time(entry.last_modified());
                let name = entry.name().to_string();
                drop(entry);
                writer.start_file(name, options)?;
                writer.write_all(&self.sheet.to_xml())?;
            } else {
                writer.raw_copy_file(entry)?;
            }
        }

        Ok(writer.finish()?.into_inner())
    }

    /// Write the package to `path` atomically.
    ///
    /// The bytes go to a temporary file in the destination directory which
    /// then replaces `path`, so a failure leaves the old file intact. An
    /// existing file's permissions carry over.
    pub fn save(&self, path: impl AsRef<Path>) -> WorkbookResult<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        // temp files are created 0600; keep the replaced file's mode
        if let Ok(metadata) = std::fs::metadata(path) {
            tmp.as_file().set_permissions(metadata.permissions())?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| WorkbookError::IoError(e.error))?;
        Ok(())
    }
}

// =============================================================================
// Package parts
// =============================================================================

fn read_part<R: std::io::Read + std::io::Seek>(archive: &mut ZipArchive<R>, name: &str) -> WorkbookResult<Vec<u8>> {
    use std::io::Read;

    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(WorkbookError::MissingPart(name.to_string()))
        }
        Err(e) => return Err(e.into()),
    };
    let mut content = Vec::new();
    file.read_to_end(&mut content)?;
    Ok(content)
}

/// Sheets in workbook order with their resolved worksheet parts.
fn list_sheets<R: std::io::Read + std::io::Seek>(archive: &mut ZipArchive<R>) -> WorkbookResult<Vec<SheetEntry>> {
    let workbook = read_part(archive, WORKBOOK_PART)?;
    let rels = read_part(archive, WORKBOOK_RELS_PART)?;
    let targets = parse_relationships(&rels)?;

    parse_sheet_ids(&workbook)?
        .into_iter()
        .map(|(name, rel_id)| {
            let target = targets
                .iter()
                .find(|(id, _)| *id == rel_id)
                .map(|(_, target)| target.as_str())
                .ok_or_else(|| WorkbookError::Xml {
                    part: WORKBOOK_RELS_PART.to_string(),
                    message: format!("no relationship '{}' for sheet '{}'", rel_id, name),
                })?;
            Ok(SheetEntry {
                name,
                part: resolve_target(target),
            })
        })
        .collect()
}

/// `(name, r:id)` of every `<sheet>` in `xl/workbook.xml`.
fn parse_sheet_ids(xml: &[u8]) -> WorkbookResult<Vec<(String, String)>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut sheets = Vec::new();
    loop {
        match reader.read_event().map_err(|e| part_error(WORKBOOK_PART, e))? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut rel_id = None;
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| part_error(WORKBOOK_PART, e))?;
                    let value = attr
                        .decode_and_unescape_value(&reader)
                        .map_err(|e| part_error(WORKBOOK_PART, e))?
                        .into_owned();
                    match (attr.key.prefix().is_some(), attr.key.local_name().as_ref()) {
                        (false, b"name") => name = Some(value),
                        (true, b"id") => rel_id = Some(value),
                        _ => {}
                    }
                }
                if let (Some(name), Some(rel_id)) = (name, rel_id) {
                    sheets.push((name, rel_id));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(sheets)
}

/// `(Id, Target)` of every relationship.
fn parse_relationships(xml: &[u8]) -> WorkbookResult<Vec<(String, String)>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut relationships = Vec::new();
    loop {
        match reader.read_event().map_err(|e| part_error(WORKBOOK_RELS_PART, e))? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| part_error(WORKBOOK_RELS_PART, e))?;
                    let value = attr
                        .decode_and_unescape_value(&reader)
                        .map_err(|e| part_error(WORKBOOK_RELS_PART, e))?
                        .into_owned();
                    match attr.key.as_ref() {
                        b"Id" => id = Some(value),
                        b"Target" => target = Some(value),
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    relationships.push((id, target));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(relationships)
}

/// Zip entry name of a workbook relationship target.
///
/// Targets are relative to `xl/` unless they start with `/`.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => {
            let mut parts: Vec<&str> = vec!["xl"];
            for segment in target.split('/') {
                match segment {
                    "" | "." => {}
                    ".." => {
                        parts.pop();
                    }
                    other => parts.push(other),
                }
            }
            parts.join("/")
        }
    }
}

fn part_error(part: &str, err: impl std::fmt::Display) -> WorkbookError {
    WorkbookError::Xml {
        part: part.to_string(),
        message: err.to_string(),
    }
}
