//! Cell model of a worksheet part.
//!
//! Only `<sheetData>` is parsed. The bytes before and after it, rows the
//! writer never touches and cells it never touches are written back exactly
//! as they were read. Written values are inline strings, so the shared
//! string table is never rewritten.
//!
//! ```text
//! <worksheet ...><sheetFormatPr/>...<sheetData>   head (verbatim)
//!   <row r="1">...</row>                          untouched row (verbatim)
//!   <row r="5"><c r="B5" s="3" t="inlineStr">...  touched row (rebuilt)
//! </sheetData><mergeCells>...</worksheet>          tail (verbatim)
//! ```

use std::collections::BTreeMap;
use std::fmt::Display;

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::cell::CellRef;
use super::Grid;
use crate::error::{WorkbookError, WorkbookResult};

/// Row attribute dropped when a row is rebuilt; Excel recomputes it.
const SPANS_ATTR: &str = "spans";

#[derive(Debug, Clone, PartialEq)]
enum CellContent {
    /// Original `<c>` element bytes
    Raw(Vec<u8>),
    /// Cleared, formatting kept
    Empty,
    /// Written inline string
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
struct SheetCell {
    style: Option<String>,
    content: CellContent,
}

#[derive(Debug, Clone, PartialEq)]
struct SheetRow {
    /// Original `<row>` bytes, dropped once the row is edited
    raw: Option<Vec<u8>>,
    attrs: Vec<(String, String)>,
    cells: BTreeMap<u32, SheetCell>,
}

impl SheetRow {
    fn new(number: u32) -> Self {
        Self {
            raw: None,
            attrs: vec![("r".to_string(), number.to_string())],
            cells: BTreeMap::new(),
        }
    }
}

/// Editable `<sheetData>` of one worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Worksheet {
    head: Vec<u8>,
    tail: Vec<u8>,
    /// Namespace prefix of the spreadsheetml elements, `""` or `"x:"`
    prefix: String,
    rows: BTreeMap<u32, SheetRow>,
}

impl Worksheet {
    /// Parse a worksheet part. `part` only names the part in errors.
    pub fn parse(part: &str, xml: &[u8]) -> WorkbookResult<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(false);

        loop {
            let start = reader.buffer_position();
            match reader.read_event().map_err(|e| xml_error(part, e))? {
                Event::Start(e) if e.local_name().as_ref() == b"sheetData" => {
                    let head = xml[..reader.buffer_position()].to_vec();
                    let prefix = element_prefix(&e);
                    let (rows, end) = parse_rows(&mut reader, xml, part)?;
                    return Ok(Self {
                        head,
                        tail: xml[end..].to_vec(),
                        prefix,
                        rows,
                    });
                }
                Event::Empty(e) if e.local_name().as_ref() == b"sheetData" => {
                    // <sheetData/> is split into an open and a close tag so
                    // rows can be inserted between them
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    let mut head = xml[..start].to_vec();
                    head.extend_from_slice(format!("<{}>", name).as_bytes());
                    let mut tail = format!("</{}>", name).into_bytes();
                    tail.extend_from_slice(&xml[reader.buffer_position()..]);
                    return Ok(Self {
                        head,
                        tail,
                        prefix: element_prefix(&e),
                        rows: BTreeMap::new(),
                    });
                }
                Event::Eof => return Err(xml_error(part, "no <sheetData> element")),
                _ => {}
            }
        }
    }

    /// Serialize the worksheet part.
    pub fn to_xml(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.head.len() + self.tail.len() + self.rows.len() * 128);
        out.extend_from_slice(&self.head);
        for (number, row) in &self.rows {
            match &row.raw {
                Some(raw) => out.extend_from_slice(raw),
                None => self.write_row(&mut out, *number, row),
            }
        }
        out.extend_from_slice(&self.tail);
        out
    }

    /// Text written through [`Grid::set_text`], if any.
    pub fn written_text(&self, cell: CellRef) -> Option<&str> {
        match &self.rows.get(&cell.row)?.cells.get(&cell.column)?.content {
            CellContent::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Whether the sheet has a `<c>` element at `cell`.
    pub fn has_cell(&self, cell: CellRef) -> bool {
        self.rows
            .get(&cell.row)
            .map_or(false, |row| row.cells.contains_key(&cell.column))
    }

    /// Number of rows that would be rebuilt on save.
    pub fn touched_rows(&self) -> usize {
        self.rows.values().filter(|row| row.raw.is_none()).count()
    }

    fn write_row(&self, out: &mut Vec<u8>, number: u32, row: &SheetRow) {
        let p = &self.prefix;
        out.extend_from_slice(format!("<{}row", p).as_bytes());
        for (key, value) in &row.attrs {
            if key != SPANS_ATTR {
                write_attr(out, key, value);
            }
        }
        if row.cells.is_empty() {
            out.extend_from_slice(b"/>");
            return;
        }
        out.push(b'>');
        for (column, cell) in &row.cells {
            self.write_cell(out, CellRef::new(*column, number), cell);
        }
        out.extend_from_slice(format!("</{}row>", p).as_bytes());
    }

    fn write_cell(&self, out: &mut Vec<u8>, at: CellRef, cell: &SheetCell) {
        let p = &self.prefix;
        match &cell.content {
            CellContent::Raw(raw) => out.extend_from_slice(raw),
            CellContent::Empty => {
                self.open_cell(out, at, cell.style.as_deref());
                out.extend_from_slice(b"/>");
            }
            CellContent::Text(text) => {
                self.open_cell(out, at, cell.style.as_deref());
                write_attr(out, "t", "inlineStr");
                out.extend_from_slice(
                    format!(
                        "><{p}is><{p}t xml:space=\"preserve\">{}</{p}t></{p}is></{p}c>",
                        escape(text.as_str()),
                        p = p
                    )
                    .as_bytes(),
                );
            }
        }
    }

    fn open_cell(&self, out: &mut Vec<u8>, at: CellRef, style: Option<&str>) {
        out.extend_from_slice(format!("<{}c", self.prefix).as_bytes());
        write_attr(out, "r", &at.to_string());
        if let Some(style) = style {
            write_attr(out, "s", style);
        }
    }
}

impl Grid for Worksheet {
    fn max_row(&self) -> u32 {
        self.rows.keys().next_back().copied().unwrap_or(0)
    }

    fn clear(&mut self, cell: CellRef) {
        let Some(row) = self.rows.get_mut(&cell.row) else {
            return;
        };
        let styled = match row.cells.get(&cell.column) {
            Some(existing) => existing.style.is_some(),
            None => return,
        };

        if styled {
            if let Some(existing) = row.cells.get_mut(&cell.column) {
                if existing.content == CellContent::Empty {
                    return;
                }
                existing.content = CellContent::Empty;
            }
        } else {
            row.cells.remove(&cell.column);
        }
        row.raw = None;
    }

    fn set_text(&mut self, cell: CellRef, value: &str) {
        if value.is_empty() {
            self.clear(cell);
            return;
        }

        let text = xml_safe(value);
        let row = self
            .rows
            .entry(cell.row)
            .or_insert_with(|| SheetRow::new(cell.row));
        row.raw = None;
        match row.cells.get_mut(&cell.column) {
            Some(existing) => existing.content = CellContent::Text(text),
            None => {
                row.cells.insert(
                    cell.column,
                    SheetCell {
                        style: None,
                        content: CellContent::Text(text),
                    },
                );
            }
        }
    }
}

// =============================================================================
// Parsing helpers
// =============================================================================

/// Rows up to `</sheetData>`; also returns the offset of that end tag.
fn parse_rows(
    reader: &mut Reader<&[u8]>,
    xml: &[u8],
    part: &str,
) -> WorkbookResult<(BTreeMap<u32, SheetRow>, usize)> {
    let mut rows = BTreeMap::new();
    let mut last_row = 0;

    loop {
        let start = reader.buffer_position();
        match reader.read_event().map_err(|e| xml_error(part, e))? {
            Event::Start(e) if e.local_name().as_ref() == b"row" => {
                let (number, attrs) = row_attrs(&e, last_row, part)?;
                let cells = parse_cells(reader, xml, number, part)?;
                let raw = xml[start..reader.buffer_position()].to_vec();
                rows.insert(number, SheetRow { raw: Some(raw), attrs, cells });
                last_row = number;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                let (number, attrs) = row_attrs(&e, last_row, part)?;
                let raw = xml[start..reader.buffer_position()].to_vec();
                rows.insert(number, SheetRow { raw: Some(raw), attrs, cells: BTreeMap::new() });
                last_row = number;
            }
            Event::End(e) if e.local_name().as_ref() == b"sheetData" => return Ok((rows, start)),
            Event::Eof => return Err(xml_error(part, "unterminated <sheetData>")),
            _ => {}
        }
    }
}

fn parse_cells(
    reader: &mut Reader<&[u8]>,
    xml: &[u8],
    row: u32,
    part: &str,
) -> WorkbookResult<BTreeMap<u32, SheetCell>> {
    let mut cells = BTreeMap::new();
    let mut last_column = 0;

    loop {
        let start = reader.buffer_position();
        match reader.read_event().map_err(|e| xml_error(part, e))? {
            Event::Start(e) if e.local_name().as_ref() == b"c" => {
                let (column, style) = cell_attrs(&e, row, last_column, part)?;
                let end = e.to_end().into_owned();
                reader
                    .read_to_end(end.name())
                    .map_err(|e| xml_error(part, e))?;
                let raw = xml[start..reader.buffer_position()].to_vec();
                cells.insert(column, SheetCell { style, content: CellContent::Raw(raw) });
                last_column = column;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                let (column, style) = cell_attrs(&e, row, last_column, part)?;
                let raw = xml[start..reader.buffer_position()].to_vec();
                cells.insert(column, SheetCell { style, content: CellContent::Raw(raw) });
                last_column = column;
            }
            Event::End(e) if e.local_name().as_ref() == b"row" => return Ok(cells),
            Event::Eof => return Err(xml_error(part, format!("unterminated row {}", row))),
            _ => {}
        }
    }
}

/// Row number (`r`, or the next one when missing) and raw attributes.
fn row_attrs(e: &BytesStart, last_row: u32, part: &str) -> WorkbookResult<(u32, Vec<(String, String)>)> {
    let mut number = None;
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| xml_error(part, e))?;
        let key = utf8(attr.key.as_ref(), part)?;
        let value = utf8(&attr.value, part)?;
        if key == "r" {
            number = Some(
                value
                    .parse::<u32>()
                    .map_err(|_| xml_error(part, format!("invalid row number '{}'", value)))?,
            );
        }
        attrs.push((key, value));
    }
    Ok((number.unwrap_or(last_row + 1), attrs))
}

/// Column (from `r`, or the next one when missing) and style of a `<c>`.
fn cell_attrs(
    e: &BytesStart,
    row: u32,
    last_column: u32,
    part: &str,
) -> WorkbookResult<(u32, Option<String>)> {
    let mut column = None;
    let mut style = None;
    for attr in e.attributes() {
        let attr = attr.map_err(|e| xml_error(part, e))?;
        match attr.key.as_ref() {
            b"r" => {
                let reference = CellRef::parse(&utf8(&attr.value, part)?)?;
                if reference.row != row {
                    return Err(xml_error(
                        part,
                        format!("cell {} listed under row {}", reference, row),
                    ));
                }
                column = Some(reference.column);
            }
            b"s" => style = Some(utf8(&attr.value, part)?),
            _ => {}
        }
    }
    Ok((column.unwrap_or(last_column + 1), style))
}

fn element_prefix(e: &BytesStart) -> String {
    e.name()
        .prefix()
        .map(|p| format!("{}:", String::from_utf8_lossy(p.as_ref())))
        .unwrap_or_default()
}

fn utf8(bytes: &[u8], part: &str) -> WorkbookResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| xml_error(part, e))
}

fn xml_error(part: &str, err: impl Display) -> WorkbookError {
    WorkbookError::Xml {
        part: part.to_string(),
        message: err.to_string(),
    }
}

// =============================================================================
// Serialization helpers
// =============================================================================

fn write_attr(out: &mut Vec<u8>, key: &str, raw_value: &str) {
    // values are kept in their escaped form; only a bare quote needs care
    // when the source used single-quoted attributes
    out.extend_from_slice(format!(" {}=\"{}\"", key, raw_value.replace('"', "&quot;")).as_bytes());
}

/// Drop characters XML 1.0 does not allow.
fn xml_safe(value: &str) -> String {
    value
        .chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
        })
        .collect()
}
