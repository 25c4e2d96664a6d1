//! Source export loader.
//!
//! Reads a delimited product export into a [`Dataset`]. Every field stays
//! text; empty fields are absent. Number parsing belongs to the normalizer.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::{Dataset, Record};

/// Result of loading with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Loaded records and headers
    pub dataset: Dataset,
    /// Encoding used for decoding
    pub encoding: String,
    /// Delimiter used for splitting
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "iso-8859-15" | "latin-9" | "latin9" => "iso-8859-15".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// `auto` runs [`detect_encoding`] first. Unknown names fall back to lossy
/// UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<(String, String)> {
    let encoding = match encoding.to_lowercase().as_str() {
        "auto" => detect_encoding(bytes),
        other => other.to_string(),
    };

    let text = match encoding.as_str() {
        "utf-8" | "utf8" | "ascii" => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(e) => {
                return Err(CsvError::EncodingError(format!(
                    "file is not valid UTF-8 ({}); try --encoding auto",
                    e
                )))
            }
        },
        // every Latin-1 byte is the code point of the same value
        "iso-8859-1" | "latin-1" | "latin1" => bytes.iter().map(|&b| char::from(b)).collect(),
        "iso-8859-15" | "latin-9" | "latin9" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    Ok((text, encoding))
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ';';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse delimited text into a dataset.
///
/// Quoted fields may contain the delimiter and line breaks. Blank lines are
/// skipped, a UTF-8 BOM is dropped and repeated header names get `.1`, `.2`
/// suffixes.
///
/// # Example
/// ```
/// use sheetfill::parser::parse_str;
///
/// let dataset = parse_str("SKU-ID;Anzahl\n100;2\n101;", ';').unwrap();
///
/// assert_eq!(dataset.len(), 2);
/// assert_eq!(dataset.records[0].get("Anzahl"), Some("2"));
/// assert_eq!(dataset.records[1].get("Anzahl"), None);
/// ```
pub fn parse_str(content: &str, delimiter: char) -> CsvResult<Dataset> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let delimiter = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| CsvError::ParseError {
            line: 0,
            message: format!("delimiter '{}' is not a single ASCII character", delimiter),
        })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = dedupe_headers(reader.headers()?.iter().map(|h| h.trim().to_string()));
    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        if row.iter().all(|field| field.is_empty()) {
            continue;
        }
        records.push(Record::from_pairs(
            headers.iter().zip(row.iter()).map(|(h, v)| (h.clone(), v)),
        ));
    }

    Ok(Dataset::new(headers, records))
}

/// Parse raw bytes with the given delimiter and encoding (`auto` allowed).
pub fn parse_bytes(bytes: &[u8], delimiter: char, encoding: &str) -> CsvResult<ParseResult> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }
    let (content, encoding) = decode_content(bytes, encoding)?;
    let dataset = parse_str(&content, delimiter)?;

    Ok(ParseResult {
        dataset,
        encoding,
        delimiter,
    })
}

/// Parse a CSV file from disk.
pub fn parse_csv_file<P: AsRef<Path>>(path: P, delimiter: char, encoding: &str) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes(&bytes, delimiter, encoding)
}

fn dedupe_headers(raw: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.map(|name| {
        let count = seen.entry(name.clone()).or_insert(0);
        let unique = if *count == 0 {
            name
        } else {
            format!("{}.{}", name, count)
        };
        *count += 1;
        unique
    })
    .collect()
}
