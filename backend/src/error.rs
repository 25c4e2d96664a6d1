//! Error types for the sheetfill pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`CsvError`] - Source export loading errors
//! - [`ProfileError`] - Invalid profile (mapping, rules, settings)
//! - [`WorkbookError`] - Template package / sheet errors
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Per-field problems (unparseable numbers, bad quantity strings, missing
//! optional columns) never surface here: stages recover them locally and
//! log a warning instead.

use thiserror::Error;

// =============================================================================
// CSV Loading Errors
// =============================================================================

/// Errors while loading the source export.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode the file contents.
    #[error("Failed to decode content: {0}")]
    EncodingError(String),

    /// Invalid CSV record.
    #[error("Invalid CSV at line {line}: {message}")]
    ParseError { line: u64, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        match err.into_kind() {
            csv::ErrorKind::Io(io) => CsvError::IoError(io),
            kind => CsvError::ParseError {
                line,
                message: format!("{:?}", kind),
            },
        }
    }
}

// =============================================================================
// Profile Errors
// =============================================================================

/// Errors in a merge profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Profile file could not be read.
    #[error("Failed to read profile: {0}")]
    IoError(#[from] std::io::Error),

    /// Profile JSON is malformed.
    #[error("Invalid profile JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A category pattern does not compile.
    #[error("Invalid pattern '{pattern}' in category {code}: {message}")]
    InvalidPattern {
        code: u32,
        pattern: String,
        message: String,
    },

    /// A destination column is not a valid spreadsheet column.
    #[error("Invalid destination column '{0}'")]
    InvalidColumn(String),

    /// Any other inconsistent setting.
    #[error("Invalid profile setting '{field}': {message}")]
    InvalidSetting { field: String, message: String },
}

// =============================================================================
// Workbook Errors
// =============================================================================

/// Errors while opening, editing or saving the destination template.
#[derive(Debug, Error)]
pub enum WorkbookError {
    /// IO error.
    #[error("Workbook IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The package is not a readable zip archive.
    #[error("Invalid xlsx package: {0}")]
    Zip(String),

    /// XML could not be parsed.
    #[error("XML error in '{part}': {message}")]
    Xml { part: String, message: String },

    /// A required package part is missing.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// The configured sheet does not exist.
    #[error("Sheet '{name}' not found in workbook (available: {available})")]
    SheetNotFound { name: String, available: String },

    /// Cell reference could not be decoded.
    #[error("Invalid cell reference '{0}'")]
    InvalidCellRef(String),
}

impl From<zip::result::ZipError> for WorkbookError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => WorkbookError::IoError(io),
            other => WorkbookError::Zip(other.to_string()),
        }
    }
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::transform::pipeline::run`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV loading error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Profile error.
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    /// Workbook error.
    #[error("Workbook error: {0}")]
    Workbook(#[from] WorkbookError),

    /// Report could not be written.
    #[error("Report error: {0}")]
    Report(String),

    /// No records left to write and the run refuses to only clear.
    #[error("No records to transfer")]
    EmptyInput,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for profile operations.
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Result type for workbook operations.
pub type WorkbookResult<T> = Result<T, WorkbookError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // CsvError -> PipelineError
        let csv_err = CsvError::EmptyFile;
        let pipeline_err: PipelineError = csv_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // WorkbookError -> PipelineError
        let wb_err = WorkbookError::SheetNotFound {
            name: "Template".into(),
            available: "Sheet1".into(),
        };
        let pipeline_err: PipelineError = wb_err.into();
        assert!(pipeline_err.to_string().contains("Template"));
        assert!(pipeline_err.to_string().contains("Sheet1"));
    }

    #[test]
    fn test_pattern_error_format() {
        let err = ProfileError::InvalidPattern {
            code: 21842,
            pattern: "(unclosed".into(),
            message: "unclosed group".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("21842"));
        assert!(msg.contains("(unclosed"));
    }
}
