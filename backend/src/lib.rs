//! # Sheetfill - product export to marketplace template merger
//!
//! Sheetfill reads a shop system's product export (CSV), cleans and enriches
//! the records, and writes them into a marketplace bulk-upload template
//! (xlsx) without disturbing the template's headers, formatting or other
//! sheets.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Transform  │────▶│  Template   │
//! │  (ISO/UTF8) │     │ (encoding)  │     │ (profile)   │     │   (xlsx)    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sheetfill::{run, temu_profile, RunOptions};
//!
//! let summary = run(&temu_profile(), &RunOptions::new("export.csv", "template.xlsx"))?;
//! println!("{} rows written", summary.records_written);
//! # Ok::<(), sheetfill::PipelineError>(())
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`logs`] - Console log sink
//! - [`models`] - Records and datasets
//! - [`parser`] - CSV loading with encoding handling
//! - [`profile`] - Merge configuration
//! - [`transform`] - Record stages and the pipeline
//! - [`workbook`] - Template editing

// Core modules
pub mod error;
pub mod logs;
pub mod models;

// Parsing
pub mod parser;

// Configuration
pub mod profile;

// Transformation
pub mod transform;

// Destination
pub mod workbook;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{CsvError, PipelineError, ProfileError, WorkbookError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Dataset, Record};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{decode_content, detect_delimiter, detect_encoding, parse_csv_file, ParseResult};

// =============================================================================
// Re-exports - Profile
// =============================================================================

pub use profile::{temu_profile, ColumnTarget, Profile, Split, Target};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{run, RunOptions, RunSummary};

// =============================================================================
// Re-exports - Workbook
// =============================================================================

pub use workbook::{Grid, MemoryGrid, XlsxTemplate};
