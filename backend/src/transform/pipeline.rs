//! End-to-end merge of a product export into a marketplace template.
//!
//! ```text
//! load → normalize → aggregate → classify → filter → clear + write → save
//! ```
//!
//! Everything that can fail on bad configuration (patterns, sheet name) fails
//! before the destination is touched, and the destination is only replaced
//! once every row has been written.
//!
//! # Example
//!
//! ```rust,no_run
//! use sheetfill::profile::temu_profile;
//! use sheetfill::transform::pipeline::{run, RunOptions};
//!
//! let options = RunOptions::new("export.csv", "template.xlsx");
//! let summary = run(&temu_profile(), &options)?;
//! println!("{} rows written", summary.records_written);
//! # Ok::<(), sheetfill::error::PipelineError>(())
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::classify::CategoryClassifier;
use super::filter::RowFilter;
use super::normalize::{NormalizeStats, Normalizer};
use super::quantity::QuantityAggregator;
use crate::error::{PipelineError, PipelineResult};
use crate::logs::{log_error, log_info, log_success, log_warning, LogLevel, LOG_SINK};
use crate::models::Dataset;
use crate::parser::{parse_csv_file, ParseResult};
use crate::profile::Profile;
use crate::workbook::{SheetWriter, XlsxTemplate};

/// Paths and switches of one run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Product export (CSV)
    pub source: PathBuf,

    /// Destination template (xlsx), updated in place unless `output` is set
    pub template: PathBuf,

    /// Write the result here instead of over the template
    pub output: Option<PathBuf>,

    /// Run every stage but do not save
    pub dry_run: bool,

    /// Write a JSON run report here
    pub report: Option<PathBuf>,

    /// Overrides the profile's source encoding (`auto` allowed)
    pub encoding: Option<String>,

    /// Overrides the profile's source delimiter
    pub delimiter: Option<char>,

    /// Fail instead of saving a template whose data window is only cleared
    pub refuse_empty: bool,
}

impl RunOptions {
    pub fn new(source: impl Into<PathBuf>, template: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            template: template.into(),
            output: None,
            dry_run: false,
            report: None,
            encoding: None,
            delimiter: None,
            refuse_empty: false,
        }
    }

    /// Where the merged workbook is saved.
    pub fn destination(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.template)
    }
}

/// Outcome of a run, also written as the JSON report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub profile: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub encoding: String,
    pub delimiter: char,
    pub records_loaded: usize,
    pub quantities_defaulted: usize,
    pub dimension_fallbacks: usize,
    pub categories_assigned: Option<usize>,
    pub excluded_by_keyword: Option<usize>,
    pub excluded_incomplete: Option<usize>,
    pub records_written: usize,
    pub rows_cleared: u32,
    pub cells_written: usize,
    pub missing_columns: Vec<String>,
    pub dry_run: bool,
    pub saved: bool,
    /// Warnings logged during the run
    pub warnings: Vec<String>,
    pub finished_at: DateTime<Utc>,
}

/// Load the source export with the profile's settings and any overrides.
pub fn load_source(profile: &Profile, options: &RunOptions) -> PipelineResult<ParseResult> {
    let encoding = options
        .encoding
        .as_deref()
        .unwrap_or(&profile.source.encoding);
    let delimiter = options.delimiter.unwrap_or(profile.source.delimiter);

    log_info("📖 Reading CSV file...");
    let parsed = parse_csv_file(&options.source, delimiter, encoding)?;
    log_success(format!("Encoding: {}", parsed.encoding));
    log_success(format!("Separator: '{}'", format_delimiter(parsed.delimiter)));
    log_success(format!("Read {} rows", parsed.dataset.len()));
    Ok(parsed)
}

/// Run every record stage on a loaded dataset.
///
/// The classifier is passed in compiled so pattern errors surface before
/// any file is read.
pub fn prepare_dataset(
    profile: &Profile,
    classifier: Option<&CategoryClassifier>,
    dataset: &mut Dataset,
) -> PreparedStats {
    log_info("🧹 Normalizing fields...");
    let normalize = Normalizer::new(&profile.normalize).apply(dataset);

    if let Some(settings) = &profile.aggregate {
        QuantityAggregator::new(settings).apply(dataset);
    }

    let categories_assigned = classifier.and_then(|c| c.apply(dataset));

    log_info("🔎 Filtering records...");
    let filter = RowFilter::new(&profile.filter).apply(dataset);
    log_success(format!("{} records remain", dataset.len()));

    PreparedStats {
        normalize,
        categories_assigned,
        excluded_by_keyword: filter.keyword_dropped,
        excluded_incomplete: filter.incomplete_dropped,
    }
}

/// Counts of the record stages
#[derive(Debug, Clone, Default)]
pub struct PreparedStats {
    pub normalize: NormalizeStats,
    pub categories_assigned: Option<usize>,
    pub excluded_by_keyword: Option<usize>,
    pub excluded_incomplete: Option<usize>,
}

/// Merge the source export into the template.
pub fn run(profile: &Profile, options: &RunOptions) -> PipelineResult<RunSummary> {
    let mark = LOG_SINK.mark();
    profile.validate()?;
    let classifier = profile
        .classify
        .as_ref()
        .map(CategoryClassifier::new)
        .transpose()?;

    let ParseResult {
        mut dataset,
        encoding,
        delimiter,
    } = load_source(profile, options)?;
    let records_loaded = dataset.len();

    log_info(format!("📋 CSV has {} columns:", dataset.headers.len()));
    for (i, col) in dataset.headers.iter().enumerate() {
        log_info(format!("[{:2}] {}", i + 1, col));
    }

    let prepared = prepare_dataset(profile, classifier.as_ref(), &mut dataset);
    if dataset.is_empty() {
        if options.refuse_empty {
            return Err(PipelineError::EmptyInput);
        }
        log_warning("No records to write, the data window is only cleared");
    }

    log_info(format!(
        "📄 Opening sheet '{}' of {}...",
        profile.destination.sheet_name,
        options.template.display()
    ));
    let mut template = XlsxTemplate::open(&options.template, &profile.destination.sheet_name)?;
    let written = SheetWriter::new(profile).write(template.sheet_mut(), &dataset)?;

    let destination = options.destination().to_path_buf();
    let saved = if options.dry_run {
        log_warning("Dry run, workbook not saved");
        false
    } else {
        if let Err(e) = template.save(&destination) {
            log_error(format!("Could not save {}", destination.display()));
            return Err(e.into());
        }
        log_success(format!("💾 Saved {}", destination.display()));
        true
    };

    let warnings = LOG_SINK
        .since(mark)
        .into_iter()
        .filter(|entry| entry.level == LogLevel::Warning)
        .map(|entry| entry.message)
        .collect();

    let summary = RunSummary {
        profile: profile.name.clone(),
        source: options.source.clone(),
        destination,
        encoding,
        delimiter,
        records_loaded,
        quantities_defaulted: prepared.normalize.quantity_defaulted,
        dimension_fallbacks: prepared.normalize.dimension_fallbacks,
        categories_assigned: prepared.categories_assigned,
        excluded_by_keyword: prepared.excluded_by_keyword,
        excluded_incomplete: prepared.excluded_incomplete,
        records_written: written.rows_written,
        rows_cleared: written.rows_cleared,
        cells_written: written.cells_written,
        missing_columns: written.missing_sources,
        dry_run: options.dry_run,
        saved,
        warnings,
        finished_at: Utc::now(),
    };

    if let Some(path) = &options.report {
        write_report(&summary, path)?;
        log_success(format!("Report written to {}", path.display()));
    }

    Ok(summary)
}

/// Write a run summary as pretty JSON.
pub fn write_report(summary: &RunSummary, path: &Path) -> PipelineResult<()> {
    let json = serde_json::to_string_pretty(summary).map_err(|e| PipelineError::Report(e.to_string()))?;
    std::fs::write(path, json)
        .map_err(|e| PipelineError::Report(format!("{}: {}", path.display(), e)))
}

/// Format delimiter for display
fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProfileError;
    use crate::models::Record;
    use crate::profile::{temu_profile, CategoryRule, ColumnTarget};

    #[test]
    fn test_destination_defaults_to_template() {
        let mut options = RunOptions::new("a.csv", "vorlage.xlsx");
        assert_eq!(options.destination(), Path::new("vorlage.xlsx"));
        options.output = Some("neu.xlsx".into());
        assert_eq!(options.destination(), Path::new("neu.xlsx"));
    }

    #[test]
    fn test_prepare_dataset_stage_order() {
        let profile = temu_profile();
        let classifier = CategoryClassifier::new(profile.classify.as_ref().unwrap()).unwrap();
        let mut dataset = Dataset::new(
            vec![
                "Produktname".into(),
                "Kategorie".into(),
                "Kategoriename".into(),
                "Produktidentifikation".into(),
                "Listenpreis - EUR".into(),
                "Gesamtartikelanzahl".into(),
            ],
            vec![
                Record::from_pairs([
                    ("Produktname", "Scheinwerfer vorne links"),
                    ("Kategorie", "0"),
                    ("Produktidentifikation", "P1"),
                    ("Listenpreis - EUR", "49.90"),
                    ("Gesamtartikelanzahl", "a:2;b:2"),
                ]),
                Record::from_pairs([
                    ("Produktname", "Gartenschlauch"),
                    ("Kategoriename", "Garten"),
                    ("Produktidentifikation", "P2"),
                    ("Listenpreis - EUR", "9.90"),
                ]),
                Record::from_pairs([("Produktname", "Spiegel"), ("Produktidentifikation", "P3")]),
            ],
        );

        let stats = prepare_dataset(&profile, Some(&classifier), &mut dataset);

        assert_eq!(stats.excluded_by_keyword, Some(1));
        assert_eq!(stats.excluded_incomplete, Some(1));
        assert_eq!(dataset.len(), 1);
        let kept = &dataset.records[0];
        assert_eq!(kept.get("Anzahl"), Some("1"));
        assert_eq!(kept.get("Artikel"), Some("4"));
        assert_eq!(kept.get("Kategorie"), Some("21842"));
    }

    #[test]
    fn test_invalid_pattern_fails_before_reading() {
        let mut profile = temu_profile();
        if let Some(classify) = profile.classify.as_mut() {
            classify.rules.insert(0, CategoryRule::new(1, "kaputt", &["[a-"]));
        }
        let options = RunOptions::new("/nonexistent/export.csv", "/nonexistent/template.xlsx");

        let err = run(&profile, &options).unwrap_err();
        assert!(matches!(err, PipelineError::Profile(ProfileError::InvalidPattern { code: 1, .. })));
    }

    #[test]
    fn test_missing_source_is_a_csv_error() {
        let mut profile = temu_profile();
        profile.columns = vec![ColumnTarget::single("SKU-ID", "B")];
        let options = RunOptions::new("/nonexistent/export.csv", "/nonexistent/template.xlsx");

        let err = run(&profile, &options).unwrap_err();
        assert!(matches!(err, PipelineError::Csv(_)));
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let summary = RunSummary {
            profile: "temu".into(),
            source: "a.csv".into(),
            destination: "b.xlsx".into(),
            encoding: "utf-8".into(),
            delimiter: ';',
            records_loaded: 3,
            quantities_defaulted: 1,
            dimension_fallbacks: 0,
            categories_assigned: Some(2),
            excluded_by_keyword: None,
            excluded_incomplete: Some(1),
            records_written: 2,
            rows_cleared: 10,
            cells_written: 12,
            missing_columns: vec!["Marke".into()],
            dry_run: true,
            saved: false,
            warnings: vec![],
            finished_at: Utc::now(),
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_report(&summary, &path).unwrap();

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["recordsWritten"], 2);
        assert_eq!(json["excludedByKeyword"], serde_json::Value::Null);
        assert_eq!(json["missingColumns"][0], "Marke");
        assert_eq!(json["dryRun"], true);
    }
}
