//! Merge profile definition.
//!
//! A profile is the static configuration of one export → template merge:
//! where the data lands in the sheet, how columns fan out, which rules
//! classify products and which rows are dropped. Profiles are plain JSON so
//! a new marketplace layout does not need a rebuild.
//!
//! ```json
//! {
//!   "name": "temu",
//!   "destination": { "sheet_name": "Template", "start_row": 5 },
//!   "columns": [
//!     { "source": "SKU-ID", "target": "B" },
//!     { "source": "Aufzählungspunkt", "target": ["U", "V", "W"], "split": "bullets", "max_len": 700 }
//!   ]
//! }
//! ```

mod builtin;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ProfileError, ProfileResult};
use crate::workbook::cell::{column_index, column_range};

pub use builtin::temu_profile;

/// A complete merge profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Human-readable name
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub source: SourceSettings,

    pub destination: DestinationSettings,

    #[serde(default)]
    pub normalize: NormalizeSettings,

    /// Quantity aggregation (`sku:qty;sku:qty` → total)
    #[serde(default)]
    pub aggregate: Option<AggregateSettings>,

    /// Keyword category assignment
    #[serde(default)]
    pub classify: Option<ClassifySettings>,

    #[serde(default)]
    pub filter: FilterSettings,

    #[serde(default)]
    pub sanitize: SanitizeSettings,

    /// Source column → destination cells, in write order
    pub columns: Vec<ColumnTarget>,
}

/// How the source export is read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// `utf-8`, `iso-8859-1`, `windows-1252` or `auto`
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

fn default_delimiter() -> char {
    ';'
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            encoding: default_encoding(),
        }
    }
}

/// Where data lands in the template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationSettings {
    pub sheet_name: String,

    /// First data row; rows above it are template headers
    pub start_row: u32,
}

/// Per-column default filling and unit translation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeSettings {
    /// Column whose empty values become `quantity_default`
    #[serde(default)]
    pub quantity_field: Option<String>,

    #[serde(default = "default_quantity")]
    pub quantity_default: String,

    /// Column whose empty values become `availability_marker`
    #[serde(default)]
    pub availability_field: Option<String>,

    #[serde(default = "default_availability_marker")]
    pub availability_marker: String,

    /// Column translated through `country_map`
    #[serde(default)]
    pub country_field: Option<String>,

    #[serde(default)]
    pub country_map: BTreeMap<String, String>,

    /// Millimetre columns converted to whole centimetres
    #[serde(default)]
    pub dimension_fields: Vec<String>,

    #[serde(default)]
    pub dimension: DimensionPolicy,
}

impl Default for NormalizeSettings {
    fn default() -> Self {
        Self {
            quantity_field: None,
            quantity_default: default_quantity(),
            availability_field: None,
            availability_marker: default_availability_marker(),
            country_field: None,
            country_map: BTreeMap::new(),
            dimension_fields: Vec::new(),
            dimension: DimensionPolicy::default(),
        }
    }
}

fn default_quantity() -> String {
    "1".to_string()
}

fn default_availability_marker() -> String {
    "N/A".to_string()
}

/// mm → cm conversion policy
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DimensionPolicy {
    /// Divisor applied to the parsed value
    #[serde(default = "default_divisor")]
    pub divisor: f64,

    /// Converted value used when the source does not parse
    #[serde(default = "default_one")]
    pub fallback: f64,

    /// Lower clamp applied before rounding
    #[serde(default = "default_one")]
    pub minimum: f64,
}

fn default_divisor() -> f64 {
    10.0
}

fn default_one() -> f64 {
    1.0
}

impl Default for DimensionPolicy {
    fn default() -> Self {
        Self {
            divisor: default_divisor(),
            fallback: default_one(),
            minimum: default_one(),
        }
    }
}

/// Quantity aggregation source and derived column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateSettings {
    pub source: String,
    pub target: String,
}

/// Category assignment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifySettings {
    /// Column receiving the category code
    pub target_field: String,

    /// Columns joined (space-separated) into the text that rules match on
    pub text_fields: Vec<String>,

    /// Ordered rules; the first matching rule wins
    pub rules: Vec<CategoryRule>,
}

/// One category rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Marketplace category id
    pub code: u32,

    #[serde(default)]
    pub label: String,

    /// Regex patterns, matched case-insensitively on word boundaries
    pub patterns: Vec<String>,
}

impl CategoryRule {
    pub fn new(code: u32, label: &str, patterns: &[&str]) -> Self {
        Self {
            code,
            label: label.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Row exclusion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Columns searched for excluded keywords
    #[serde(default)]
    pub keyword_fields: Vec<String>,

    /// Lower-case substrings that exclude a record
    #[serde(default)]
    pub excluded_keywords: Vec<String>,

    /// Columns that must hold a real value
    #[serde(default)]
    pub required_fields: Vec<String>,

    /// Lower-case values treated as "intentionally missing"
    #[serde(default = "default_placeholders")]
    pub placeholder_values: Vec<String>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            keyword_fields: Vec::new(),
            excluded_keywords: Vec::new(),
            required_fields: Vec::new(),
            placeholder_values: default_placeholders(),
        }
    }
}

pub(crate) fn default_placeholders() -> Vec<String> {
    ["", "999.99", "n/a", "na", "-", "null", "none"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Rich-text cleaning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizeSettings {
    /// Markdown marker characters removed wherever they occur
    #[serde(default = "default_markers")]
    pub markdown_markers: String,
}

fn default_markers() -> String {
    "*_`#>".to_string()
}

impl Default for SanitizeSettings {
    fn default() -> Self {
        Self {
            markdown_markers: default_markers(),
        }
    }
}

/// Destination of one source column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnTarget {
    /// Source column name
    pub source: String,

    /// Destination column(s)
    pub target: Target,

    /// How a value fans out over a sequence target
    #[serde(default)]
    pub split: Split,

    /// Character cap applied per written cell
    #[serde(default)]
    pub max_len: Option<usize>,
}

impl ColumnTarget {
    pub fn single(source: &str, column: &str) -> Self {
        Self {
            source: source.to_string(),
            target: Target::Single(column.to_string()),
            split: Split::None,
            max_len: None,
        }
    }

    pub fn sequence(source: &str, columns: Vec<String>, split: Split) -> Self {
        Self {
            source: source.to_string(),
            target: Target::Sequence(columns),
            split,
            max_len: None,
        }
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }
}

/// One destination column or an ordered list of them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    Single(String),
    Sequence(Vec<String>),
}

impl Target {
    /// Column letters referenced by this target.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Target::Single(c) => vec![c.as_str()],
            Target::Sequence(cs) => cs.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Target::Sequence(_))
    }
}

/// Fan-out decomposition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    /// Whole value
    #[default]
    None,
    /// `<li>` / `<br>` fragments
    Bullets,
    /// `url;index,url;index,` lists
    Images,
}

impl Profile {
    /// Parse a profile from JSON string
    pub fn from_json(json: &str) -> ProfileResult<Self> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load and validate a profile file
    pub fn load(path: impl AsRef<Path>) -> ProfileResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> ProfileResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check settings that serde cannot.
    ///
    /// Regex patterns are compiled (and reported) by the classifier.
    pub fn validate(&self) -> ProfileResult<()> {
        if self.destination.start_row == 0 {
            return Err(invalid("destination.start_row", "rows are numbered from 1"));
        }
        if self.destination.sheet_name.trim().is_empty() {
            return Err(invalid("destination.sheet_name", "must not be empty"));
        }
        if !self.source.delimiter.is_ascii() {
            return Err(invalid("source.delimiter", "must be a single ASCII character"));
        }
        let policy = &self.normalize.dimension;
        if !(policy.divisor.is_finite() && policy.divisor > 0.0) {
            return Err(invalid("normalize.dimension.divisor", "must be a positive number"));
        }

        for column in &self.columns {
            if let Target::Sequence(cols) = &column.target {
                if cols.is_empty() {
                    return Err(invalid(
                        &format!("columns[{}].target", column.source),
                        "sequence needs at least one column",
                    ));
                }
            }
            for letters in column.target.columns() {
                if column_index(letters).is_none() {
                    return Err(ProfileError::InvalidColumn(letters.to_string()));
                }
            }
        }
        Ok(())
    }
}

/// Inclusive column range as a sequence target.
pub fn columns_between(start: &str, end: &str) -> ProfileResult<Vec<String>> {
    column_range(start, end).ok_or_else(|| ProfileError::InvalidColumn(format!("{}:{}", start, end)))
}

fn invalid(field: &str, message: &str) -> ProfileError {
    ProfileError::InvalidSetting {
        field: field.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_profile_json() {
        let json = r#"{
            "name": "mini",
            "destination": { "sheet_name": "Template", "start_row": 5 },
            "columns": [
                { "source": "SKU-ID", "target": "B" },
                { "source": "Aufzählungspunkt", "target": ["U", "V"], "split": "bullets", "max_len": 700 }
            ]
        }"#;

        let profile = Profile::from_json(json).unwrap();
        assert_eq!(profile.source.delimiter, ';');
        assert_eq!(profile.columns[0].target, Target::Single("B".into()));
        assert_eq!(profile.columns[1].split, Split::Bullets);
        assert_eq!(profile.columns[1].max_len, Some(700));
        assert_eq!(profile.filter.placeholder_values.len(), 7);
        assert_eq!(profile.sanitize.markdown_markers, "*_`#>");
        assert!(profile.classify.is_none());
    }

    #[test]
    fn test_invalid_column_rejected() {
        let json = r#"{
            "name": "bad",
            "destination": { "sheet_name": "Template", "start_row": 5 },
            "columns": [{ "source": "SKU-ID", "target": "B7" }]
        }"#;

        let err = Profile::from_json(json).unwrap_err();
        assert!(matches!(err, ProfileError::InvalidColumn(ref c) if c == "B7"));
    }

    #[test]
    fn test_zero_start_row_rejected() {
        let json = r#"{
            "name": "bad",
            "destination": { "sheet_name": "Template", "start_row": 0 },
            "columns": []
        }"#;

        assert!(matches!(
            Profile::from_json(json),
            Err(ProfileError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_builtin_profile_survives_json() {
        let profile = temu_profile();
        let json = profile.to_json().unwrap();
        let reloaded = Profile::from_json(&json).unwrap();

        assert_eq!(reloaded.columns.len(), profile.columns.len());
        assert_eq!(reloaded.destination.start_row, 5);
        let rules = &reloaded.classify.as_ref().unwrap().rules;
        assert_eq!(rules.first().map(|r| r.code), Some(21842));
    }

    #[test]
    fn test_columns_between() {
        assert_eq!(columns_between("U", "Z").unwrap().len(), 6);
        assert!(columns_between("Z", "A").is_err());
    }
}
