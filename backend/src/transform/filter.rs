//! Row exclusion.
//!
//! Two passes, each reporting how many records it dropped:
//!
//! - keyword: the category fields contain a banned substring
//! - completeness: a required field holds a placeholder instead of data

use crate::logs::{log_info, log_success, log_warning, log_warning_indent};
use crate::models::{Dataset, Record};
use crate::profile::FilterSettings;

/// Counts reported by [`RowFilter::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// `None` when the pass was skipped
    pub keyword_dropped: Option<usize>,
    /// `None` when the pass was skipped
    pub incomplete_dropped: Option<usize>,
}

impl FilterStats {
    pub fn total_dropped(&self) -> usize {
        self.keyword_dropped.unwrap_or(0) + self.incomplete_dropped.unwrap_or(0)
    }
}

/// Applies [`FilterSettings`] to a dataset.
///
/// Keywords and placeholders are compared lower-cased, whatever case the
/// profile spells them in.
pub struct RowFilter<'a> {
    settings: &'a FilterSettings,
    keywords: Vec<String>,
    placeholders: Vec<String>,
}

impl<'a> RowFilter<'a> {
    pub fn new(settings: &'a FilterSettings) -> Self {
        Self {
            settings,
            keywords: lowercased(&settings.excluded_keywords),
            placeholders: settings
                .placeholder_values
                .iter()
                .map(|p| p.trim().to_lowercase())
                .collect(),
        }
    }

    pub fn apply(&self, dataset: &mut Dataset) -> FilterStats {
        FilterStats {
            keyword_dropped: self.drop_excluded_keywords(dataset),
            incomplete_dropped: self.drop_incomplete(dataset),
        }
    }

    /// Whether any keyword field contains a banned substring.
    pub fn is_excluded(&self, record: &Record) -> bool {
        self.settings.keyword_fields.iter().any(|field| {
            record.get(field).map_or(false, |value| {
                let value = value.to_lowercase();
                self.keywords.iter().any(|keyword| value.contains(keyword.as_str()))
            })
        })
    }

    /// Required columns holding a placeholder. Absent counts as `""`.
    pub fn placeholder_fields<'r>(&self, record: &'r Record, present: &[&'a str]) -> Vec<(&'a str, &'r str)> {
        present
            .iter()
            .filter_map(|&field| {
                let value = record.get(field).unwrap_or("");
                self.is_placeholder(value).then_some((field, value))
            })
            .collect()
    }

    fn is_placeholder(&self, value: &str) -> bool {
        let normalized = value.trim().to_lowercase();
        self.placeholders.iter().any(|placeholder| *placeholder == normalized)
    }

    fn drop_excluded_keywords(&self, dataset: &mut Dataset) -> Option<usize> {
        if self.settings.excluded_keywords.is_empty() {
            return None;
        }
        if !self.settings.keyword_fields.iter().any(|f| dataset.has_column(f)) {
            log_warning(format!(
                "None of the columns {:?} found, keyword filter skipped",
                self.settings.keyword_fields
            ));
            return None;
        }

        log_info(format!(
            "Excluding records matching {:?}...",
            self.settings.excluded_keywords
        ));
        let dropped = dataset.retain(|record| !self.is_excluded(record));
        log_success(format!("{} records excluded by keyword", dropped));
        Some(dropped)
    }

    fn drop_incomplete(&self, dataset: &mut Dataset) -> Option<usize> {
        if self.settings.required_fields.is_empty() {
            return None;
        }
        let present: Vec<&'a str> = self
            .settings
            .required_fields
            .iter()
            .map(String::as_str)
            .filter(|f| dataset.has_column(f))
            .collect();
        if present.is_empty() {
            log_warning(format!(
                "None of the required columns {:?} found, completeness filter skipped",
                self.settings.required_fields
            ));
            return None;
        }

        log_info(format!("Dropping records with placeholder values in {:?}...", present));
        let mut position = 0;
        let dropped = dataset.retain(|record| {
            position += 1;
            let hits = self.placeholder_fields(record, &present);
            if hits.is_empty() {
                return true;
            }
            if hits.iter().all(|(_, value)| is_numeric(value)) {
                let fields: Vec<String> = hits.iter().map(|(f, v)| format!("{}={}", f, v.trim())).collect();
                log_warning_indent(
                    format!("Record {} dropped for numeric placeholder ({})", position, fields.join(", ")),
                    1,
                );
            }
            false
        });
        log_success(format!("{} incomplete records removed", dropped));
        Some(dropped)
    }
}

fn lowercased(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}

fn is_numeric(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok()
}
