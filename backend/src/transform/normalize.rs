//! Per-column default filling and unit translation.
//!
//! Each step works column by column and never fails a record: values that
//! do not parse get the documented fallback instead.

use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::models::Dataset;
use crate::profile::{DimensionPolicy, NormalizeSettings};

/// Counts reported by [`Normalizer::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    /// Records whose quantity was defaulted
    pub quantity_defaulted: usize,
    /// Quantity column was missing and got added
    pub quantity_column_added: bool,
    /// Records whose availability marker was filled in
    pub availability_filled: usize,
    /// Records whose country value changed
    pub countries_translated: usize,
    /// Dimension values that did not parse and got the fallback
    pub dimension_fallbacks: usize,
}

/// Convert a millimetre value to whole centimetres.
///
/// Unparseable input uses `policy.fallback` (already in centimetres). The
/// result is clamped to `policy.minimum` and rounded half-to-even.
pub fn mm_to_cm(value: Option<&str>, policy: &DimensionPolicy) -> (i64, bool) {
    let parsed = value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite());
    let (cm, fell_back) = match parsed {
        Some(mm) => (mm / policy.divisor, false),
        None => (policy.fallback, true),
    };
    (cm.max(policy.minimum).round_ties_even() as i64, fell_back)
}

/// Applies [`NormalizeSettings`] to a dataset.
pub struct Normalizer<'a> {
    settings: &'a NormalizeSettings,
}

impl<'a> Normalizer<'a> {
    pub fn new(settings: &'a NormalizeSettings) -> Self {
        Self { settings }
    }

    pub fn apply(&self, dataset: &mut Dataset) -> NormalizeStats {
        let mut stats = NormalizeStats::default();
        self.fill_quantity(dataset, &mut stats);
        self.fill_availability(dataset, &mut stats);
        self.translate_country(dataset, &mut stats);
        self.convert_dimensions(dataset, &mut stats);
        stats
    }

    fn fill_quantity(&self, dataset: &mut Dataset, stats: &mut NormalizeStats) {
        let Some(field) = self.settings.quantity_field.as_deref() else {
            return;
        };
        let default = self.settings.quantity_default.as_str();

        if !dataset.has_column(field) {
            dataset.add_column(field);
            stats.quantity_column_added = true;
            log_info(format!(
                "Column '{}' missing, added with default value {}",
                field, default
            ));
        }

        for record in &mut dataset.records {
            if record.get(field).map_or(true, str::is_empty) {
                record.set(field, default);
                stats.quantity_defaulted += 1;
            }
        }
        log_success(format!(
            "Empty values in '{}' set to {} ({} records)",
            field, default, stats.quantity_defaulted
        ));
    }

    fn fill_availability(&self, dataset: &mut Dataset, stats: &mut NormalizeStats) {
        let Some(field) = self.settings.availability_field.as_deref() else {
            return;
        };
        if !dataset.has_column(field) {
            log_warning(format!("Column '{}' not found in CSV", field));
            return;
        }

        let marker = self.settings.availability_marker.as_str();
        for record in &mut dataset.records {
            if record.get(field).map_or(true, str::is_empty) {
                record.set(field, marker);
                stats.availability_filled += 1;
            }
        }
        log_success(format!(
            "Empty values in '{}' set to '{}' ({} records)",
            field, marker, stats.availability_filled
        ));
    }

    fn translate_country(&self, dataset: &mut Dataset, stats: &mut NormalizeStats) {
        let Some(field) = self.settings.country_field.as_deref() else {
            return;
        };
        if !dataset.has_column(field) {
            log_warning(format!("Column '{}' not found in CSV", field));
            return;
        }

        let map = &self.settings.country_map;
        for record in &mut dataset.records {
            let Some(current) = record.get(field) else {
                continue;
            };
            let trimmed = current.trim();
            let translated = map.get(trimmed).map(String::as_str).unwrap_or(trimmed);
            if translated != current {
                let translated = translated.to_string();
                record.set(field, translated);
                stats.countries_translated += 1;
            }
        }
        log_success(format!(
            "Column '{}' translated ({} records changed)",
            field, stats.countries_translated
        ));
    }

    fn convert_dimensions(&self, dataset: &mut Dataset, stats: &mut NormalizeStats) {
        if self.settings.dimension_fields.is_empty() {
            return;
        }
        let policy = &self.settings.dimension;
        log_info(format!(
            "Converting mm to cm (minimum {} cm)...",
            policy.minimum
        ));

        for field in &self.settings.dimension_fields {
            if !dataset.has_column(field) {
                log_warning(format!("Column '{}' not found in CSV", field));
                continue;
            }

            let mut fallbacks = 0;
            for record in &mut dataset.records {
                let (cm, fell_back) = mm_to_cm(record.get(field), policy);
                if fell_back {
                    fallbacks += 1;
                }
                record.set(field.as_str(), cm.to_string());
            }
            stats.dimension_fallbacks += fallbacks;

            if fallbacks > 0 {
                log_info_indent(
                    format!("'{}': converted, {} unparseable values set to {}", field, fallbacks, policy.fallback),
                    1,
                );
            } else {
                log_info_indent(format!("'{}': converted", field), 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use std::collections::BTreeMap;

    fn settings() -> NormalizeSettings {
        let mut country_map = BTreeMap::new();
        country_map.insert("Taiwan".to_string(), "TW".to_string());
        country_map.insert("Deutschland".to_string(), "Germany".to_string());

        NormalizeSettings {
            quantity_field: Some("Anzahl".into()),
            availability_field: Some("Nicht verfügbar für Listenpreis".into()),
            country_field: Some("Ursprungsland/-region".into()),
            country_map,
            dimension_fields: vec!["Länge - mm".into(), "Höhe - mm".into()],
            ..NormalizeSettings::default()
        }
    }

    #[test]
    fn test_mm_to_cm_policy() {
        let policy = DimensionPolicy::default();
        assert_eq!(mm_to_cm(Some("123"), &policy), (12, false));
        assert_eq!(mm_to_cm(Some(" 129.0 "), &policy), (13, false));
        // clamped before rounding
        assert_eq!(mm_to_cm(Some("4"), &policy), (1, false));
        assert_eq!(mm_to_cm(Some("-30"), &policy), (1, false));
        // ties go to even
        assert_eq!(mm_to_cm(Some("25"), &policy), (2, false));
        assert_eq!(mm_to_cm(Some("35"), &policy), (4, false));
        // fallback
        assert_eq!(mm_to_cm(Some("12,5"), &policy), (1, true));
        assert_eq!(mm_to_cm(Some("inf"), &policy), (1, true));
        assert_eq!(mm_to_cm(None, &policy), (1, true));
    }

    #[test]
    fn test_defaults_and_translation() {
        let settings = settings();
        let mut dataset = Dataset::new(
            vec![
                "Anzahl".into(),
                "Nicht verfügbar für Listenpreis".into(),
                "Ursprungsland/-region".into(),
            ],
            vec![
                Record::from_pairs([("Anzahl", "3"), ("Ursprungsland/-region", " Taiwan ")]),
                Record::from_pairs([("Ursprungsland/-region", "China"), ("Nicht verfügbar für Listenpreis", "ja")]),
                Record::new(),
            ],
        );

        let stats = Normalizer::new(&settings).apply(&mut dataset);

        assert_eq!(dataset.records[0].get("Anzahl"), Some("3"));
        assert_eq!(dataset.records[1].get("Anzahl"), Some("1"));
        assert_eq!(dataset.records[0].get("Nicht verfügbar für Listenpreis"), Some("N/A"));
        assert_eq!(dataset.records[1].get("Nicht verfügbar für Listenpreis"), Some("ja"));
        assert_eq!(dataset.records[0].get("Ursprungsland/-region"), Some("TW"));
        assert_eq!(dataset.records[1].get("Ursprungsland/-region"), Some("China"));
        // absent country stays absent
        assert_eq!(dataset.records[2].get("Ursprungsland/-region"), None);

        assert_eq!(stats.quantity_defaulted, 2);
        assert!(!stats.quantity_column_added);
        assert_eq!(stats.availability_filled, 2);
        assert_eq!(stats.countries_translated, 1);
    }

    #[test]
    fn test_missing_quantity_column_added() {
        let settings = settings();
        let mut dataset = Dataset::new(vec!["SKU-ID".into()], vec![Record::new(), Record::new()]);

        let stats = Normalizer::new(&settings).apply(&mut dataset);

        assert!(stats.quantity_column_added);
        assert!(dataset.has_column("Anzahl"));
        assert!(dataset.records.iter().all(|r| r.get("Anzahl") == Some("1")));
        // optional columns are not invented
        assert!(!dataset.has_column("Nicht verfügbar für Listenpreis"));
    }

    #[test]
    fn test_dimensions_convert_per_row() {
        let settings = settings();
        let mut dataset = Dataset::new(
            vec!["Länge - mm".into()],
            vec![
                Record::from_pairs([("Länge - mm", "450")]),
                Record::from_pairs([("Länge - mm", "abc")]),
                Record::new(),
            ],
        );

        let stats = Normalizer::new(&settings).apply(&mut dataset);

        let values: Vec<_> = dataset.records.iter().map(|r| r.get("Länge - mm")).collect();
        assert_eq!(values, vec![Some("45"), Some("1"), Some("1")]);
        assert_eq!(stats.dimension_fallbacks, 2);
        // "Höhe - mm" is not in the export and stays out
        assert!(!dataset.has_column("Höhe - mm"));
    }
}
