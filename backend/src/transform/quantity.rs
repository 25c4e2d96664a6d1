//! Quantity aggregation for bundle listings.
//!
//! A bundle lists its components as `sku:qty;sku:qty`. The marketplace wants
//! the total number of items, and never less than one.

use crate::logs::{log_info, log_success, log_warning};
use crate::models::Dataset;
use crate::profile::AggregateSettings;

/// Lowest item count a record may claim.
pub const MIN_QUANTITY: u64 = 1;

/// Sum the quantities of a `sku:qty;sku:qty` string.
///
/// Segments without `:` are ignored, as are quantities that are not plain
/// non-negative integers. Empty input, a zero total and overflow all give 1.
///
/// ```
/// use sheetfill::transform::quantity::aggregate;
///
/// assert_eq!(aggregate("A:2;B:1;C:0"), 3);
/// assert_eq!(aggregate("garbage"), 1);
/// ```
pub fn aggregate(value: &str) -> u64 {
    try_aggregate(value)
        .filter(|total| *total >= MIN_QUANTITY)
        .unwrap_or(MIN_QUANTITY)
}

fn try_aggregate(value: &str) -> Option<u64> {
    let mut total: u64 = 0;
    for segment in value.split(';') {
        let Some((_, qty)) = segment.split_once(':') else {
            continue;
        };
        let qty = qty.trim();
        if qty.is_empty() || !qty.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        total = total.checked_add(qty.parse::<u64>().ok()?)?;
    }
    Some(total)
}

/// Computes the derived quantity column of every record.
pub struct QuantityAggregator<'a> {
    settings: &'a AggregateSettings,
}

impl<'a> QuantityAggregator<'a> {
    pub fn new(settings: &'a AggregateSettings) -> Self {
        Self { settings }
    }

    /// Fill `target` from `source` for every record.
    ///
    /// Returns the number of records updated, or `None` when the source column
    /// is missing and the stage was skipped.
    pub fn apply(&self, dataset: &mut Dataset) -> Option<usize> {
        let AggregateSettings { source, target } = self.settings;
        log_info(format!("Computing '{}' from '{}'...", target, source));

        if !dataset.has_column(source) {
            log_warning(format!("Column '{}' not found, '{}' not computed", source, target));
            return None;
        }

        dataset.add_column(target);
        for record in &mut dataset.records {
            let total = record.get(source).map(aggregate).unwrap_or(MIN_QUANTITY);
            record.set(target.as_str(), total.to_string());
        }

        log_success(format!("Column '{}' computed for {} records", target, dataset.len()));
        Some(dataset.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;

    #[test]
    fn test_aggregate_examples() {
        assert_eq!(aggregate("A:2;B:1;C:0"), 3);
        assert_eq!(aggregate(""), 1);
        assert_eq!(aggregate("garbage"), 1);
        assert_eq!(aggregate("A:0;B:0"), 1);
    }

    #[test]
    fn test_aggregate_skips_bad_segments() {
        assert_eq!(aggregate("A:2;B;C: 3 ;D:x;E:-4;F:1.5"), 5);
        assert_eq!(aggregate("A:B:7"), 1);
        assert_eq!(aggregate("   "), 1);
    }

    #[test]
    fn test_aggregate_overflow_falls_back() {
        let huge = format!("A:{};B:{}", u64::MAX, 1);
        assert_eq!(aggregate(&huge), 1);
        assert_eq!(aggregate("A:99999999999999999999999"), 1);
    }

    #[test]
    fn test_aggregator_adds_column() {
        let settings = AggregateSettings {
            source: "Gesamtartikelanzahl".into(),
            target: "Artikel".into(),
        };
        let mut dataset = Dataset::new(
            vec!["Gesamtartikelanzahl".into()],
            vec![
                Record::from_pairs([("Gesamtartikelanzahl", "x:2;y:3")]),
                Record::new(),
            ],
        );

        let updated = QuantityAggregator::new(&settings).apply(&mut dataset);
        assert_eq!(updated, Some(2));
        assert!(dataset.has_column("Artikel"));
        assert_eq!(dataset.records[0].get("Artikel"), Some("5"));
        assert_eq!(dataset.records[1].get("Artikel"), Some("1"));
    }

    #[test]
    fn test_aggregator_skips_missing_source() {
        let settings = AggregateSettings {
            source: "Gesamtartikelanzahl".into(),
            target: "Artikel".into(),
        };
        let mut dataset = Dataset::new(vec!["SKU-ID".into()], vec![Record::new()]);

        assert_eq!(QuantityAggregator::new(&settings).apply(&mut dataset), None);
        assert!(!dataset.has_column("Artikel"));
    }
}
