//! Domain models for the sheetfill pipeline.
//!
//! - [`Record`] - One product row of the source export
//! - [`Dataset`] - Ordered records sharing one header list

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

// =============================================================================
// Record
// =============================================================================

/// One source row: column name → raw text.
///
/// Empty source fields are never stored, so a column either has a value or
/// is absent. Stages mutate records in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    fields: HashMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from `(column, value)` pairs, skipping empty values.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (column, value) in pairs {
            let value = value.into();
            if !value.is_empty() {
                record.fields.insert(column.into(), value);
            }
        }
        record
    }

    /// Value of a column, `None` when absent.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }

    pub fn remove(&mut self, column: &str) -> Option<String> {
        self.fields.remove(column)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// JSON object in header order; absent columns become `null`.
    pub fn to_json(&self, headers: &[String]) -> Value {
        let mut obj = Map::new();
        for header in headers {
            let value = self
                .get(header)
                .map(|v| Value::String(v.to_string()))
                .unwrap_or(Value::Null);
            obj.insert(header.clone(), value);
        }
        Value::Object(obj)
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// Ordered records with a fixed header list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, records: Vec<Record>) -> Self {
        Self { headers, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    /// Register a derived column. Existing names are left alone.
    pub fn add_column(&mut self, column: &str) {
        if !self.has_column(column) {
            self.headers.push(column.to_string());
        }
    }

    /// Keep only records matching `keep`, returning how many were dropped.
    pub fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&Record) -> bool,
    {
        let before = self.records.len();
        self.records.retain(keep);
        before - self.records.len()
    }

    /// All records as JSON objects in header order.
    pub fn to_json(&self) -> Value {
        Value::Array(
            self.records
                .iter()
                .map(|r| r.to_json(&self.headers))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_skips_empty_values() {
        let record = Record::from_pairs([("SKU-ID", "123"), ("Farbe", "")]);
        assert_eq!(record.get("SKU-ID"), Some("123"));
        assert_eq!(record.get("Farbe"), None);
    }

    #[test]
    fn test_retain_reports_dropped() {
        let mut dataset = Dataset::new(
            vec!["a".into()],
            vec![
                Record::from_pairs([("a", "1")]),
                Record::from_pairs([("a", "2")]),
                Record::from_pairs([("a", "3")]),
            ],
        );
        let dropped = dataset.retain(|r| r.get("a") != Some("2"));
        assert_eq!(dropped, 1);
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_to_json_keeps_header_order_and_nulls() {
        let dataset = Dataset::new(
            vec!["b".into(), "a".into()],
            vec![Record::from_pairs([("a", "x")])],
        );
        let json = dataset.to_json();
        assert_eq!(json[0]["a"], "x");
        assert!(json[0]["b"].is_null());
        let keys: Vec<&String> = json[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
