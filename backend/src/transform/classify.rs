//! Keyword category assignment.
//!
//! Rules are tried in profile order and the first match wins, so broad
//! patterns belong after narrow ones.

use regex::{Regex, RegexBuilder};

use crate::error::{ProfileError, ProfileResult};
use crate::logs::{log_info, log_success, log_warning};
use crate::models::{Dataset, Record};
use crate::profile::ClassifySettings;

/// A rule with its patterns compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub code: u32,
    pub label: String,
    patterns: Vec<Regex>,
}

impl CompiledRule {
    pub fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }
}

/// Assigns a category code from product text.
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    target_field: String,
    text_fields: Vec<String>,
    rules: Vec<CompiledRule>,
}

impl CategoryClassifier {
    /// Compile every rule. An invalid pattern names its rule in the error.
    pub fn new(settings: &ClassifySettings) -> ProfileResult<Self> {
        let rules = settings
            .rules
            .iter()
            .map(|rule| {
                let patterns = rule
                    .patterns
                    .iter()
                    .map(|pattern| compile_pattern(rule.code, pattern))
                    .collect::<ProfileResult<Vec<_>>>()?;
                Ok(CompiledRule {
                    code: rule.code,
                    label: rule.label.clone(),
                    patterns,
                })
            })
            .collect::<ProfileResult<Vec<_>>>()?;

        Ok(Self {
            target_field: settings.target_field.clone(),
            text_fields: settings.text_fields.clone(),
            rules,
        })
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// First rule matching `text`.
    pub fn classify(&self, text: &str) -> Option<&CompiledRule> {
        self.rules.iter().find(|rule| rule.is_match(text))
    }

    /// Text a record is classified on: present text fields joined by spaces.
    pub fn record_text(&self, record: &Record) -> String {
        self.text_fields
            .iter()
            .filter_map(|field| record.get(field))
            .fold(String::new(), |mut text, value| {
                text.push(' ');
                text.push_str(value);
                text
            })
    }

    /// Write the category code of every matching record.
    ///
    /// Records without a match keep their current value. Returns the number
    /// of records assigned, or `None` when the target column is missing.
    pub fn apply(&self, dataset: &mut Dataset) -> Option<usize> {
        if !dataset.has_column(&self.target_field) {
            log_warning(format!(
                "Column '{}' not found, categories not assigned",
                self.target_field
            ));
            return None;
        }
        log_info("Assigning categories by keywords...");

        let mut assigned = 0;
        for record in &mut dataset.records {
            let text = self.record_text(record);
            if let Some(rule) = self.classify(&text) {
                record.set(self.target_field.as_str(), rule.code.to_string());
                assigned += 1;
            }
        }

        log_success(format!("Categories assigned for {} records", assigned));
        Some(assigned)
    }
}

fn compile_pattern(code: u32, pattern: &str) -> ProfileResult<Regex> {
    RegexBuilder::new(&format!(r"\b(?:{})\b", pattern))
        .case_insensitive(true)
        .build()
        .map_err(|e| ProfileError::InvalidPattern {
            code,
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{temu_profile, CategoryRule};

    fn settings(rules: Vec<CategoryRule>) -> ClassifySettings {
        ClassifySettings {
            target_field: "Kategorie".into(),
            text_fields: vec![
                "Produktbeschreibung".into(),
                "Produktname".into(),
                "Kategoriename".into(),
            ],
            rules,
        }
    }

    #[test]
    fn test_first_rule_wins() {
        let classifier = CategoryClassifier::new(&settings(vec![
            CategoryRule::new(1, "a", &["x"]),
            CategoryRule::new(2, "b", &["x"]),
        ]))
        .unwrap();
        assert_eq!(classifier.classify("ein x hier").map(|r| r.code), Some(1));
    }

    #[test]
    fn test_word_boundaries_and_case() {
        let classifier = CategoryClassifier::new(&settings(vec![CategoryRule::new(
            21842,
            "Kotflügel",
            &["kotfl(ü|u)gel"],
        )]))
        .unwrap();

        assert!(classifier.classify("Kotflügel vorne links").is_some());
        assert!(classifier.classify("KOTFLUGEL").is_some());
        assert!(classifier.classify("Kotflügelverbreiterung").is_none());
    }

    #[test]
    fn test_alternation_is_bounded_as_a_whole() {
        let classifier = CategoryClassifier::new(&settings(vec![CategoryRule::new(
            7,
            "Licht",
            &["led|lampe"],
        )]))
        .unwrap();
        // "\bled|lampe\b" would match "ledig"
        assert!(classifier.classify("ledig").is_none());
        assert!(classifier.classify("LED Rückleuchte").is_some());
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let err = CategoryClassifier::new(&settings(vec![CategoryRule::new(9, "kaputt", &["(offen"])]))
            .unwrap_err();
        match err {
            ProfileError::InvalidPattern { code, pattern, .. } => {
                assert_eq!(code, 9);
                assert_eq!(pattern, "(offen");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_apply_assigns_and_keeps_unmatched() {
        let classifier = CategoryClassifier::new(&settings(vec![CategoryRule::new(
            22226,
            "Spiegel",
            &["spiegel"],
        )]))
        .unwrap();
        let mut dataset = Dataset::new(
            vec!["Kategorie".into(), "Produktname".into()],
            vec![
                Record::from_pairs([("Produktname", "Spiegel links"), ("Kategorie", "1")]),
                Record::from_pairs([("Produktname", "Radkappe"), ("Kategorie", "1")]),
                Record::from_pairs([("Kategoriename", "Spiegel")]),
            ],
        );

        assert_eq!(classifier.apply(&mut dataset), Some(2));
        assert_eq!(dataset.records[0].get("Kategorie"), Some("22226"));
        assert_eq!(dataset.records[1].get("Kategorie"), Some("1"));
        assert_eq!(dataset.records[2].get("Kategorie"), Some("22226"));
    }

    #[test]
    fn test_apply_skips_without_target_column() {
        let classifier = CategoryClassifier::new(&settings(vec![CategoryRule::new(1, "a", &["x"])])).unwrap();
        let mut dataset = Dataset::new(
            vec!["Produktname".into()],
            vec![Record::from_pairs([("Produktname", "x")])],
        );

        assert_eq!(classifier.apply(&mut dataset), None);
        assert_eq!(dataset.records[0].get("Kategorie"), None);
    }

    #[test]
    fn test_record_text_joins_present_fields() {
        let classifier = CategoryClassifier::new(&settings(Vec::new())).unwrap();
        let record = Record::from_pairs([("Produktname", "Haube"), ("Kategoriename", "Karosserie")]);
        assert_eq!(classifier.record_text(&record), " Haube Karosserie");
    }

    #[test]
    fn test_builtin_rules_compile() {
        let profile = temu_profile();
        let classify = profile.classify.as_ref().unwrap();
        let classifier = CategoryClassifier::new(classify).unwrap();
        assert_eq!(classifier.rules().len(), classify.rules.len());
    }
}
