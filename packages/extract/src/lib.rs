#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Regex-based field extraction from loosely structured case text.
//!
//! A [`RuleSet`] maps field names to ordered regex rules. [`extract`] runs
//! every field's rules against a block of text and returns one entry per
//! field: the first non-empty capture, or `None`. Extraction never fails;
//! an unmatched pattern or an out-of-range capture group simply leaves the
//! field empty.

pub mod amount;
pub mod rules;

use std::collections::BTreeMap;

pub use amount::parse_amount;
pub use rules::{DEFAULT_RULES_JSON, ExtractionRule, RuleDiagnostic, RuleSet};

/// Errors that can occur while loading rules.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// The rule document is not valid JSON or does not match the schema.
    #[error("Invalid rule JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A pattern failed to compile.
    #[error("Invalid regex pattern: {0}")]
    Regex(#[from] regex::Error),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extracted values keyed by field name.
pub type ExtractedFields = BTreeMap<String, Option<String>>;

/// Applies every rule in `rules` to `text`.
///
/// Each field resolves to the first non-`None` result among its rules, in
/// declared order. Fields are independent of each other.
#[must_use]
pub fn extract(text: &str, rules: &RuleSet) -> ExtractedFields {
    rules
        .fields()
        .map(|(field, field_rules)| {
            let value = field_rules.iter().find_map(|rule| rule.apply(text));
            (field.to_owned(), value)
        })
        .collect()
}

/// Reads and compiles a rule document from disk.
///
/// # Errors
///
/// Returns [`RuleError::Io`] if the file cannot be read or
/// [`RuleError::Json`] if it is malformed.
pub fn load_rules(path: &std::path::Path) -> Result<(RuleSet, Vec<RuleDiagnostic>), RuleError> {
    let json = std::fs::read_to_string(path)?;
    log::info!("Loading extraction rules from {}", path.display());
    RuleSet::from_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_rules() -> RuleSet {
        let json = r#"{
            "case_number": "Case No:\\s*([\\w-]+)",
            "amount": "Amount Due:\\s*\\$([\\d,]+\\.\\d{2})",
            "name": "Name:\\s*(.+)"
        }"#;
        RuleSet::from_json(json).unwrap().0
    }

    #[test]
    fn extracts_scenario_record() {
        let text = "Case No: 12-CV-004, Amount Due: $12,345.67, Name: Jane Doe";
        let fields = extract(text, &scenario_rules());

        assert_eq!(fields["case_number"].as_deref(), Some("12-CV-004"));
        assert_eq!(fields["name"].as_deref(), Some("Jane Doe"));
        assert_eq!(fields["amount"].as_deref(), Some("12,345.67"));
        let amount = parse_amount(fields["amount"].as_deref().unwrap()).unwrap();
        assert!((amount - 12_345.67).abs() < 1e-9);
    }

    #[test]
    fn unmatched_fields_are_none_and_independent() {
        let fields = extract("Name: Only A Name", &scenario_rules());
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["case_number"], None);
        assert_eq!(fields["amount"], None);
        assert_eq!(fields["name"].as_deref(), Some("Only A Name"));
    }

    #[test]
    fn out_of_range_group_is_none() {
        let mut rules = RuleSet::new();
        rules.push(ExtractionRule::new("case_number", r"Case:\s*(\S+)", 5).unwrap());
        let fields = extract("Case: A1", &rules);
        assert_eq!(fields["case_number"], None);
    }

    #[test]
    fn group_zero_is_whole_match() {
        let mut rules = RuleSet::new();
        rules.push(ExtractionRule::new("case_number", r"A\d+", 0).unwrap());
        let fields = extract("ref A17 filed", &rules);
        assert_eq!(fields["case_number"].as_deref(), Some("A17"));
    }

    #[test]
    fn fallbacks_apply_in_declared_order() {
        let json = r#"{"case_number": ["Docket:\\s*(\\S+)", "Case:\\s*(\\S+)", "(\\d+)"]}"#;
        let (rules, _) = RuleSet::from_json(json).unwrap();

        let fields = extract("Case: B2 Docket: D9", &rules);
        assert_eq!(fields["case_number"].as_deref(), Some("D9"));

        let fields = extract("Case: B2 and 44", &rules);
        assert_eq!(fields["case_number"].as_deref(), Some("B2"));

        let fields = extract("just 44", &rules);
        assert_eq!(fields["case_number"].as_deref(), Some("44"));
    }

    #[test]
    fn empty_capture_falls_through() {
        let json = r#"{"name": ["Name:([ ]*)", "Owner:\\s*(\\w+)"]}"#;
        let (rules, _) = RuleSet::from_json(json).unwrap();
        let fields = extract("Name:   \nOwner: Smith", &rules);
        assert_eq!(fields["name"].as_deref(), Some("Smith"));
    }

    #[test]
    fn never_panics_on_arbitrary_text() {
        let rules = RuleSet::default_rules();
        for text in ["", "\0\0", "$$$", "Case No:", "🙂 Case #: ÅÄÖ-1234 $1,2"] {
            let fields = extract(text, &rules);
            assert_eq!(fields.len(), rules.field_count());
        }
    }

    #[test]
    fn default_rules_handle_typical_notice() {
        let text = "SURPLUS FUNDS NOTICE\nCase No: 2023-CA-001234\nClaimant: John Q. Public\nExcess amount: $45,210.00\nProperty: 123 Main St, Springfield, IL 62704\n";
        let fields = extract(text, &RuleSet::default_rules());
        assert_eq!(fields["case_number"].as_deref(), Some("2023-CA-001234"));
        assert_eq!(fields["name"].as_deref(), Some("John Q. Public"));
        assert_eq!(fields["amount"].as_deref(), Some("45,210.00"));
        assert_eq!(
            fields["address"].as_deref(),
            Some("123 Main St, Springfield, IL 62704")
        );
    }
}
