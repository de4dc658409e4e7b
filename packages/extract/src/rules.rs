//! Extraction rule sets.
//!
//! Rules are supplied as JSON keyed by field name. Each field accepts a
//! single rule object, a bare pattern string, or an ordered array of either
//! (fallbacks are tried in declared order):
//!
//! ```json
//! {
//!   "case_number": {"pattern": "Case No:\\s*([\\w-]+)", "group": 1},
//!   "name": "Name:\\s*(.+)",
//!   "amount": ["Amount Due:\\s*\\$([\\d,.]+)", "\\$\\s*([\\d,.]+)"]
//! }
//! ```
//!
//! A field key may appear more than once; later occurrences append further
//! fallbacks in document order.
//!
//! Malformed JSON rejects the whole set. A pattern that fails to compile, or
//! a negative capture group, only drops that one rule and is reported as a
//! [`RuleDiagnostic`]. A group beyond the pattern's captures is kept and
//! simply never yields a value.

use std::collections::BTreeMap;

use case_tracker_case_models::CanonicalField;
use regex::{Regex, RegexBuilder};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::RuleError;

const fn default_group() -> i64 {
    1
}

/// A compiled rule that pulls one field out of free text.
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    /// Field this rule populates.
    pub field_name: String,
    /// Compiled pattern (multi-line mode).
    pub pattern: Regex,
    /// Capture group whose content becomes the field value.
    pub group: usize,
}

impl ExtractionRule {
    /// Compiles a rule.
    ///
    /// Patterns are compiled in multi-line mode so `^` and `$` match at
    /// line boundaries of page text.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Regex`] if the pattern does not compile.
    pub fn new(field_name: &str, pattern: &str, group: usize) -> Result<Self, RuleError> {
        let pattern = RegexBuilder::new(pattern).multi_line(true).build()?;
        Ok(Self {
            field_name: field_name.to_owned(),
            pattern,
            group,
        })
    }

    /// Runs the rule against `text`, returning the trimmed content of the
    /// configured group from the first match anywhere in the text.
    ///
    /// A missing match, an out-of-range group, or a capture that is empty
    /// after trimming all yield `None`.
    #[must_use]
    pub fn apply(&self, text: &str) -> Option<String> {
        let caps = self.pattern.captures(text)?;
        let value = caps.get(self.group)?.as_str().trim();
        if value.is_empty() {
            return None;
        }
        Some(value.to_owned())
    }
}

/// A rule that was rejected at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDiagnostic {
    /// Field the rule belonged to.
    pub field_name: String,
    /// Position of the rule within the field's fallback list.
    pub index: usize,
    /// The offending pattern.
    pub pattern: String,
    /// Why it was rejected.
    pub message: String,
}

impl std::fmt::Display for RuleDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rule {}[{}] `{}` rejected: {}",
            self.field_name, self.index, self.pattern, self.message
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RuleObject {
    pattern: String,
    #[serde(default = "default_group")]
    group: i64,
}

impl RuleObject {
    fn compile(&self, field_name: &str) -> Result<ExtractionRule, String> {
        let group = usize::try_from(self.group)
            .map_err(|_| format!("capture group {} is negative", self.group))?;
        ExtractionRule::new(field_name, &self.pattern, group).map_err(|e| e.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RuleSpec {
    Pattern(String),
    Rule(RuleObject),
}

impl RuleSpec {
    fn into_object(self) -> RuleObject {
        match self {
            Self::Pattern(pattern) => RuleObject {
                pattern,
                group: default_group(),
            },
            Self::Rule(rule) => rule,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldSpec {
    One(RuleSpec),
    Many(Vec<RuleSpec>),
}

impl FieldSpec {
    fn into_objects(self) -> Vec<RuleObject> {
        match self {
            Self::One(spec) => vec![spec.into_object()],
            Self::Many(specs) => specs.into_iter().map(RuleSpec::into_object).collect(),
        }
    }
}

/// A rule document in declaration order, repeated keys included.
struct RuleDocument(Vec<(String, FieldSpec)>);

struct RuleDocumentVisitor;

impl<'de> Visitor<'de> for RuleDocumentVisitor {
    type Value = RuleDocument;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("an object mapping field names to rules")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry::<String, FieldSpec>()? {
            entries.push(entry);
        }
        Ok(RuleDocument(entries))
    }
}

impl<'de> Deserialize<'de> for RuleDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RuleDocumentVisitor)
    }
}

/// A validated set of extraction rules, keyed by field name.
///
/// Within a field, rules are kept in declared order; the first one that
/// yields a value wins.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: BTreeMap<String, Vec<ExtractionRule>>,
}

impl RuleSet {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fallback rule to its field.
    pub fn push(&mut self, rule: ExtractionRule) {
        self.fields
            .entry(rule.field_name.clone())
            .or_default()
            .push(rule);
    }

    /// Iterates fields and their ordered rules.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &[ExtractionRule])> {
        self.fields
            .iter()
            .map(|(name, rules)| (name.as_str(), rules.as_slice()))
    }

    /// Rules for a single field, in fallback order.
    #[must_use]
    pub fn rules_for(&self, field_name: &str) -> &[ExtractionRule] {
        self.fields.get(field_name).map_or(&[], Vec::as_slice)
    }

    /// Number of fields with at least one declared rule entry.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Total number of compiled rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    /// Whether the set contains no rules at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rule_count() == 0
    }

    /// Parses and compiles a JSON rule document.
    ///
    /// Patterns that fail to compile and negative capture groups are
    /// skipped and returned as diagnostics; the field stays present (with
    /// fewer or no rules) so it still resolves to `None` during extraction.
    /// Repeated field keys append their rules after the earlier ones.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Json`] if the document is not valid JSON or
    /// does not match the rule schema.
    pub fn from_json(json: &str) -> Result<(Self, Vec<RuleDiagnostic>), RuleError> {
        let RuleDocument(entries) = serde_json::from_str(json)?;
        let mut set = Self::new();
        let mut diagnostics = Vec::new();
        let mut declared: BTreeMap<String, usize> = BTreeMap::new();

        for (field_name, spec) in entries {
            let next_index = declared.entry(field_name.clone()).or_insert(0);
            if *next_index == 0 {
                if CanonicalField::from_column_name(&field_name).is_none() {
                    log::debug!("Rule field '{field_name}' is not a canonical column and is ignored by the case table");
                }
            } else {
                log::debug!("Rule field '{field_name}' repeated; appending its rules as fallbacks");
            }

            let compiled = set.fields.entry(field_name.clone()).or_default();
            for object in spec.into_objects() {
                let index = *next_index;
                *next_index += 1;
                match object.compile(&field_name) {
                    Ok(rule) => compiled.push(rule),
                    Err(message) => {
                        let diagnostic = RuleDiagnostic {
                            field_name: field_name.clone(),
                            index,
                            pattern: object.pattern,
                            message,
                        };
                        log::warn!("{diagnostic}");
                        diagnostics.push(diagnostic);
                    }
                }
            }
        }

        log::debug!(
            "Loaded {} rule(s) across {} field(s), {} rejected",
            set.rule_count(),
            set.field_count(),
            diagnostics.len()
        );

        Ok((set, diagnostics))
    }

    /// Serializes the rule set back to the JSON schema accepted by
    /// [`Self::from_json`].
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Json`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, RuleError> {
        let objects: BTreeMap<&str, Vec<RuleObject>> = self
            .fields
            .iter()
            .map(|(name, rules)| {
                let objects = rules
                    .iter()
                    .map(|r| RuleObject {
                        pattern: r.pattern.as_str().to_owned(),
                        group: i64::try_from(r.group).unwrap_or(i64::MAX),
                    })
                    .collect();
                (name.as_str(), objects)
            })
            .collect();
        Ok(serde_json::to_string_pretty(&objects)?)
    }

    /// The built-in rules used when no rule document is supplied.
    ///
    /// Each field carries a labelled pattern first and a looser fallback
    /// second.
    #[must_use]
    pub fn default_rules() -> Self {
        let (set, diagnostics) = Self::from_json(DEFAULT_RULES_JSON)
            .unwrap_or_else(|e| panic!("built-in rules are malformed: {e}"));
        debug_assert!(diagnostics.is_empty(), "built-in rules rejected: {diagnostics:?}");
        set
    }
}

/// JSON source of [`RuleSet::default_rules`].
pub const DEFAULT_RULES_JSON: &str = r#"{
  "case_number": [
    "(?i)case(?:\\s*no\\.?|\\s*#|\\s+number)?\\s*[:\\-]?\\s*([A-Z0-9][A-Z0-9\\-]{3,})",
    "(?i)\\b(\\d{2,4}-?[A-Z]{0,2}-?\\d{3,6}-?\\d{0,4})\\b"
  ],
  "name": [
    "(?i)(?:claimant|owner|defendant|plaintiff|name)\\s*[:\\-]\\s*([A-Z][A-Za-z'\\-\\. ]{1,80})",
    "\\b([A-Z][a-z'\\-\\.]+(?:\\s+[A-Z][A-Za-z'\\-\\.]+){1,3})\\b"
  ],
  "amount": [
    "(?i)(?:amount|excess|surplus|balance)[^\\n$0-9]{0,20}\\$?\\s*([0-9]{1,3}(?:,[0-9]{3})*(?:\\.[0-9]{2})?|[0-9]+(?:\\.[0-9]{2})?)",
    "\\$\\s*([0-9]{1,3}(?:,[0-9]{3})*(?:\\.[0-9]{2})?)"
  ],
  "address": [
    "(?i)\\b(\\d{1,5}\\s+[A-Za-z0-9'\\.\\- ]+,\\s*[A-Za-z\\.\\- ]+,\\s*[A-Z]{2}\\s*\\d{5}(?:-\\d{4})?)\\b"
  ]
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_object_string_and_array_shapes() {
        let json = r#"{
            "case_number": {"pattern": "Case No:\\s*([\\w-]+)", "group": 1},
            "name": "Name:\\s*(.+)",
            "amount": [{"pattern": "Due:\\s*(\\S+)"}, "\\$(\\S+)"]
        }"#;
        let (set, diagnostics) = RuleSet::from_json(json).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(set.field_count(), 3);
        assert_eq!(set.rule_count(), 4);
        assert_eq!(set.rules_for("amount").len(), 2);
        assert_eq!(set.rules_for("amount")[0].group, 1);
        assert_eq!(set.rules_for("name")[0].group, 1);
    }

    #[test]
    fn invalid_pattern_is_reported_per_rule() {
        let json = r#"{
            "case_number": ["([unclosed", "Case:\\s*(\\S+)"],
            "name": "Name:\\s*(.+)"
        }"#;
        let (set, diagnostics) = RuleSet::from_json(json).unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].field_name, "case_number");
        assert_eq!(diagnostics[0].index, 0);
        assert_eq!(set.rules_for("case_number").len(), 1);
        assert_eq!(set.rules_for("name").len(), 1);
    }

    #[test]
    fn field_with_only_invalid_rules_stays_present() {
        let (set, diagnostics) = RuleSet::from_json(r#"{"address": "(("}"#).unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(set.field_count(), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn malformed_json_is_fatal() {
        assert!(matches!(
            RuleSet::from_json("{not json"),
            Err(RuleError::Json(_))
        ));
        assert!(matches!(
            RuleSet::from_json(r#"{"name": {"group": 1}}"#),
            Err(RuleError::Json(_))
        ));
    }

    #[test]
    fn default_rules_all_compile() {
        let (set, diagnostics) = RuleSet::from_json(DEFAULT_RULES_JSON).unwrap();
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(set.field_count(), 4);
        assert_eq!(set.rule_count(), 7);
    }

    #[test]
    fn json_output_reloads_to_same_rules() {
        let original = RuleSet::default_rules();
        let json = original.to_json_pretty().unwrap();
        let (reloaded, diagnostics) = RuleSet::from_json(&json).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(reloaded.rule_count(), original.rule_count());
        for (field, rules) in original.fields() {
            let patterns: Vec<&str> = rules.iter().map(|r| r.pattern.as_str()).collect();
            let reloaded_patterns: Vec<&str> = reloaded
                .rules_for(field)
                .iter()
                .map(|r| r.pattern.as_str())
                .collect();
            assert_eq!(patterns, reloaded_patterns);
        }
    }

    #[test]
    fn negative_group_rejects_only_that_rule() {
        let json = r#"{
            "case_number": {"pattern": "Case:\\s*(\\S+)", "group": -1},
            "name": "Name:\\s*(.+)"
        }"#;
        let (set, diagnostics) = RuleSet::from_json(json).unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].field_name, "case_number");
        assert!(diagnostics[0].message.contains("negative"));
        assert_eq!(set.field_count(), 2);
        assert!(set.rules_for("case_number").is_empty());
        assert_eq!(set.rules_for("name").len(), 1);
    }

    #[test]
    fn oversized_group_is_kept_and_yields_nothing() {
        let json = r#"{"case_number": {"pattern": "Case:\\s*(\\S+)", "group": 7}}"#;
        let (set, diagnostics) = RuleSet::from_json(json).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(set.rules_for("case_number")[0].group, 7);
        assert_eq!(set.rules_for("case_number")[0].apply("Case: A1"), None);
    }

    #[test]
    fn repeated_field_keys_become_ordered_fallbacks() {
        let json = r#"{
            "case_number": "Docket:\\s*(\\S+)",
            "name": "Name:\\s*(.+)",
            "case_number": ["((", "Case:\\s*(\\S+)"]
        }"#;
        let (set, diagnostics) = RuleSet::from_json(json).unwrap();

        let patterns: Vec<&str> = set
            .rules_for("case_number")
            .iter()
            .map(|r| r.pattern.as_str())
            .collect();
        assert_eq!(patterns, vec![r"Docket:\s*(\S+)", r"Case:\s*(\S+)"]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].index, 1);

        assert_eq!(
            set.rules_for("case_number")[0].apply("Docket: D9"),
            Some("D9".to_owned())
        );
    }

    #[test]
    fn apply_is_multi_line() {
        let rule = ExtractionRule::new("name", r"^Owner:\s*(.+)$", 1).unwrap();
        assert_eq!(
            rule.apply("Case 1\nOwner: Jane Doe\nAmount: 5"),
            Some("Jane Doe".to_owned())
        );
    }
}
