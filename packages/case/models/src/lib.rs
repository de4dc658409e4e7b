#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Case record types shared across the case tracker.
//!
//! Every input, whether a spreadsheet row or a page of PDF text, ends up as
//! a [`CaseRecord`] keyed by its case number. The canonical column set is
//! described by [`CanonicalField`].

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The canonical columns of a case table.
///
/// The declaration order is the fixed export column order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CanonicalField {
    /// Unique case identifier, the dedup key.
    CaseNumber,
    /// Claimant, owner, or party name.
    Name,
    /// Monetary amount in USD.
    Amount,
    /// Street address, if present.
    Address,
    /// Originating file and page/row, for audit.
    Source,
}

impl CanonicalField {
    /// All canonical fields in export column order.
    pub const ALL: &[Self] = &[
        Self::CaseNumber,
        Self::Name,
        Self::Amount,
        Self::Address,
        Self::Source,
    ];

    /// Fields whose absence from a spreadsheet header is worth a warning.
    pub const REQUIRED: &[Self] = &[Self::CaseNumber, Self::Name, Self::Amount];

    /// Returns the column name used in exports (e.g. `"case_number"`).
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::CaseNumber => "case_number",
            Self::Name => "name",
            Self::Amount => "amount",
            Self::Address => "address",
            Self::Source => "source",
        }
    }

    /// Looks up a canonical field by its exact column name.
    #[must_use]
    pub fn from_column_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.column_name() == name)
    }
}

/// Which record survives when several share a case number.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DedupPolicy {
    /// Keep the earliest record in input order.
    #[default]
    FirstSeen,
    /// Keep the latest record in input order (placed where the case number
    /// first appeared).
    LastSeen,
}

/// A single case, normalized to the canonical schema.
///
/// Only `case_number` is required. Every other field is `None` when the
/// input did not provide it or it could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Unique case identifier (dedup key).
    pub case_number: String,
    /// Claimant/owner/party name.
    pub name: Option<String>,
    /// Amount in USD.
    pub amount: Option<f64>,
    /// Street address.
    pub address: Option<String>,
    /// Originating file and page or row (e.g. `"notice.pdf#p2"`).
    pub source: String,
}

impl CaseRecord {
    /// Creates a record with only the case number and source set.
    #[must_use]
    pub fn new(case_number: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            case_number: case_number.into(),
            name: None,
            amount: None,
            address: None,
            source: source.into(),
        }
    }

    /// Sets the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the amount.
    #[must_use]
    pub const fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Sets the address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// A block of raw text produced by PDF text extraction or OCR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTextBlock {
    /// File name of the originating document.
    pub source_file: String,
    /// Zero-based page index, or `None` when the text covers the whole
    /// document.
    pub page_index: Option<u32>,
    /// The extracted text.
    pub text: String,
}

impl RawTextBlock {
    /// Creates a block for a single page of a document.
    #[must_use]
    pub fn page(source_file: impl Into<String>, page_index: u32, text: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            page_index: Some(page_index),
            text: text.into(),
        }
    }

    /// Creates a block covering a whole document.
    #[must_use]
    pub fn document(source_file: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            page_index: None,
            text: text.into(),
        }
    }

    /// One-based page number, as shown to users.
    #[must_use]
    pub fn page_number(&self) -> Option<u32> {
        self.page_index.map(|i| i.saturating_add(1))
    }

    /// Provenance label stored in [`CaseRecord::source`].
    ///
    /// `"report.pdf#p3"` for page index 2, `"report.pdf"` when there is no
    /// page.
    #[must_use]
    pub fn source_label(&self) -> String {
        self.page_number().map_or_else(
            || self.source_file.clone(),
            |page| format!("{}#p{page}", self.source_file),
        )
    }
}

/// Provenance label for a spreadsheet data row (`row` is one-based).
#[must_use]
pub fn row_source_label(source_file: &str, row: usize) -> String {
    format!("{source_file}#row{row}")
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn canonical_fields_round_trip_through_strum() {
        for field in CanonicalField::ALL {
            let parsed = CanonicalField::from_str(field.as_ref()).unwrap();
            assert_eq!(parsed, *field);
            assert_eq!(field.as_ref(), field.column_name());
        }
    }

    #[test]
    fn export_order_is_fixed() {
        let names: Vec<&str> = CanonicalField::ALL
            .iter()
            .map(|f| f.column_name())
            .collect();
        assert_eq!(
            names,
            vec!["case_number", "name", "amount", "address", "source"]
        );
    }

    #[test]
    fn page_block_label_is_one_based() {
        let block = RawTextBlock::page("notice.pdf", 2, "text");
        assert_eq!(block.page_number(), Some(3));
        assert_eq!(block.source_label(), "notice.pdf#p3");
    }

    #[test]
    fn document_block_label_has_no_page() {
        let block = RawTextBlock::document("notice.pdf", "text");
        assert_eq!(block.source_label(), "notice.pdf");
    }

    #[test]
    fn dedup_policy_parses_snake_case() {
        assert_eq!(
            DedupPolicy::from_str("last_seen").unwrap(),
            DedupPolicy::LastSeen
        );
        assert_eq!(DedupPolicy::default(), DedupPolicy::FirstSeen);
        let json = serde_json::to_string(&DedupPolicy::FirstSeen).unwrap();
        assert_eq!(json, "\"first_seen\"");
    }
}
