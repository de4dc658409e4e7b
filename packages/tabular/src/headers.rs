//! Header normalization.
//!
//! Spreadsheet exports name their columns however they like (`"Case No."`,
//! `"CASE #"`, `"Claimant"`, `"Excess"`). [`HeaderNormalizer`] matches each
//! header case-insensitively against an alias list and renames matches to
//! the canonical column names. Missing canonical columns are never fatal:
//! the field is simply `None` on every record.

use std::collections::BTreeMap;

use case_tracker_case_models::{CanonicalField, CaseRecord, row_source_label};
use case_tracker_extract::parse_amount;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::Table;

/// Built-in aliases, in addition to each field's own column name.
const DEFAULT_ALIASES: &[(CanonicalField, &[&str])] = &[
    (
        CanonicalField::CaseNumber,
        &[
            "case",
            "caseno",
            "case no",
            "case no.",
            "case #",
            "case number",
            "case id",
            "case num",
            "docket",
            "docket number",
        ],
    ),
    (CanonicalField::Name, &["claimant", "owner", "claimant name", "owner name"]),
    (
        CanonicalField::Amount,
        &["amount raw", "excess", "surplus", "amount due", "balance"],
    ),
    (CanonicalField::Address, &["property address", "situs address"]),
    (CanonicalField::Source, &["__source", "source file"]),
];

/// What to do with columns that match no alias.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UnmappedColumns {
    /// Keep them under their original header.
    #[default]
    PassThrough,
    /// Remove them from the normalized table.
    Drop,
}

/// Lowercases, maps `_`/`-` to spaces, and collapses whitespace so
/// `"Case_Number"`, `"case-number"` and `" CASE  NUMBER "` compare equal.
fn alias_key(header: &str) -> String {
    header
        .trim()
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Maps arbitrary spreadsheet headers onto [`CanonicalField`]s.
#[derive(Debug, Clone)]
pub struct HeaderNormalizer {
    aliases: BTreeMap<String, CanonicalField>,
    unmapped: UnmappedColumns,
}

impl Default for HeaderNormalizer {
    fn default() -> Self {
        Self::new(UnmappedColumns::default())
    }
}

impl HeaderNormalizer {
    /// Creates a normalizer with the built-in alias list.
    #[must_use]
    pub fn new(unmapped: UnmappedColumns) -> Self {
        let mut aliases = BTreeMap::new();
        for field in CanonicalField::ALL {
            aliases.insert(alias_key(field.column_name()), *field);
        }
        for (field, names) in DEFAULT_ALIASES {
            for name in *names {
                aliases.insert(alias_key(name), *field);
            }
        }
        Self { aliases, unmapped }
    }

    /// Adds extra aliases for a field. Later aliases override earlier ones
    /// that normalize to the same key.
    #[must_use]
    pub fn with_aliases<S: AsRef<str>>(mut self, field: CanonicalField, names: &[S]) -> Self {
        for name in names {
            self.aliases.insert(alias_key(name.as_ref()), field);
        }
        self
    }

    /// Resolves a single header, if it is a known alias.
    #[must_use]
    pub fn resolve(&self, header: &str) -> Option<CanonicalField> {
        self.aliases.get(&alias_key(header)).copied()
    }

    /// Normalizes a table's headers.
    ///
    /// When two headers resolve to the same canonical field, the leftmost
    /// wins and the other is treated as unmapped. Required fields that no
    /// header maps to are logged as warnings.
    #[must_use]
    pub fn normalize(&self, table: Table) -> NormalizedTable {
        let mut columns = Vec::with_capacity(table.headers.len());
        let mut keep = Vec::with_capacity(table.headers.len());

        for header in &table.headers {
            let canonical = self
                .resolve(header)
                .filter(|field| !columns.iter().any(|c: &Column| c.canonical == Some(*field)));

            if canonical.is_none() && self.resolve(header).is_some() {
                log::warn!(
                    "{}: column '{header}' duplicates an already-mapped field, treating as unmapped",
                    table.source_file
                );
            }

            let kept = canonical.is_some() || self.unmapped == UnmappedColumns::PassThrough;
            keep.push(kept);
            if kept {
                columns.push(Column {
                    header: canonical.map_or_else(|| header.clone(), |f| f.column_name().to_owned()),
                    original_header: header.clone(),
                    canonical,
                });
            } else {
                log::debug!("{}: dropping unmapped column '{header}'", table.source_file);
            }
        }

        for field in CanonicalField::REQUIRED {
            if !columns.iter().any(|c| c.canonical == Some(*field)) {
                log::warn!(
                    "{}: no column maps to '{}', values will be empty",
                    table.source_file,
                    field.column_name()
                );
            }
        }

        let rows = table
            .rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(keep.iter())
                    .filter_map(|(cell, kept)| kept.then_some(cell))
                    .collect()
            })
            .collect();

        NormalizedTable {
            source_file: table.source_file,
            columns,
            rows,
        }
    }
}

/// A column of a [`NormalizedTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Canonical column name, or the original header if unmapped.
    pub header: String,
    /// Header as it appeared in the file.
    pub original_header: String,
    /// Canonical field this column maps to.
    pub canonical: Option<CanonicalField>,
}

/// Records produced from a normalized table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRecords {
    /// One record per row with a non-empty case number, in row order.
    pub records: Vec<CaseRecord>,
    /// Rows skipped because their case number was empty or missing.
    pub dropped: usize,
}

/// A table whose headers have been mapped to the canonical schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTable {
    /// File the table came from.
    pub source_file: String,
    /// Retained columns, in file order.
    pub columns: Vec<Column>,
    /// Rows aligned with `columns`.
    pub rows: Vec<Vec<String>>,
}

impl NormalizedTable {
    /// Header names after normalization.
    #[must_use]
    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.header.as_str()).collect()
    }

    /// Index of the column mapped to `field`.
    #[must_use]
    pub fn column_index(&self, field: CanonicalField) -> Option<usize> {
        self.columns.iter().position(|c| c.canonical == Some(field))
    }

    /// Converts each row into a [`CaseRecord`].
    ///
    /// Rows without a case number are counted in [`TableRecords::dropped`].
    /// Amounts go through [`parse_amount`]; an unparseable amount is
    /// `None`. The record source is the table's own `source` column when
    /// present and non-empty, otherwise `"<file>#row<N>"`.
    #[must_use]
    pub fn into_records(&self) -> TableRecords {
        let case_idx = self.column_index(CanonicalField::CaseNumber);
        let name_idx = self.column_index(CanonicalField::Name);
        let amount_idx = self.column_index(CanonicalField::Amount);
        let address_idx = self.column_index(CanonicalField::Address);
        let source_idx = self.column_index(CanonicalField::Source);

        let cell = |row: &[String], idx: Option<usize>| -> Option<String> {
            idx.and_then(|i| row.get(i))
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };

        let mut out = TableRecords::default();
        let mut unparsed_amounts = 0usize;

        for (i, row) in self.rows.iter().enumerate() {
            let Some(case_number) = cell(row, case_idx) else {
                out.dropped += 1;
                continue;
            };

            let raw_amount = cell(row, amount_idx);
            let amount = raw_amount.as_deref().and_then(parse_amount);
            if raw_amount.is_some() && amount.is_none() {
                unparsed_amounts += 1;
            }

            out.records.push(CaseRecord {
                case_number,
                name: cell(row, name_idx),
                amount,
                address: cell(row, address_idx),
                source: cell(row, source_idx)
                    .unwrap_or_else(|| row_source_label(&self.source_file, i + 1)),
            });
        }

        if out.dropped > 0 {
            log::info!(
                "{}: skipped {} row(s) without a case number",
                self.source_file,
                out.dropped
            );
        }
        if unparsed_amounts > 0 {
            log::debug!(
                "{}: {unparsed_amounts} amount(s) could not be parsed",
                self.source_file
            );
        }

        out
    }
}
