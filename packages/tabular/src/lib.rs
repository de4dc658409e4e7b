#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spreadsheet ingestion for case lists.
//!
//! [`reader`] loads CSV, TSV and Excel/ODS files into a raw [`Table`] of
//! strings. [`headers::HeaderNormalizer`] then maps whatever column names the
//! file uses onto the canonical case schema, and
//! [`headers::NormalizedTable::into_records`] turns each row into a
//! [`case_tracker_case_models::CaseRecord`].

pub mod headers;
pub mod reader;

pub use headers::{HeaderNormalizer, NormalizedTable, TableRecords, UnmappedColumns};
pub use reader::{SPREADSHEET_EXTENSIONS, is_spreadsheet, read_delimited, read_table};

/// Errors that can occur while reading a spreadsheet.
#[derive(Debug, thiserror::Error)]
pub enum TabularError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Excel/ODS parsing failed.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// The file contains no header row.
    #[error("{0} contains no header row")]
    MissingHeader(String),

    /// The file extension is not a supported spreadsheet format.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// A raw table of string cells as read from a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// File name the table came from (used for provenance).
    pub source_file: String,
    /// Header row, trimmed.
    pub headers: Vec<String>,
    /// Data rows. Rows shorter than the header are padded with empty cells.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates a table, padding short rows to the header width.
    #[must_use]
    pub fn new(source_file: &str, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if row.len() < width {
                    row.resize(width, String::new());
                }
                row
            })
            .collect();
        Self {
            source_file: source_file.to_owned(),
            headers,
            rows,
        }
    }
}
