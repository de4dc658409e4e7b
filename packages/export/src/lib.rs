#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Export of case tables and raw page text.
//!
//! [`tables`] writes the canonical CSV layout shared by both case tables;
//! [`archive`] bundles the extracted page texts into a ZIP file for manual
//! review.

pub mod archive;
pub mod tables;

pub use archive::{archive_entry_name, write_text_archive};
pub use tables::{
    ALL_CASES_FILE, ExportPaths, FILTERED_CASES_FILE, export_all, to_csv_string, write_csv,
};

/// Errors that can occur while exporting.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Building the ZIP archive failed.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The CSV buffer was not valid UTF-8.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
