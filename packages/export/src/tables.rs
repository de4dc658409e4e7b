//! CSV export of case tables.
//!
//! Both tables share one layout: a header row of canonical column names in
//! [`CanonicalField::ALL`] order, amounts with two decimals, and empty cells
//! for missing values. Re-reading an export through the spreadsheet reader
//! yields the same records.

use std::io::Write;
use std::path::{Path, PathBuf};

use case_tracker_case_models::{CanonicalField, CaseRecord};
use case_tracker_pipeline::RunOutput;

use crate::ExportError;

/// File name of the deduplicated table.
pub const ALL_CASES_FILE: &str = "case_data_all.csv";

/// File name of the minimum-amount table.
pub const FILTERED_CASES_FILE: &str = "case_data_filtered.csv";

/// Where [`export_all`] wrote its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    /// Path of [`ALL_CASES_FILE`].
    pub all: PathBuf,
    /// Path of [`FILTERED_CASES_FILE`].
    pub filtered: PathBuf,
}

fn cell(record: &CaseRecord, field: CanonicalField) -> String {
    match field {
        CanonicalField::CaseNumber => record.case_number.clone(),
        CanonicalField::Name => record.name.clone().unwrap_or_default(),
        CanonicalField::Amount => record
            .amount
            .map(|amount| format!("{amount:.2}"))
            .unwrap_or_default(),
        CanonicalField::Address => record.address.clone().unwrap_or_default(),
        CanonicalField::Source => record.source.clone(),
    }
}

/// Writes `records` as CSV to `writer`.
///
/// # Errors
///
/// Returns [`ExportError`] if writing fails.
pub fn write_csv<W: Write>(writer: W, records: &[CaseRecord]) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);

    csv.write_record(CanonicalField::ALL.iter().map(|f| f.column_name()))?;
    for record in records {
        csv.write_record(CanonicalField::ALL.iter().map(|f| cell(record, *f)))?;
    }

    csv.flush()?;
    Ok(())
}

/// Renders `records` as a CSV string.
///
/// # Errors
///
/// Returns [`ExportError`] if serialization fails.
pub fn to_csv_string(records: &[CaseRecord]) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_csv(&mut buf, records)?;
    Ok(String::from_utf8(buf)?)
}

fn write_file(path: &Path, records: &[CaseRecord]) -> Result<(), ExportError> {
    let file = std::fs::File::create(path)?;
    write_csv(std::io::BufWriter::new(file), records)?;
    log::info!("Wrote {} case(s) to {}", records.len(), path.display());
    Ok(())
}

/// Writes both case tables of a run into `dir`, creating it if needed.
///
/// Existing files are overwritten.
///
/// # Errors
///
/// Returns [`ExportError`] if the directory or either file cannot be
/// written.
pub fn export_all(dir: &Path, output: &RunOutput) -> Result<ExportPaths, ExportError> {
    std::fs::create_dir_all(dir)?;

    let paths = ExportPaths {
        all: dir.join(ALL_CASES_FILE),
        filtered: dir.join(FILTERED_CASES_FILE),
    };

    write_file(&paths.all, &output.all)?;
    write_file(&paths.filtered, &output.filtered)?;

    Ok(paths)
}
