//! Spreadsheet file readers.
//!
//! CSV and TSV are parsed with [`csv`]; Excel and ODS workbooks with
//! [`calamine`] (first worksheet only). Either way the first row is the
//! header and every cell is read as a trimmed string.

use std::io::Read;
use std::path::Path;

use calamine::Reader as _;

use crate::{Table, TabularError};

/// File extensions [`read_table`] accepts.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["csv", "tsv", "tab", "xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Whether `path` has a spreadsheet extension (case-insensitive).
#[must_use]
pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SPREADSHEET_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(e)))
}

/// Reads a spreadsheet, choosing the parser from the file extension.
///
/// # Errors
///
/// Returns [`TabularError`] if the file cannot be read, has no header row,
/// or is not a supported format.
pub fn read_table(path: &Path) -> Result<Table, TabularError> {
    let source_file = file_name(path);
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let table = match extension.as_str() {
        "csv" => read_delimited(std::fs::File::open(path)?, b',', &source_file)?,
        "tsv" | "tab" => read_delimited(std::fs::File::open(path)?, b'\t', &source_file)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path, &source_file)?,
        other => {
            return Err(TabularError::UnsupportedFormat(format!(
                "{source_file}: .{other} is not a spreadsheet"
            )));
        }
    };

    log::info!(
        "Read {} row(s) x {} column(s) from {source_file}",
        table.rows.len(),
        table.headers.len()
    );

    Ok(table)
}

/// Parses delimited text from any reader.
///
/// # Errors
///
/// Returns [`TabularError::Csv`] on malformed input or
/// [`TabularError::MissingHeader`] if there is no header row.
pub fn read_delimited(
    reader: impl Read,
    delimiter: u8,
    source_file: &str,
) -> Result<Table, TabularError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_owned())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(TabularError::MissingHeader(source_file.to_owned()));
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: Vec<String> = record.iter().map(|c| c.trim().to_owned()).collect();
        if row.iter().all(String::is_empty) {
            continue;
        }
        rows.push(row);
    }

    Ok(Table::new(source_file, headers, rows))
}

/// Reads the first worksheet of an Excel or ODS workbook.
fn read_workbook(path: &Path, source_file: &str) -> Result<Table, TabularError> {
    let mut workbook = calamine::open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| TabularError::MissingHeader(source_file.to_owned()))??;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string().trim().to_owned()).collect::<Vec<_>>());

    let headers = rows
        .next()
        .filter(|h| h.iter().any(|c| !c.is_empty()))
        .ok_or_else(|| TabularError::MissingHeader(source_file.to_owned()))?;

    let rows = rows
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .collect();

    Ok(Table::new(source_file, headers, rows))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
