//! Terminal rendering of a run: a case table plus diagnostic counts.

use std::fmt::Write as _;

use case_tracker_case_models::{CanonicalField, CaseRecord};
use case_tracker_pipeline::RunOutput;

/// Cells longer than this are cut with an ellipsis.
const MAX_CELL_WIDTH: usize = 40;

/// Rows shown in the per-run summary.
pub const PREVIEW_ROWS: usize = 20;

fn cell(record: &CaseRecord, field: CanonicalField) -> String {
    let value = match field {
        CanonicalField::CaseNumber => record.case_number.clone(),
        CanonicalField::Name => record.name.clone().unwrap_or_default(),
        CanonicalField::Amount => record
            .amount
            .map(|amount| format!("{amount:.2}"))
            .unwrap_or_default(),
        CanonicalField::Address => record.address.clone().unwrap_or_default(),
        CanonicalField::Source => record.source.clone(),
    };
    let value = value.replace('\n', " ");

    if value.chars().count() > MAX_CELL_WIDTH {
        let cut: String = value.chars().take(MAX_CELL_WIDTH - 1).collect();
        format!("{cut}\u{2026}")
    } else {
        value
    }
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(c, &w)| format!("{c:<w$}"))
        .collect();
    let _ = writeln!(out, "{}", padded.join(" | ").trim_end());
}

/// Renders up to `max_rows` records as an aligned text table.
pub fn render_table(records: &[CaseRecord], max_rows: Option<usize>) -> String {
    let shown = max_rows.map_or(records, |n| &records[..n.min(records.len())]);

    let rows: Vec<Vec<String>> = shown
        .iter()
        .map(|r| CanonicalField::ALL.iter().map(|f| cell(r, *f)).collect())
        .collect();

    let widths: Vec<usize> = CanonicalField::ALL
        .iter()
        .enumerate()
        .map(|(i, f)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(f.column_name().len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    push_line(&mut out, CanonicalField::ALL.iter().map(|f| f.column_name()), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for row in &rows {
        push_line(&mut out, row.iter().map(String::as_str), &widths);
    }

    if shown.len() < records.len() {
        let _ = writeln!(out, "... {} more", records.len() - shown.len());
    }

    out
}

/// Renders the counters and messages of a run.
pub fn render_counts(output: &RunOutput) -> String {
    let d = &output.diagnostics;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} case(s), {} after minimum-amount filter",
        output.all.len(),
        output.filtered.len()
    );
    let _ = writeln!(
        out,
        "dropped: {} row(s), {} page(s) without a case number; {} duplicate(s) removed; {} unparsed amount(s)",
        d.rows_dropped, d.blocks_dropped, d.duplicates_removed, d.unparsed_amounts
    );

    if d.ocr_pages > 0 {
        let _ = writeln!(out, "{} page(s) read with OCR", d.ocr_pages);
    }
    if d.ocr_unavailable {
        let _ = writeln!(out, "OCR requested but pdftoppm/tesseract not found");
    }
    if !d.document_failures.is_empty() {
        let _ = writeln!(out, "{} document(s) failed:", d.document_failures.len());
        for failure in &d.document_failures {
            let _ = writeln!(out, "  {failure}");
        }
    }
    for diagnostic in &d.rule_diagnostics {
        let _ = writeln!(out, "rule rejected: {diagnostic}");
    }
    for warning in &d.warnings {
        let _ = writeln!(out, "warning: {warning}");
    }

    out
}

/// Prints the filtered table preview and the run's counts.
pub fn print_summary(output: &RunOutput) {
    println!();
    print!("{}", render_table(&output.filtered, Some(PREVIEW_ROWS)));
    println!();
    print!("{}", render_counts(output));
}
