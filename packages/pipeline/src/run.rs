//! The pure part of a run: loaded inputs in, case tables and diagnostics
//! out.
//!
//! Spreadsheet rows come first (upload order), then PDF pages (upload
//! order, then page order). That merged order is what "first seen" means
//! during dedup.

use case_tracker_case_models::CaseRecord;
use case_tracker_extract::{RuleDiagnostic, RuleSet};

use crate::dedup::process;
use crate::load::{DocumentFailure, LoadedInputs};
use crate::orchestrator::orchestrate;
use crate::settings::Settings;

/// Counters and messages describing a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Spreadsheet rows without a case number.
    pub rows_dropped: usize,
    /// Text blocks without a case number.
    pub blocks_dropped: usize,
    /// Amounts that matched but could not be parsed.
    pub unparsed_amounts: usize,
    /// Records collapsed by dedup.
    pub duplicates_removed: usize,
    /// Documents skipped during loading.
    pub document_failures: Vec<DocumentFailure>,
    /// Rules rejected when the rule set was loaded.
    pub rule_diagnostics: Vec<RuleDiagnostic>,
    /// Pages recognised by OCR.
    pub ocr_pages: usize,
    /// OCR was requested but not installed.
    pub ocr_unavailable: bool,
    /// Other non-fatal warnings.
    pub warnings: Vec<String>,
}

/// The two case tables of a run plus its diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOutput {
    /// Deduplicated records.
    pub all: Vec<CaseRecord>,
    /// Records passing the minimum-amount filter.
    pub filtered: Vec<CaseRecord>,
    /// What happened along the way.
    pub diagnostics: Diagnostics,
}

/// Runs normalization, extraction, dedup and filtering.
///
/// Deterministic: identical inputs, rules and settings give identical
/// output.
#[must_use]
pub fn run(inputs: &LoadedInputs, rules: &RuleSet, settings: &Settings) -> RunOutput {
    let mut diagnostics = Diagnostics {
        document_failures: inputs.document_failures.clone(),
        ocr_pages: inputs.ocr_pages,
        ocr_unavailable: inputs.ocr_unavailable,
        warnings: inputs.warnings.clone(),
        ..Diagnostics::default()
    };

    let normalizer = settings.normalizer();
    let mut records: Vec<CaseRecord> = Vec::new();

    for table in &inputs.tables {
        let table_records = normalizer.normalize(table.clone()).into_records();
        diagnostics.rows_dropped += table_records.dropped;
        records.extend(table_records.records);
    }

    let orchestrated = orchestrate(&inputs.blocks, rules);
    diagnostics.blocks_dropped = orchestrated.dropped;
    diagnostics.unparsed_amounts = orchestrated.unparsed_amounts;
    records.extend(orchestrated.records);

    let processed = process(records, settings.effective_dedup(), settings.min_amount);
    diagnostics.duplicates_removed = processed.duplicates_removed;

    RunOutput {
        all: processed.all,
        filtered: processed.filtered,
        diagnostics,
    }
}
