//! Turns raw text blocks into case records.
//!
//! Each block is run through [`case_tracker_extract::extract`]. Blocks that
//! produce no case number are dropped and counted; the rest become one
//! [`CaseRecord`] each, in input order, with the block's page-level
//! provenance as the record source.

use case_tracker_case_models::{CanonicalField, CaseRecord, RawTextBlock};
use case_tracker_extract::{ExtractedFields, RuleSet, extract, parse_amount};

/// Records produced from a sequence of blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Orchestrated {
    /// One record per block that yielded a case number, in block order.
    pub records: Vec<CaseRecord>,
    /// Blocks that yielded no case number.
    pub dropped: usize,
    /// Records whose amount text matched but did not parse.
    pub unparsed_amounts: usize,
}

fn take(fields: &mut ExtractedFields, field: CanonicalField) -> Option<String> {
    fields.remove(field.column_name()).flatten()
}

/// Builds a record from one block, or `None` if it has no case number.
///
/// The second value reports whether an amount was matched but could not be
/// parsed.
#[must_use]
pub fn record_from_block(block: &RawTextBlock, rules: &RuleSet) -> Option<(CaseRecord, bool)> {
    let mut fields = extract(&block.text, rules);
    let case_number = take(&mut fields, CanonicalField::CaseNumber)?;

    let raw_amount = take(&mut fields, CanonicalField::Amount);
    let amount = raw_amount.as_deref().and_then(parse_amount);

    let record = CaseRecord {
        case_number,
        name: take(&mut fields, CanonicalField::Name),
        amount,
        address: take(&mut fields, CanonicalField::Address),
        source: block.source_label(),
    };

    Some((record, raw_amount.is_some() && amount.is_none()))
}

/// Extracts a record from every block, preserving input order.
#[must_use]
pub fn orchestrate(blocks: &[RawTextBlock], rules: &RuleSet) -> Orchestrated {
    let mut out = Orchestrated::default();

    for block in blocks {
        match record_from_block(block, rules) {
            Some((record, unparsed_amount)) => {
                log::debug!(
                    "{}: extracted case {}",
                    block.source_label(),
                    record.case_number
                );
                if unparsed_amount {
                    out.unparsed_amounts += 1;
                }
                out.records.push(record);
            }
            None => {
                log::debug!("{}: no case number found", block.source_label());
                out.dropped += 1;
            }
        }
    }

    log::info!(
        "Extracted {} record(s) from {} block(s), {} without a case number",
        out.records.len(),
        blocks.len(),
        out.dropped
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RuleSet {
        let json = r#"{
            "case_number": "Case No:\\s*([\\w-]+)",
            "amount": "Amount Due:\\s*\\$?([\\w,.]+)",
            "name": "Name:\\s*(.+)"
        }"#;
        RuleSet::from_json(json).unwrap().0
    }

    #[test]
    fn scenario_block_becomes_record() {
        let block = RawTextBlock::page(
            "notice.pdf",
            0,
            "Case No: 12-CV-004, Amount Due: $12,345.67, Name: Jane Doe",
        );
        let out = orchestrate(&[block], &rules());
        assert_eq!(out.dropped, 0);
        let record = &out.records[0];
        assert_eq!(record.case_number, "12-CV-004");
        assert_eq!(record.name.as_deref(), Some("Jane Doe"));
        assert_eq!(record.amount, Some(12_345.67));
        assert_eq!(record.address, None);
        assert_eq!(record.source, "notice.pdf#p1");
    }

    #[test]
    fn block_without_case_number_is_dropped_and_counted() {
        let blocks = vec![
            RawTextBlock::page("a.pdf", 0, "Case No: A1"),
            RawTextBlock::page("a.pdf", 1, "cover letter, nothing to see"),
            RawTextBlock::page("a.pdf", 2, "Case No: A2"),
        ];
        let out = orchestrate(&blocks, &rules());
        assert_eq!(out.dropped, 1);
        let cases: Vec<&str> = out.records.iter().map(|r| r.case_number.as_str()).collect();
        assert_eq!(cases, vec!["A1", "A2"]);
        assert_eq!(out.records[1].source, "a.pdf#p3");
    }

    #[test]
    fn unparseable_amount_is_none_and_counted() {
        let block = RawTextBlock::document("a.pdf", "Case No: A1\nAmount Due: TBD");
        let out = orchestrate(&[block], &rules());
        assert_eq!(out.records[0].amount, None);
        assert_eq!(out.unparsed_amounts, 1);
        assert_eq!(out.records[0].source, "a.pdf");
    }

    #[test]
    fn empty_rules_drop_everything() {
        let blocks = vec![RawTextBlock::page("a.pdf", 0, "Case No: A1")];
        let out = orchestrate(&blocks, &RuleSet::new());
        assert!(out.records.is_empty());
        assert_eq!(out.dropped, 1);
    }
}
