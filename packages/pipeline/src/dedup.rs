//! Deduplication by case number and minimum-amount filtering.

use std::collections::HashMap;

use case_tracker_case_models::{CaseRecord, DedupPolicy};

/// Result of [`process`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Processed {
    /// Deduplicated records, ordered by each case number's first
    /// appearance.
    pub all: Vec<CaseRecord>,
    /// The subset of `all` that passes the minimum-amount filter.
    pub filtered: Vec<CaseRecord>,
    /// How many input records were collapsed away.
    pub duplicates_removed: usize,
}

/// Collapses records sharing a case number to exactly one.
///
/// Output order follows the first appearance of each case number. With
/// [`DedupPolicy::LastSeen`] the surviving values come from the last
/// record but keep the first record's position.
///
/// Returns the survivors and the number of records removed.
#[must_use]
pub fn dedup(records: Vec<CaseRecord>, policy: DedupPolicy) -> (Vec<CaseRecord>, usize) {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(records.len());
    let mut out: Vec<CaseRecord> = Vec::with_capacity(records.len());
    let mut removed = 0usize;

    for record in records {
        if let Some(&pos) = positions.get(&record.case_number) {
            removed += 1;
            if policy == DedupPolicy::LastSeen {
                out[pos] = record;
            }
        } else {
            positions.insert(record.case_number.clone(), out.len());
            out.push(record);
        }
    }

    (out, removed)
}

/// Keeps records whose amount is present and at least `min_amount`.
///
/// With no threshold every record passes.
#[must_use]
pub fn filter_min_amount(records: &[CaseRecord], min_amount: Option<f64>) -> Vec<CaseRecord> {
    match min_amount {
        None => records.to_vec(),
        Some(min) => records
            .iter()
            .filter(|r| r.amount.is_some_and(|amount| amount >= min))
            .cloned()
            .collect(),
    }
}

/// Deduplicates (unless `policy` is `None`) and then filters.
#[must_use]
pub fn process(
    records: Vec<CaseRecord>,
    policy: Option<DedupPolicy>,
    min_amount: Option<f64>,
) -> Processed {
    let (all, duplicates_removed) = match policy {
        Some(policy) => dedup(records, policy),
        None => (records, 0),
    };
    let filtered = filter_min_amount(&all, min_amount);

    log::info!(
        "{} record(s) after dedup ({duplicates_removed} duplicate(s) removed), {} pass the amount filter",
        all.len(),
        filtered.len()
    );

    Processed {
        all,
        filtered,
        duplicates_removed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(case: &str, amount: Option<f64>, source: &str) -> CaseRecord {
        CaseRecord {
            case_number: case.to_owned(),
            name: Some(format!("{case} owner")),
            amount,
            address: None,
            source: source.to_owned(),
        }
    }

    #[test]
    fn first_seen_keeps_earliest_record() {
        let records = vec![
            record("A1", Some(10.0), "a.pdf#p1"),
            record("B2", Some(20.0), "a.pdf#p2"),
            record("A1", Some(99.0), "b.pdf#p1"),
        ];
        let (out, removed) = dedup(records, DedupPolicy::FirstSeen);
        assert_eq!(removed, 1);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].source, "a.pdf#p1");
        assert_eq!(out[0].amount, Some(10.0));
        assert_eq!(out[1].case_number, "B2");
    }

    #[test]
    fn last_seen_keeps_latest_values_at_first_position() {
        let records = vec![
            record("A1", Some(10.0), "a.pdf#p1"),
            record("B2", Some(20.0), "a.pdf#p2"),
            record("A1", Some(99.0), "b.pdf#p1"),
        ];
        let (out, _) = dedup(records, DedupPolicy::LastSeen);
        assert_eq!(out[0].case_number, "A1");
        assert_eq!(out[0].source, "b.pdf#p1");
        assert_eq!(out[1].case_number, "B2");
    }

    #[test]
    fn exactly_one_record_per_case_number() {
        let cases = ["C", "A", "B", "A", "C", "C", "D", "B"];
        let records: Vec<CaseRecord> = cases
            .iter()
            .enumerate()
            .map(|(i, c)| record(c, None, &format!("row{i}")))
            .collect();
        let (out, removed) = dedup(records, DedupPolicy::FirstSeen);
        let order: Vec<&str> = out.iter().map(|r| r.case_number.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B", "D"]);
        assert_eq!(removed, 4);
        assert_eq!(out[1].source, "row1");
        assert_eq!(out[2].source, "row2");
    }

    #[test]
    fn filter_excludes_null_and_small_amounts() {
        let records = vec![
            record("A", Some(10_000.0), "1"),
            record("B", None, "2"),
            record("C", Some(9_999.99), "3"),
            record("D", Some(50_000.0), "4"),
        ];
        let filtered = filter_min_amount(&records, Some(10_000.0));
        let cases: Vec<&str> = filtered.iter().map(|r| r.case_number.as_str()).collect();
        assert_eq!(cases, vec!["A", "D"]);
        assert!(
            filtered
                .iter()
                .all(|r| r.amount.is_some_and(|a| a >= 10_000.0))
        );
    }

    #[test]
    fn no_threshold_keeps_everything() {
        let records = vec![record("A", None, "1"), record("B", Some(1.0), "2")];
        assert_eq!(filter_min_amount(&records, None), records);
    }

    #[test]
    fn process_keeps_null_amounts_in_unfiltered_view() {
        let records = vec![
            record("A1", None, "a.pdf#p1"),
            record("A1", Some(500.0), "a.pdf#p2"),
            record("B2", Some(500.0), "a.pdf#p3"),
        ];
        let out = process(records, Some(DedupPolicy::FirstSeen), Some(100.0));
        assert_eq!(out.all.len(), 2);
        assert_eq!(out.all[0].amount, None);
        assert_eq!(out.duplicates_removed, 1);
        assert_eq!(out.filtered.len(), 1);
        assert_eq!(out.filtered[0].case_number, "B2");
    }

    #[test]
    fn process_without_dedup_keeps_duplicates() {
        let records = vec![record("A1", None, "1"), record("A1", None, "2")];
        let out = process(records, None, None);
        assert_eq!(out.all.len(), 2);
        assert_eq!(out.duplicates_removed, 0);
    }
}
