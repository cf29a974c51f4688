//! Immutable merged snapshots.
//!
//! A [`Snapshot`] is the output of one merge: every product record the
//! upstream sources currently know about, ordered by code and unique by
//! code. Snapshots are replaced wholesale, never mutated; readers hold an
//! `Arc<Snapshot>` and are unaffected by later publications.

use crate::product::{ProductCode, ProductRecord};
use serde::Serialize;

/// An immutable, fully-joined list of product records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    records: Vec<ProductRecord>,
}

impl Snapshot {
    /// Build a snapshot from merged records.
    ///
    /// Records are sorted by code. If two records carry the same code the
    /// later one wins; the merge itself never produces duplicates, so the
    /// dedup here is a constructor invariant, not a merge policy.
    pub fn from_records(mut records: Vec<ProductRecord>) -> Self {
        records.sort_by(|a, b| a.code.cmp(&b.code));
        records.reverse();
        records.dedup_by(|a, b| a.code == b.code);
        records.reverse();
        Self { records }
    }

    /// The empty snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by code.
    pub fn get(&self, code: &ProductCode) -> Option<&ProductRecord> {
        self.records
            .binary_search_by(|r| r.code.cmp(code))
            .ok()
            .map(|idx| &self.records[idx])
    }

    /// All records, ordered by code.
    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductRecord> {
        self.records.iter()
    }

    /// All codes, in snapshot order.
    pub fn codes(&self) -> impl Iterator<Item = &ProductCode> {
        self.records.iter().map(|r| &r.code)
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a ProductRecord;
    type IntoIter = std::slice::Iter<'a, ProductRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(code: &str) -> ProductRecord {
        ProductRecord::new(ProductCode::new(code).unwrap())
    }

    #[test]
    fn test_from_records_sorts_by_code() {
        let snapshot = Snapshot::from_records(vec![record("C"), record("A"), record("B")]);
        let codes: Vec<_> = snapshot.codes().map(|c| c.as_str()).collect();
        assert_eq!(codes, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_from_records_later_duplicate_wins() {
        let mut first = record("DUP");
        first.name = Some("first".to_string());
        let mut second = record("DUP");
        second.name = Some("second".to_string());

        let snapshot = Snapshot::from_records(vec![first, second]);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(
            snapshot
                .get(&ProductCode::new("DUP").unwrap())
                .unwrap()
                .name
                .as_deref(),
            Some("second")
        );
    }

    #[test]
    fn test_get_finds_existing_and_misses_absent() {
        let snapshot = Snapshot::from_records(vec![record("A"), record("B")]);
        assert!(snapshot.get(&ProductCode::new("A").unwrap()).is_some());
        assert!(snapshot.get(&ProductCode::new("Z").unwrap()).is_none());
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = Snapshot::empty();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.len(), 0);
        assert_eq!(snapshot.iter().count(), 0);
    }

    proptest! {
        #[test]
        fn prop_snapshot_codes_unique_and_sorted(codes in proptest::collection::vec("[A-Z]{1,4}", 0..40)) {
            let records: Vec<_> = codes
                .iter()
                .map(|c| record(c))
                .collect();
            let snapshot = Snapshot::from_records(records);

            let seen: Vec<_> = snapshot.codes().map(|c| c.as_str().to_string()).collect();
            let mut sorted = seen.clone();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(seen, sorted);
        }
    }
}
