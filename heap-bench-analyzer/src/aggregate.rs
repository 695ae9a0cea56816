//! Group measurement records by benchmark, variant and key.

use std::collections::{BTreeMap, BTreeSet};

use crate::parser::{GroupKey, MeasurementRecord};

type Groups = BTreeMap<GroupKey, Vec<i64>>;

/// Measurements grouped as benchmark -> variant -> key -> values.
///
/// Value lists keep arrival order. Lookups never create entries, so a
/// (benchmark, variant, key) triple that never appeared in a log is simply
/// absent from every enumeration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationTable {
    benchmarks: BTreeMap<String, BTreeMap<String, Groups>>,
}

impl AggregationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = MeasurementRecord>) -> Self {
        let mut table = Self::new();
        table.extend(records);
        table
    }

    /// Append one measurement to its group.
    pub fn push(&mut self, record: MeasurementRecord) {
        self.benchmarks
            .entry(record.benchmark)
            .or_default()
            .entry(record.variant)
            .or_default()
            .entry(record.key)
            .or_default()
            .push(record.value);
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = MeasurementRecord>) {
        for record in records {
            self.push(record);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }

    /// Total number of measurements across all groups.
    pub fn record_count(&self) -> usize {
        self.benchmarks
            .values()
            .flat_map(|variants| variants.values())
            .flat_map(|groups| groups.values())
            .map(Vec::len)
            .sum()
    }

    /// Benchmark names, sorted.
    pub fn benchmarks(&self) -> impl Iterator<Item = &str> {
        self.benchmarks.keys().map(String::as_str)
    }

    pub fn has_benchmark(&self, benchmark: &str) -> bool {
        self.benchmarks.contains_key(benchmark)
    }

    /// Variants with data for `benchmark`, sorted.
    pub fn variants<'a>(&'a self, benchmark: &str) -> impl Iterator<Item = &'a str> {
        self.benchmarks
            .get(benchmark)
            .into_iter()
            .flat_map(|variants| variants.keys().map(String::as_str))
    }

    /// All groups of one variant in one benchmark, ordered by key.
    pub fn groups(&self, benchmark: &str, variant: &str) -> Option<&BTreeMap<GroupKey, Vec<i64>>> {
        self.benchmarks.get(benchmark)?.get(variant)
    }

    pub fn values(&self, benchmark: &str, variant: &str, key: &GroupKey) -> Option<&[i64]> {
        self.groups(benchmark, variant)?
            .get(key)
            .map(Vec::as_slice)
    }

    /// Union of keys over every variant of `benchmark`, ascending.
    pub fn keys<'a>(&'a self, benchmark: &str) -> BTreeSet<&'a GroupKey> {
        self.benchmarks
            .get(benchmark)
            .into_iter()
            .flat_map(|variants| variants.values())
            .flat_map(|groups| groups.keys())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(variant: &str, benchmark: &str, n: u64, value: i64) -> MeasurementRecord {
        MeasurementRecord {
            variant: variant.to_string(),
            benchmark: benchmark.to_string(),
            key: GroupKey::Size(n),
            value,
        }
    }

    #[test]
    fn test_push_keeps_arrival_order() {
        let table = AggregationTable::from_records([
            record("hhb", "sort", 1024, 500),
            record("hhb", "sort", 1024, 480),
            record("hhb", "sort", 1024, 520),
            record("phb", "sort", 1024, 700),
        ]);
        assert_eq!(
            table.values("sort", "hhb", &GroupKey::Size(1024)),
            Some(&[500, 480, 520][..])
        );
        assert_eq!(
            table.values("sort", "phb", &GroupKey::Size(1024)),
            Some(&[700][..])
        );
        assert_eq!(table.record_count(), 4);
    }

    #[test]
    fn test_lookups_do_not_create_entries() {
        let table = AggregationTable::from_records([record("hhb", "sort", 16, 1)]);
        assert_eq!(table.values("sort", "fhb", &GroupKey::Size(16)), None);
        assert_eq!(table.values("compression", "hhb", &GroupKey::Size(16)), None);
        assert_eq!(table.values("sort", "hhb", &GroupKey::Size(32)), None);
        assert!(table.groups("prim_dense", "hhb").is_none());
        assert_eq!(table.variants("compression").count(), 0);
        assert!(table.keys("compression").is_empty());

        assert_eq!(table.benchmarks().collect::<Vec<_>>(), vec!["sort"]);
        assert_eq!(table.variants("sort").collect::<Vec<_>>(), vec!["hhb"]);
    }

    #[test]
    fn test_keys_are_unioned_and_sorted() {
        let table = AggregationTable::from_records([
            record("hhb", "sort", 4096, 1),
            record("phb", "sort", 16, 1),
            record("hhb", "sort", 256, 1),
            record("phb", "sort", 4096, 1),
        ]);
        let keys: Vec<_> = table.keys("sort").into_iter().cloned().collect();
        assert_eq!(
            keys,
            vec![
                GroupKey::Size(16),
                GroupKey::Size(256),
                GroupKey::Size(4096)
            ]
        );
    }

    #[test]
    fn test_sizes_sort_before_locations() {
        let mut keys = vec![
            GroupKey::Location("bay".to_string()),
            GroupKey::Size(1 << 20),
            GroupKey::Location("AA".to_string()),
            GroupKey::Size(2),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                GroupKey::Size(2),
                GroupKey::Size(1 << 20),
                GroupKey::Location("AA".to_string()),
                GroupKey::Location("bay".to_string()),
            ]
        );
    }

    #[test]
    fn test_identical_input_builds_identical_tables() {
        let records = vec![
            record("hhb", "sort", 8, 3),
            record("fhb", "prim_dense", 64, 9),
            record("hhb", "sort", 8, 1),
        ];
        let a = AggregationTable::from_records(records.clone());
        let b = AggregationTable::from_records(records);
        assert_eq!(a, b);
    }
}
