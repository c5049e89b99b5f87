//! Per-product, date-ordered sales history.
//!
//! Both the trainer and the online predictor build histories through
//! [`ProductHistory::from_records`], so ordering and duplicate handling can
//! never differ between the two. Duplicate `(product, date)` records resolve
//! as last-write-wins in input order.

use crate::domain::types::SalesRecord;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct ProductHistory {
    product_id: String,
    records: Vec<SalesRecord>,
    duplicates_resolved: usize,
}

impl ProductHistory {
    /// Builds a sorted history. Records for other products are ignored.
    pub fn from_records<I>(product_id: &str, records: I) -> Self
    where
        I: IntoIterator<Item = SalesRecord>,
    {
        let mut records: Vec<SalesRecord> = records
            .into_iter()
            .filter(|r| r.product_id == product_id)
            .collect();

        // Stable sort keeps input order among equal dates, so the last
        // duplicate in input order ends up last in its run.
        records.sort_by_key(|r| r.date);

        let before = records.len();
        let mut deduped: Vec<SalesRecord> = Vec::with_capacity(before);
        for record in records {
            match deduped.last_mut() {
                Some(last) if last.date == record.date => *last = record,
                _ => deduped.push(record),
            }
        }
        let duplicates_resolved = before - deduped.len();
        if duplicates_resolved > 0 {
            warn!(
                "Resolved {} duplicate sales record(s) for {} (last write wins)",
                duplicates_resolved, product_id
            );
        }

        Self {
            product_id: product_id.to_string(),
            records: deduped,
            duplicates_resolved,
        }
    }

    pub fn empty(product_id: &str) -> Self {
        Self {
            product_id: product_id.to_string(),
            records: Vec::new(),
            duplicates_resolved: 0,
        }
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn duplicates_resolved(&self) -> usize {
        self.duplicates_resolved
    }

    /// Records dated strictly before `target`, oldest first.
    pub fn prior_to(&self, target: NaiveDate) -> &[SalesRecord] {
        let end = self.records.partition_point(|r| r.date < target);
        &self.records[..end]
    }
}

/// Groups raw records into one history per product, keyed by product id.
pub fn group_by_product(records: &[SalesRecord]) -> BTreeMap<String, ProductHistory> {
    let mut buckets: BTreeMap<String, Vec<SalesRecord>> = BTreeMap::new();
    for record in records {
        buckets
            .entry(record.product_id.clone())
            .or_default()
            .push(record.clone());
    }

    buckets
        .into_iter()
        .map(|(product_id, records)| {
            let history = ProductHistory::from_records(&product_id, records);
            (product_id, history)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_history_is_sorted_by_date() {
        let history = ProductHistory::from_records(
            "P1",
            vec![
                SalesRecord::new("P1", day(5), 50),
                SalesRecord::new("P1", day(2), 20),
                SalesRecord::new("P2", day(3), 99),
                SalesRecord::new("P1", day(3), 30),
            ],
        );

        let units: Vec<u32> = history.records().iter().map(|r| r.units_sold).collect();
        assert_eq!(units, vec![20, 30, 50]);
        assert_eq!(history.product_id(), "P1");
    }

    #[test]
    fn test_duplicates_last_write_wins() {
        let history = ProductHistory::from_records(
            "P1",
            vec![
                SalesRecord::new("P1", day(2), 1),
                SalesRecord::new("P1", day(4), 7),
                SalesRecord::new("P1", day(2), 2),
                SalesRecord::new("P1", day(2), 3),
            ],
        );

        assert_eq!(history.len(), 2);
        assert_eq!(history.records()[0].units_sold, 3);
        assert_eq!(history.duplicates_resolved(), 2);
    }

    #[test]
    fn test_prior_to_excludes_target_and_later() {
        let history = ProductHistory::from_records(
            "P1",
            (1..=6).map(|d| SalesRecord::new("P1", day(d), d)),
        );

        let prior = history.prior_to(day(4));
        assert_eq!(prior.len(), 3);
        assert!(prior.iter().all(|r| r.date < day(4)));
        assert!(history.prior_to(day(1)).is_empty());
        assert_eq!(history.prior_to(day(30)).len(), 6);
    }

    #[test]
    fn test_group_by_product() {
        let records = vec![
            SalesRecord::new("B", day(1), 1),
            SalesRecord::new("A", day(2), 2),
            SalesRecord::new("A", day(1), 3),
        ];

        let grouped = group_by_product(&records);
        assert_eq!(grouped.keys().cloned().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(grouped["A"].records()[0].units_sold, 3);
    }
}
