//! Aggregator service for computing per-service statistics

use crate::types::{DateRange, ServiceStats, Transaction};
use std::collections::HashMap;

/// Aggregator for computing transaction statistics
pub struct Aggregator;

impl Aggregator {
    /// Keep transactions whose date falls inside `range` (input order kept).
    /// An unbounded range returns every transaction.
    pub fn filter_by_date<'a>(
        transactions: &'a [Transaction],
        range: &DateRange,
    ) -> Vec<&'a Transaction> {
        if range.is_unbounded() {
            return transactions.iter().collect();
        }

        transactions
            .iter()
            .filter(|t| range.contains(t.date))
            .collect()
    }

    /// Aggregate transactions by service name (blank names are skipped)
    pub fn by_service<'a, I>(transactions: I) -> HashMap<String, ServiceStats>
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut stats: HashMap<String, ServiceStats> = HashMap::new();

        for tx in transactions {
            let Some(name) = tx.service_name() else {
                continue;
            };
            stats.entry(name.to_string()).or_default().add(tx);
        }

        stats
    }

    /// Sum of every service group
    pub fn total(stats: &HashMap<String, ServiceStats>) -> ServiceStats {
        let mut total = ServiceStats::default();
        for group in stats.values() {
            total.merge(group);
        }
        total
    }

    /// Filter then aggregate in one call
    pub fn for_range(
        transactions: &[Transaction],
        range: &DateRange,
    ) -> HashMap<String, ServiceStats> {
        Self::by_service(Self::filter_by_date(transactions, range))
    }
}
