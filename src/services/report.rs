//! Render-ready statistics report

use std::collections::HashMap;

use serde::Serialize;

use crate::services::Aggregator;
use crate::types::ServiceStats;

/// Shown instead of the table when the range holds no transaction
pub const NO_DATA: &str = "Aucune donnée trouvée pour la période sélectionnée.";

/// One table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceRow {
    pub name: String,
    #[serde(flatten)]
    pub stats: ServiceStats,
}

/// Per-service rows sorted by name plus a totals row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub rows: Vec<ServiceRow>,
    pub total: ServiceStats,
}

impl StatsReport {
    /// Build from `Aggregator::by_service()` output.
    /// Names are ordered by plain byte comparison, independent of locale.
    pub fn from_service_stats(stats: &HashMap<String, ServiceStats>) -> Self {
        let mut rows: Vec<ServiceRow> = stats
            .iter()
            .map(|(name, stats)| ServiceRow {
                name: name.clone(),
                stats: stats.clone(),
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            rows,
            total: Aggregator::total(stats),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
