//! `prestatrack stats` subcommand: per-service statistics over a date range

use clap::Args;

use crate::services::report::NO_DATA;
use crate::services::{Aggregator, Gateway, StatsReport};
use crate::types::{DateRange, PaymentMethod, PrestaError, Result, ServiceStats};

/// Show statistics
#[derive(Args, Debug, Default)]
pub struct StatsArgs {
    /// Start date, inclusive (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub from: Option<String>,

    /// End date, inclusive (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub to: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsArgs {
    /// Fetch the history and aggregate it over the requested range
    pub fn run(&self, gateway: &dyn Gateway, token: Option<&str>) -> Result<StatsReport> {
        // Bad dates are reported before any request
        let range = DateRange::parse(self.from.as_deref(), self.to.as_deref())?;
        let token = token.ok_or_else(PrestaError::not_signed_in)?;

        let transactions = gateway.list_transactions(token)?;
        tracing::debug!(count = transactions.len(), "transactions fetched");
        let stats = Aggregator::for_range(&transactions, &range);
        Ok(StatsReport::from_service_stats(&stats))
    }

    pub fn render(&self, report: &StatsReport) -> Result<String> {
        if self.json {
            serde_json::to_string_pretty(report).map_err(|e| PrestaError::Parse(e.to_string()))
        } else {
            Ok(format_table(report))
        }
    }
}

const HEADERS: [&str; 7] = [
    "Prestation",
    "Chiffre d'affaire",
    "Bénéfice",
    "Nb",
    "Espèce",
    "Chèque",
    "Paylib",
];

fn cells(name: &str, stats: &ServiceStats) -> [String; 7] {
    [
        name.to_string(),
        stats.revenue.to_string(),
        stats.profit.to_string(),
        stats.count.to_string(),
        stats.method_count(PaymentMethod::Cash).to_string(),
        stats.method_count(PaymentMethod::Check).to_string(),
        stats.method_count(PaymentMethod::Paylib).to_string(),
    ]
}

/// Plain-text table with a totals line
pub fn format_table(report: &StatsReport) -> String {
    if report.is_empty() {
        return NO_DATA.to_string();
    }

    let mut rows: Vec<[String; 7]> = report
        .rows
        .iter()
        .map(|row| cells(&row.name, &row.stats))
        .collect();
    rows.push(cells("Total", &report.total));

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (cell, w))| {
                let pad = " ".repeat(w - cell.chars().count());
                // Name left-aligned, figures right-aligned
                if i == 0 {
                    format!("{}{}", cell, pad)
                } else {
                    format!("{}{}", pad, cell)
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    let mut out = vec![line(&header)];
    let rule_width = widths.iter().sum::<usize>() + 2 * (widths.len() - 1);
    out.push("─".repeat(rule_width));
    let Some((total, body)) = rows.split_last() else {
        return NO_DATA.to_string();
    };
    out.extend(body.iter().map(|r| line(r)));
    out.push("─".repeat(rule_width));
    out.push(line(total));
    out.join("\n")
}
