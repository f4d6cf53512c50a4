//! `prestatrack record` subcommand: compose and submit one transaction

use std::str::FromStr;

use chrono::{Local, NaiveDate};
use clap::Args;

use crate::services::{CatalogService, Gateway, Register};
use crate::types::{Money, PaymentMethod, PrestaError, Result, Submission};

/// One `--item` value: `NAME:METHOD[:PRICE]`
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSpec {
    pub name: String,
    pub method: PaymentMethod,
    /// Custom price as typed; None means the catalog price
    pub price: Option<String>,
}

impl FromStr for ItemSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let malformed = || format!("expected NAME:METHOD[:PRICE], got '{}'", s);
        let (head, last) = s.rsplit_once(':').ok_or_else(malformed)?;

        // NAME:METHOD
        if let Ok(method) = last.parse::<PaymentMethod>() {
            return Ok(Self {
                name: head.trim().to_string(),
                method,
                price: None,
            });
        }

        // NAME:METHOD:PRICE
        let (name, method) = head.rsplit_once(':').ok_or_else(malformed)?;
        let method = method.parse::<PaymentMethod>().map_err(|e| e.to_string())?;
        if Money::parse(last).is_none() {
            return Err(format!("Montant invalide : {}", last));
        }
        Ok(Self {
            name: name.trim().to_string(),
            method,
            price: Some(last.trim().to_string()),
        })
    }
}

/// Record a transaction
#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Prestation to add, as NAME:METHOD[:PRICE] (repeatable).
    /// METHOD is cash, cheque or paylib.
    #[arg(long = "item", value_name = "NAME:METHOD[:PRICE]", required = true)]
    pub items: Vec<ItemSpec>,

    /// Transaction date (YYYY-MM-DD, default today)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Invoice number
    #[arg(long, default_value = "")]
    pub invoice: String,
}

impl RecordArgs {
    /// Build the register from the catalog and submit every item at once
    pub fn run(
        &self,
        gateway: &dyn Gateway,
        catalog: &CatalogService,
        token: Option<&str>,
    ) -> Result<Submission> {
        let token = token.ok_or_else(PrestaError::not_signed_in)?;

        let load = catalog.load(gateway, false)?;
        if let Some(warning) = &load.warning {
            tracing::warn!("{}", warning.message());
        }

        let mut register = Register::new(load.entries);
        for item in &self.items {
            register.add(
                Some(&item.name),
                Some(item.method),
                item.price.as_deref().unwrap_or(""),
            )?;
        }

        let date = self.date.unwrap_or_else(|| Local::now().date_naive());
        register.submit(gateway, Some(token), date, &self.invoice)
    }
}

/// Summary printed after a successful submission
pub fn format_receipt(submission: &Submission) -> String {
    let mut out = format!(
        "Transaction enregistrée le {}",
        submission.date.format("%d/%m/%Y")
    );
    if !submission.invoice_number.is_empty() {
        out.push_str(&format!(" (facture {})", submission.invoice_number));
    }
    out.push('\n');
    for draft in &submission.prestations {
        out.push_str(&format!(
            "  {:<24} {:<8} {:>12}\n",
            draft.name,
            draft.payment_method.label(),
            draft.actual_earning.to_string()
        ));
    }
    out.push_str(&format!("  {:<33} {:>12}", "Total", submission.total().to_string()));
    out
}
