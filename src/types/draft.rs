//! Pre-submission transaction drafts

use chrono::NaiveDate;
use serde::Serialize;

use super::{CatalogEntry, Money, PaymentMethod};

/// A catalog entry paired with the chosen payment method and final price
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftPrestation {
    pub name: String,
    /// Catalog base price
    pub earning: Money,
    pub cost: Money,
    pub payment_method: PaymentMethod,
    /// Price actually charged; already resolved against the catalog price
    pub actual_earning: Money,
}

impl DraftPrestation {
    /// Build a draft, falling back to the catalog price when no custom
    /// amount was given
    pub fn from_catalog(
        entry: &CatalogEntry,
        payment_method: PaymentMethod,
        custom_earning: Option<Money>,
    ) -> Self {
        Self {
            name: entry.name.clone(),
            earning: entry.earning,
            cost: entry.cost,
            payment_method,
            actual_earning: custom_earning.unwrap_or(entry.earning),
        }
    }

    /// Whether the charged price differs from the catalog price
    pub fn is_custom_price(&self) -> bool {
        self.actual_earning != self.earning
    }

    pub fn profit(&self) -> Money {
        self.actual_earning - self.cost
    }
}

/// Body posted to the backend when recording a transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(with = "iso_date")]
    pub date: NaiveDate,
    pub invoice_number: String,
    pub prestations: Vec<DraftPrestation>,
    /// Present only when the token travels in the request body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Submission {
    pub fn total(&self) -> Money {
        self.prestations.iter().map(|p| p.actual_earning).sum()
    }
}

mod iso_date {
    use chrono::NaiveDate;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }
}
