//! Transaction, catalog and statistics types

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::money::{self, Money};
use super::{PrestaError, Result};

/// Payment channels accepted by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "Espèce")]
    Cash,
    #[serde(rename = "Chèque")]
    Check,
    #[serde(rename = "Paylib")]
    Paylib,
}

impl PaymentMethod {
    /// All methods in display order
    pub fn all() -> &'static [PaymentMethod] {
        &[Self::Cash, Self::Check, Self::Paylib]
    }

    /// Label used by the backend and in reports
    pub fn label(self) -> &'static str {
        match self {
            Self::Cash => "Espèce",
            Self::Check => "Chèque",
            Self::Paylib => "Paylib",
        }
    }

    /// Exact backend label lookup (no aliases)
    pub fn from_label(label: &str) -> Option<Self> {
        Self::all().iter().copied().find(|m| m.label() == label)
    }

    /// Next method, wrapping (used to cycle the selection in the TUI)
    pub fn next(self) -> Self {
        match self {
            Self::Cash => Self::Check,
            Self::Check => Self::Paylib,
            Self::Paylib => Self::Cash,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentMethod {
    type Err = PrestaError;

    /// Accepts backend labels and ASCII aliases typed on the command line
    fn from_str(s: &str) -> Result<Self> {
        if let Some(method) = Self::from_label(s) {
            return Ok(method);
        }
        match s.trim().to_lowercase().as_str() {
            "cash" | "espece" | "espèce" | "especes" | "espèces" => Ok(Self::Cash),
            "check" | "cheque" | "chèque" => Ok(Self::Check),
            "paylib" => Ok(Self::Paylib),
            _ => Err(PrestaError::Validation(format!(
                "Mode de règlement inconnu : {}",
                s
            ))),
        }
    }
}

/// Payment method as recorded on a stored transaction.
/// Labels outside the known set are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentChannel {
    Known(PaymentMethod),
    Other(String),
}

impl PaymentChannel {
    pub fn from_label(label: &str) -> Self {
        match PaymentMethod::from_label(label) {
            Some(method) => Self::Known(method),
            None => Self::Other(label.to_string()),
        }
    }

    pub fn known(&self) -> Option<PaymentMethod> {
        match self {
            Self::Known(method) => Some(*method),
            Self::Other(_) => None,
        }
    }
}

impl Default for PaymentChannel {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<PaymentMethod> for PaymentChannel {
    fn from(method: PaymentMethod) -> Self {
        Self::Known(method)
    }
}

impl Serialize for PaymentChannel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Known(method) => serializer.serialize_str(method.label()),
            Self::Other(raw) => serializer.serialize_str(raw),
        }
    }
}

impl<'de> Deserialize<'de> for PaymentChannel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(serde_json::Value::String(s)) => Self::from_label(&s),
            Some(other) => Self::Other(other.to_string()),
            None => Self::default(),
        })
    }
}

/// Parse a stored transaction date into local wall-clock time.
///
/// Accepts RFC 3339 timestamps (converted to the local timezone),
/// naive `YYYY-MM-DDTHH:MM[:SS[.fff]]` and plain `YYYY-MM-DD` (midnight).
pub fn parse_transaction_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => parse_transaction_date(&s),
        _ => None,
    })
}

fn deserialize_name<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

/// A recorded transaction as listed by the backend
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default, deserialize_with = "deserialize_date")]
    pub date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "deserialize_name")]
    pub prestation_name: String,
    #[serde(default, deserialize_with = "money::deserialize_lenient")]
    pub actual_earning: Option<Money>,
    #[serde(default, deserialize_with = "money::deserialize_lenient")]
    pub cost: Option<Money>,
    #[serde(default)]
    pub payment_method: PaymentChannel,
}

impl Transaction {
    /// Amount earned, zero when the stored value was blank or unparseable
    pub fn earning_or_zero(&self) -> Money {
        self.actual_earning.unwrap_or_default()
    }

    /// Cost basis, zero when the stored value was blank or unparseable
    pub fn cost_or_zero(&self) -> Money {
        self.cost.unwrap_or_default()
    }

    /// Name used for grouping; None when blank
    pub fn service_name(&self) -> Option<&str> {
        let name = self.prestation_name.as_str();
        (!name.is_empty()).then_some(name)
    }
}

/// A billable service with its default price and cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(default, deserialize_with = "money::deserialize_lenient_or_zero")]
    pub earning: Money,
    #[serde(default, deserialize_with = "money::deserialize_lenient_or_zero")]
    pub cost: Money,
}

/// Inclusive calendar-day range; either bound may be open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Parse user-entered bounds; blank input means unbounded
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        Ok(Self {
            start: parse_bound(start)?,
            end: parse_bound(end)?,
        })
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Start of the first day (00:00:00.000)
    pub fn lower_bound(&self) -> Option<NaiveDateTime> {
        self.start.and_then(|d| d.and_hms_milli_opt(0, 0, 0, 0))
    }

    /// End of the last day (23:59:59.999)
    pub fn upper_bound(&self) -> Option<NaiveDateTime> {
        self.end.and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999))
    }

    /// Whether `date` falls inside the range. An undated transaction only
    /// matches an unbounded range.
    pub fn contains(&self, date: Option<NaiveDateTime>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(date) = date else {
            return false;
        };
        let after_start = self.lower_bound().is_none_or(|lo| date >= lo);
        let before_end = self.upper_bound().is_none_or(|hi| date <= hi);
        after_start && before_end
    }
}

fn parse_bound(input: Option<&str>) -> Result<Option<NaiveDate>> {
    match input.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                PrestaError::Validation(format!("Date invalide : {} (format AAAA-MM-JJ)", s))
            }),
    }
}

/// Aggregated figures for one service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStats {
    pub revenue: Money,
    pub profit: Money,
    pub count: u64,
    pub payment_methods: BTreeMap<PaymentMethod, u64>,
    /// Transactions whose payment label is outside the known set
    pub other_payments: u64,
}

impl Default for ServiceStats {
    fn default() -> Self {
        Self {
            revenue: Money::ZERO,
            profit: Money::ZERO,
            count: 0,
            payment_methods: PaymentMethod::all().iter().map(|m| (*m, 0)).collect(),
            other_payments: 0,
        }
    }
}

impl ServiceStats {
    pub fn add(&mut self, tx: &Transaction) {
        let earning = tx.earning_or_zero();
        self.revenue += earning;
        self.profit += earning - tx.cost_or_zero();
        self.count = self.count.saturating_add(1);
        match tx.payment_method.known() {
            Some(method) => *self.payment_methods.entry(method).or_insert(0) += 1,
            None => self.other_payments = self.other_payments.saturating_add(1),
        }
    }

    /// Fold another group into this one (used for the totals row)
    pub fn merge(&mut self, other: &ServiceStats) {
        self.revenue += other.revenue;
        self.profit += other.profit;
        self.count = self.count.saturating_add(other.count);
        for (method, n) in &other.payment_methods {
            *self.payment_methods.entry(*method).or_insert(0) += n;
        }
        self.other_payments = self.other_payments.saturating_add(other.other_payments);
    }

    /// Count for one payment method
    pub fn method_count(&self, method: PaymentMethod) -> u64 {
        self.payment_methods.get(&method).copied().unwrap_or(0)
    }

    /// Total cost basis (revenue minus profit)
    pub fn cost(&self) -> Money {
        self.revenue - self.profit
    }
}
