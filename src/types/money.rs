//! Euro amounts stored as integer cents

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Amount of money in euro cents.
///
/// Sums over cents are exact, so aggregating the same transactions in any
/// order yields identical totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

/// Leading numeric prefix, same shape a spreadsheet cell or a form field
/// produces ("30", "12.50", "1e3", "30 €")
fn amount_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid regex")
    })
}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Convert a euro amount, rounding to the nearest cent.
    /// Returns None for NaN or infinite input.
    pub fn from_euros(euros: f64) -> Option<Self> {
        if !euros.is_finite() {
            return None;
        }
        Some(Self((euros * 100.0).round() as i64))
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn to_euros(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Parse the leading numeric prefix of `input`.
    ///
    /// `"30"`, `" 12.5 "` and `"30abc"` parse; `""` and `"abc"` do not.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim_start();
        let m = amount_prefix().find(trimmed)?;
        let euros: f64 = m.as_str().parse().ok()?;
        Self::from_euros(euros)
    }

    /// Interpret a JSON cell value (number or string). Anything else is None.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_f64().and_then(Self::from_euros),
            serde_json::Value::String(s) => Self::parse(s),
            _ => None,
        }
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

/// Lenient deserializer for optional amount fields
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<Money>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Money::from_json))
}

/// Lenient deserializer for amount fields where unparseable means zero
pub fn deserialize_lenient_or_zero<'de, D>(deserializer: D) -> Result<Money, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_lenient(deserializer)?.unwrap_or_default())
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_euros())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_lenient_or_zero(deserializer)
    }
}

impl fmt::Display for Money {
    /// fr-FR currency style: `1 234,50 €`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = (abs / 100).to_string();
        let cents = abs % 100;

        let mut grouped = String::with_capacity(units.len() + units.len() / 3);
        for (i, ch) in units.chars().enumerate() {
            if i > 0 && (units.len() - i) % 3 == 0 {
                grouped.push(' ');
            }
            grouped.push(ch);
        }

        write!(f, "{}{},{:02} €", sign, grouped, cents)
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Money {
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_numbers() {
        assert_eq!(Money::parse("30"), Some(Money::from_cents(3000)));
        assert_eq!(Money::parse("12.5"), Some(Money::from_cents(1250)));
        assert_eq!(Money::parse(".5"), Some(Money::from_cents(50)));
        assert_eq!(Money::parse("-4.25"), Some(Money::from_cents(-425)));
    }

    #[test]
    fn test_parse_leading_prefix() {
        assert_eq!(Money::parse("  30 €"), Some(Money::from_cents(3000)));
        assert_eq!(Money::parse("30abc"), Some(Money::from_cents(3000)));
        assert_eq!(Money::parse("1e2"), Some(Money::from_cents(10000)));
        // comma is not a decimal separator for the backend
        assert_eq!(Money::parse("12,5"), Some(Money::from_cents(1200)));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert_eq!(Money::parse(""), None);
        assert_eq!(Money::parse("   "), None);
        assert_eq!(Money::parse("abc"), None);
        assert_eq!(Money::parse("€30"), None);
    }

    #[test]
    fn test_parse_rounds_to_cent() {
        assert_eq!(Money::parse("0.125"), Some(Money::from_cents(13)));
        assert_eq!(Money::parse("19.999"), Some(Money::from_cents(2000)));
    }

    #[test]
    fn test_from_json_values() {
        assert_eq!(Money::from_json(&json!(30)), Some(Money::from_cents(3000)));
        assert_eq!(Money::from_json(&json!(7.5)), Some(Money::from_cents(750)));
        assert_eq!(Money::from_json(&json!("10")), Some(Money::from_cents(1000)));
        assert_eq!(Money::from_json(&json!("")), None);
        assert_eq!(Money::from_json(&json!(null)), None);
        assert_eq!(Money::from_json(&json!(true)), None);
    }

    #[test]
    fn test_from_euros_rejects_non_finite() {
        assert_eq!(Money::from_euros(f64::NAN), None);
        assert_eq!(Money::from_euros(f64::INFINITY), None);
    }

    #[test]
    fn test_display_fr_format() {
        assert_eq!(Money::from_cents(0).to_string(), "0,00 €");
        assert_eq!(Money::from_cents(3000).to_string(), "30,00 €");
        assert_eq!(Money::from_cents(123_450).to_string(), "1 234,50 €");
        assert_eq!(Money::from_cents(100_000_000).to_string(), "1 000 000,00 €");
        assert_eq!(Money::from_cents(-505).to_string(), "-5,05 €");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(3000);
        let b = Money::from_cents(1000);
        assert_eq!(a - b, Money::from_cents(2000));
        assert_eq!(a + b, Money::from_cents(4000));
        assert_eq!(-b, Money::from_cents(-1000));

        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total, Money::from_cents(5000));
    }

    #[test]
    fn test_serialize_as_euros() {
        let value = serde_json::to_value(Money::from_cents(1250)).unwrap();
        assert_eq!(value, json!(12.5));
    }

    #[test]
    fn test_deserialize_lenient() {
        let m: Money = serde_json::from_value(json!("25")).unwrap();
        assert_eq!(m, Money::from_cents(2500));
        let m: Money = serde_json::from_value(json!("n/a")).unwrap();
        assert_eq!(m, Money::ZERO);
    }
}
