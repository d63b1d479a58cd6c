//! Monetary value objects.

use core::fmt;
use serde::{Deserialize, Serialize};

/// ISO-4217 currency code, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    /// The accounting currency everything is reported in.
    pub fn usd() -> Self {
        Self("USD".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monetary amount in the currency's smallest unit (e.g. cents).
///
/// Integer minor units keep sums exact; conversion to the accounting currency
/// happens against a rate snapshot and rounds once, at the edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub minor_units: i64,
    pub currency: CurrencyCode,
}

impl Money {
    pub fn new(minor_units: i64, currency: CurrencyCode) -> Self {
        Self {
            minor_units,
            currency,
        }
    }

    /// Convenience for whole-unit amounts (10 → 1000 minor units).
    pub fn from_major(major: i64, currency: CurrencyCode) -> Self {
        Self::new(major * 100, currency)
    }

    pub fn is_positive(&self) -> bool {
        self.minor_units > 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.minor_units < 0 { "-" } else { "" };
        let abs = self.minor_units.unsigned_abs();
        write!(f, "{sign}{}.{:02} {}", abs / 100, abs % 100, self.currency)
    }
}
