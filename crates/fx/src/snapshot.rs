//! Immutable exchange-rate snapshot.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use subtrack_core::{CurrencyCode, Money};

/// An exchange-rate table valid until its TTL expires.
///
/// Snapshots are immutable once constructed: a refresh produces a new
/// snapshot behind a new `Arc`, so concurrent readers never observe a
/// half-updated table. Every conversion in one forecast run uses the same
/// snapshot, keeping the run internally consistent.
#[derive(Debug, Clone)]
pub struct RateSnapshot {
    base: CurrencyCode,
    rates: HashMap<CurrencyCode, f64>,
    fetched_at: DateTime<Utc>,
    ttl: Duration,
}

impl RateSnapshot {
    pub fn new(rates: HashMap<CurrencyCode, f64>, fetched_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            base: CurrencyCode::usd(),
            rates,
            fetched_at,
            ttl,
        }
    }

    /// Degrade path: every currency converts 1:1.
    pub fn identity(fetched_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self::new(HashMap::new(), fetched_at, ttl)
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.fetched_at
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.age(now) <= self.ttl
    }

    /// USD per unit of `currency`.
    ///
    /// Unrecognized codes convert 1:1 with a data-quality warning instead of
    /// failing; a missing rate must not block forecast rendering.
    pub fn rate_to_usd(&self, currency: &CurrencyCode) -> f64 {
        if *currency == self.base {
            return 1.0;
        }
        match self.rates.get(currency) {
            Some(rate) => *rate,
            None => {
                tracing::warn!(currency = %currency, "no exchange rate for currency, converting 1:1");
                1.0
            }
        }
    }

    /// Convert an amount to USD minor units.
    ///
    /// Pure and non-suspending; safe to call in hot loops after a single
    /// preload. Rounds half away from zero, once.
    pub fn convert_to_usd(&self, amount: &Money) -> i64 {
        let rate = self.rate_to_usd(&amount.currency);
        (amount.minor_units as f64 * rate).round() as i64
    }
}
