//! TTL-bound cache over a [`RateProvider`].

use std::sync::{Arc, RwLock};
use std::time::Duration as StdDuration;

use chrono::Duration;
use tokio::sync::Mutex;

use subtrack_core::{CurrencyCode, Money};

use crate::clock::Clock;
use crate::provider::RateProvider;
use crate::snapshot::RateSnapshot;

/// Tuning for the rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// Snapshot age beyond which a refresh is attempted.
    pub ttl: Duration,
    /// How long past its TTL a last-good snapshot may still serve conversions
    /// when the provider is down.
    pub grace: Duration,
    /// Upper bound on a single provider fetch; a stalled provider degrades to
    /// the fallback path instead of hanging the caller.
    pub fetch_timeout: StdDuration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(1),
            grace: Duration::hours(24),
            fetch_timeout: StdDuration::from_secs(10),
        }
    }
}

/// Exchange-rate cache owning its TTL and clock.
///
/// Constructed once at composition time and injected wherever conversions
/// happen; tests drive it with a [`ManualClock`](crate::ManualClock) and a
/// stub provider.
pub struct RateCache<P, C> {
    provider: P,
    clock: C,
    config: RateCacheConfig,
    current: RwLock<Option<Arc<RateSnapshot>>>,
    /// Serializes refreshes so concurrent stale readers perform one fetch.
    refresh: Mutex<()>,
}

impl<P, C> RateCache<P, C>
where
    P: RateProvider,
    C: Clock,
{
    pub fn new(provider: P, clock: C) -> Self {
        Self::with_config(provider, clock, RateCacheConfig::default())
    }

    pub fn with_config(provider: P, clock: C, config: RateCacheConfig) -> Self {
        Self {
            provider,
            clock,
            config,
            current: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// The currently installed snapshot, if any. Non-suspending.
    pub fn snapshot(&self) -> Option<Arc<RateSnapshot>> {
        self.current.read().ok().and_then(|guard| guard.clone())
    }

    /// Load or refresh the snapshot; the only suspend point in this crate.
    ///
    /// Never fails: provider trouble keeps the last-good snapshot while it is
    /// within the grace period, then degrades to identity rates with a
    /// warning. Dashboard code must not see an error for this failure class.
    pub async fn ensure_rates_loaded(&self) -> Arc<RateSnapshot> {
        if let Some(snapshot) = self.snapshot() {
            if snapshot.is_fresh(self.clock.now()) {
                return snapshot;
            }
        }

        let _guard = self.refresh.lock().await;

        // Another caller may have refreshed while we waited on the lock.
        let now = self.clock.now();
        if let Some(snapshot) = self.snapshot() {
            if snapshot.is_fresh(now) {
                return snapshot;
            }
        }

        let fetched = tokio::time::timeout(
            self.config.fetch_timeout,
            self.provider.fetch_rates(&CurrencyCode::usd()),
        )
        .await;

        let snapshot = match fetched {
            Ok(Ok(rates)) => {
                tracing::debug!(rates = rates.len(), "exchange rates refreshed");
                Arc::new(RateSnapshot::new(rates, now, self.config.ttl))
            }
            Ok(Err(err)) => self.degraded(err.to_string()),
            Err(_) => self.degraded(format!(
                "fetch timed out after {:?}",
                self.config.fetch_timeout
            )),
        };

        if let Ok(mut current) = self.current.write() {
            *current = Some(snapshot.clone());
        }
        snapshot
    }

    /// One-off conversion. Inside loops, call [`Self::ensure_rates_loaded`]
    /// once and convert against the snapshot instead.
    pub async fn convert_to_usd(&self, amount: &Money) -> i64 {
        let snapshot = self.ensure_rates_loaded().await;
        snapshot.convert_to_usd(amount)
    }

    fn degraded(&self, reason: String) -> Arc<RateSnapshot> {
        let now = self.clock.now();
        if let Some(last_good) = self.snapshot() {
            if last_good.age(now) <= last_good.ttl() + self.config.grace {
                tracing::warn!(
                    %reason,
                    age_minutes = last_good.age(now).num_minutes(),
                    "rate provider unavailable, serving last-good snapshot"
                );
                return last_good;
            }
        }
        tracing::warn!(
            %reason,
            "rate provider unavailable and no usable snapshot, falling back to identity rates"
        );
        Arc::new(RateSnapshot::identity(now, self.config.ttl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::provider::RateError;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct StubProvider {
        rates: Vec<(&'static str, f64)>,
        fail: AtomicBool,
        hang: AtomicBool,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn new(rates: &[(&'static str, f64)]) -> Self {
            Self {
                rates: rates.to_vec(),
                fail: AtomicBool::new(false),
                hang: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            }
        }

        fn set_failing(&self, failing: bool) {
            self.fail.store(failing, Ordering::SeqCst);
        }

        fn set_hanging(&self, hanging: bool) {
            self.hang.store(hanging, Ordering::SeqCst);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateProvider for StubProvider {
        async fn fetch_rates(
            &self,
            _base: &CurrencyCode,
        ) -> Result<HashMap<CurrencyCode, f64>, RateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(RateError::Unreachable("stub offline".to_string()));
            }
            Ok(self
                .rates
                .iter()
                .map(|(code, rate)| (CurrencyCode::new(*code), *rate))
                .collect())
        }
    }

    fn cache_with(
        rates: &[(&'static str, f64)],
    ) -> (RateCache<Arc<StubProvider>, Arc<ManualClock>>, Arc<StubProvider>, Arc<ManualClock>) {
        cache_with_config(rates, RateCacheConfig::default())
    }

    fn cache_with_config(
        rates: &[(&'static str, f64)],
        config: RateCacheConfig,
    ) -> (RateCache<Arc<StubProvider>, Arc<ManualClock>>, Arc<StubProvider>, Arc<ManualClock>) {
        let provider = Arc::new(StubProvider::new(rates));
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        ));
        let cache = RateCache::with_config(provider.clone(), clock.clone(), config);
        (cache, provider, clock)
    }

    fn short_timeout_config() -> RateCacheConfig {
        RateCacheConfig {
            fetch_timeout: StdDuration::from_millis(50),
            ..RateCacheConfig::default()
        }
    }

    #[tokio::test]
    async fn loads_once_while_fresh() {
        let (cache, provider, _clock) = cache_with(&[("EUR", 1.08)]);

        let first = cache.ensure_rates_loaded().await;
        let second = cache.ensure_rates_loaded().await;

        assert_eq!(provider.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn refreshes_after_ttl_expiry() {
        let (cache, provider, clock) = cache_with(&[("EUR", 1.08)]);

        cache.ensure_rates_loaded().await;
        clock.advance(Duration::hours(2));
        cache.ensure_rates_loaded().await;

        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn provider_failure_within_grace_keeps_last_good() {
        let (cache, provider, clock) = cache_with(&[("EUR", 1.08)]);

        cache.ensure_rates_loaded().await;
        provider.set_failing(true);
        clock.advance(Duration::hours(2));

        let snapshot = cache.ensure_rates_loaded().await;
        let amount = Money::from_major(30, CurrencyCode::new("EUR"));
        assert_eq!(snapshot.convert_to_usd(&amount), 3240);
    }

    #[tokio::test]
    async fn provider_failure_beyond_grace_degrades_to_identity() {
        let (cache, provider, clock) = cache_with(&[("EUR", 1.08)]);

        cache.ensure_rates_loaded().await;
        provider.set_failing(true);
        clock.advance(Duration::hours(48));

        let snapshot = cache.ensure_rates_loaded().await;
        let amount = Money::from_major(30, CurrencyCode::new("EUR"));
        assert_eq!(snapshot.convert_to_usd(&amount), 3000);
    }

    #[tokio::test]
    async fn stalled_provider_times_out_and_serves_identity() {
        let (cache, provider, _clock) = cache_with_config(&[("EUR", 1.08)], short_timeout_config());
        provider.set_hanging(true);

        let usd = cache
            .convert_to_usd(&Money::from_major(5, CurrencyCode::new("EUR")))
            .await;
        assert_eq!(usd, 500);
    }

    #[tokio::test]
    async fn stalled_provider_within_grace_keeps_last_good() {
        let (cache, provider, clock) = cache_with_config(&[("EUR", 1.08)], short_timeout_config());

        cache.ensure_rates_loaded().await;
        provider.set_hanging(true);
        clock.advance(Duration::hours(2));

        let snapshot = cache.ensure_rates_loaded().await;
        let amount = Money::from_major(30, CurrencyCode::new("EUR"));
        assert_eq!(snapshot.convert_to_usd(&amount), 3240);
    }

    #[tokio::test]
    async fn failure_with_no_snapshot_still_serves_identity() {
        let (cache, provider, _clock) = cache_with(&[("EUR", 1.08)]);
        provider.set_failing(true);

        let usd = cache
            .convert_to_usd(&Money::from_major(5, CurrencyCode::new("EUR")))
            .await;
        assert_eq!(usd, 500);
    }
}
