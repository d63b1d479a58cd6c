//! `subtrack-engine` — composition root for the forecasting and stats engine.
//!
//! Wires the rate cache, the pure forecast engine and the stats store
//! together and exposes the in-process interface UI data-loading code and
//! entity-mutation handlers call. No network surface of its own.

use std::sync::Arc;

use chrono::NaiveDate;

use subtrack_core::Obligation;
use subtrack_forecast::ForecastMonth;
use subtrack_fx::{Clock, RateCache, RateCacheConfig, RateProvider};
use subtrack_stats::{AggregateStats, DocumentStore, StatsStore, StoreError};

pub use subtrack_audit::{ChangeRecord, detect_changes, summarize};
pub use subtrack_observability as observability;

/// The engine's public handle: one rate cache, one stats store, shared
/// clock. Constructed once at startup with the host's document store and
/// rate provider.
pub struct Engine<S, P, C> {
    rates: Arc<RateCache<P, C>>,
    stats: StatsStore<S, P, C>,
}

impl<S, P, C> Engine<S, P, C>
where
    S: DocumentStore,
    P: RateProvider,
    C: Clock + Clone,
{
    pub fn new(store: S, provider: P, clock: C) -> Self {
        Self::with_config(store, provider, clock, RateCacheConfig::default())
    }

    pub fn with_config(store: S, provider: P, clock: C, config: RateCacheConfig) -> Self {
        let rates = Arc::new(RateCache::with_config(provider, clock.clone(), config));
        let stats = StatsStore::new(store, rates.clone(), clock);
        Self { rates, stats }
    }

    /// Cached aggregates, rebuilding only when no document exists yet.
    pub async fn get_stats(&self) -> Result<AggregateStats, StoreError> {
        self.stats.get_stats().await
    }

    /// Full recompute from the authoritative records.
    pub async fn rebuild_stats(&self) -> Result<AggregateStats, StoreError> {
        self.stats.rebuild().await
    }

    /// One suspending rate preload, then a pure projection over the given
    /// obligations. Does not touch the persisted document.
    pub async fn compute_forecast(
        &self,
        obligations: &[Obligation],
        now: NaiveDate,
    ) -> Vec<ForecastMonth> {
        let snapshot = self.rates.ensure_rates_loaded().await;
        subtrack_forecast::compute_forecast(obligations, now, &snapshot)
    }

    /// Recompute the forecast from obligations already in memory and patch
    /// it into the persisted document, leaving the other aggregates alone.
    pub async fn refresh_forecast(
        &self,
        obligations: &[Obligation],
        now: NaiveDate,
    ) -> Result<Vec<ForecastMonth>, StoreError> {
        let forecast = self.compute_forecast(obligations, now).await;
        self.stats.merge_forecast(&forecast).await?;
        Ok(forecast)
    }
}
