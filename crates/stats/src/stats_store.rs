//! Aggregate stats: rebuild, partial merge and cached reads.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use subtrack_core::{Category, CategoryId, Obligation, ObligationKind};
use subtrack_forecast::{ForecastMonth, compute_forecast};
use subtrack_fx::{Clock, RateCache, RateProvider, RateSnapshot};

use crate::model::{AggregateStats, CategoryBreakdown, MonthBreakdown};
use crate::store::{DocumentStore, StoreError};

pub const COLLECTION_OBLIGATIONS: &str = "obligations";
pub const COLLECTION_CATEGORIES: &str = "categories";
pub const COLLECTION_STATS: &str = "stats";

/// The stats collection holds a single denormalized document.
const STATS_DOC_ID: &str = "aggregate";

/// Maintains the [`AggregateStats`] document over a backing document store.
///
/// Eventually consistent by design: between a record mutation and the next
/// `rebuild`/`merge_forecast`, `get_stats` may serve stale aggregates.
/// Rebuilds are idempotent for a fixed input set, so concurrent rebuilds
/// converge; last-writer-wins through the store's transactional primitive.
pub struct StatsStore<S, P, C> {
    store: S,
    rates: Arc<RateCache<P, C>>,
    clock: C,
}

impl<S, P, C> StatsStore<S, P, C>
where
    S: DocumentStore,
    P: RateProvider,
    C: Clock,
{
    pub fn new(store: S, rates: Arc<RateCache<P, C>>, clock: C) -> Self {
        Self {
            store,
            rates,
            clock,
        }
    }

    /// The persisted summary, or a fresh rebuild when none exists yet.
    pub async fn get_stats(&self) -> Result<AggregateStats, StoreError> {
        if let Some(document) = self
            .store
            .get_by_id(COLLECTION_STATS, STATS_DOC_ID)
            .await?
        {
            match serde_json::from_value::<AggregateStats>(document) {
                Ok(stats) => return Ok(stats),
                Err(err) => {
                    tracing::warn!(%err, "stored aggregate stats unreadable, rebuilding");
                }
            }
        }
        self.rebuild().await
    }

    /// Recompute the whole document from the authoritative records.
    ///
    /// One rate load for the entire run, then pure aggregation; the write
    /// goes through the store's transactional primitive. A failure here is
    /// surfaced as this one attempt's failure — retry policy belongs to the
    /// caller.
    pub async fn rebuild(&self) -> Result<AggregateStats, StoreError> {
        let obligations = self.load_active_obligations().await?;
        let categories = self.load_categories().await?;
        let snapshot = self.rates.ensure_rates_loaded().await;
        let now = self.clock.now();

        let stats = build_stats(&obligations, &categories, now, &snapshot);

        let document = serde_json::to_value(&stats).map_err(|err| StoreError::Encode {
            collection: COLLECTION_STATS.to_string(),
            message: err.to_string(),
        })?;
        self.store
            .transactional_update(COLLECTION_STATS, STATS_DOC_ID, Box::new(move |_| document))
            .await?;

        tracing::debug!(
            obligations = obligations.len(),
            "aggregate stats rebuilt"
        );
        Ok(stats)
    }

    /// Patch only the `forecast` field of the persisted document.
    ///
    /// Used when the forecast was recomputed more cheaply than a full
    /// rebuild; every other aggregate field is left untouched.
    pub async fn merge_forecast(&self, forecast: &[ForecastMonth]) -> Result<(), StoreError> {
        let forecast_value =
            serde_json::to_value(forecast).map_err(|err| StoreError::Encode {
                collection: COLLECTION_STATS.to_string(),
                message: err.to_string(),
            })?;

        self.store
            .transactional_update(
                COLLECTION_STATS,
                STATS_DOC_ID,
                Box::new(move |current| {
                    // A missing or corrupt (non-object) document is replaced
                    // outright; the patch must never be dropped silently.
                    let mut fields = match current {
                        Some(JsonValue::Object(fields)) => fields,
                        _ => serde_json::Map::new(),
                    };
                    fields.insert("forecast".to_string(), forecast_value);
                    JsonValue::Object(fields)
                }),
            )
            .await?;
        Ok(())
    }

    async fn load_active_obligations(&self) -> Result<Vec<Obligation>, StoreError> {
        let filter = serde_json::json!({ "active": true });
        let documents = self.store.query(COLLECTION_OBLIGATIONS, &filter).await?;

        let mut obligations = Vec::with_capacity(documents.len());
        for document in documents {
            match serde_json::from_value::<Obligation>(document) {
                Ok(obligation) => obligations.push(obligation),
                // A record missing its due date or cycle is excluded from
                // the aggregates; it never aborts the rebuild.
                Err(err) => tracing::warn!(%err, "skipping malformed obligation document"),
            }
        }
        Ok(obligations)
    }

    async fn load_categories(&self) -> Result<Vec<Category>, StoreError> {
        let documents = self.store.get_all(COLLECTION_CATEGORIES).await?;
        let mut categories = Vec::with_capacity(documents.len());
        for document in documents {
            match serde_json::from_value::<Category>(document) {
                Ok(category) => categories.push(category),
                Err(err) => tracing::warn!(%err, "skipping malformed category document"),
            }
        }
        Ok(categories)
    }
}

/// Pure aggregation step: totals, breakdowns and the 4-month forecast from
/// one obligation set and one rate snapshot.
fn build_stats(
    obligations: &[Obligation],
    categories: &[Category],
    now: DateTime<Utc>,
    rates: &RateSnapshot,
) -> AggregateStats {
    let forecast = compute_forecast(obligations, now.date_naive(), rates);

    let mut total_income_usd = 0i64;
    let mut total_expense_usd = 0i64;
    let mut income_per_category: BTreeMap<CategoryId, i64> = BTreeMap::new();

    for obligation in obligations {
        if !obligation.is_forecastable() {
            continue;
        }
        let usd = rates.convert_to_usd(&obligation.amount);
        match obligation.kind {
            ObligationKind::Income => {
                total_income_usd += usd;
                if let Some(category_id) = obligation.category_id {
                    *income_per_category.entry(category_id).or_insert(0) += usd;
                }
            }
            ObligationKind::Expense => total_expense_usd += usd,
        }
    }

    let income_by_month = forecast
        .iter()
        .map(|month| MonthBreakdown {
            month_key: month.month_key.clone(),
            amount_usd: month.income_usd,
        })
        .collect();

    let income_by_category = income_per_category
        .into_iter()
        .map(|(category_id, amount_usd)| CategoryBreakdown {
            category_id,
            name: categories
                .iter()
                .find(|c| c.id == category_id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| category_id.to_string()),
            amount_usd,
        })
        .collect();

    AggregateStats {
        total_income_usd,
        total_expense_usd,
        income_by_month,
        income_by_category,
        forecast,
        last_rebuilt_at: now,
    }
}
