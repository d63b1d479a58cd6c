//! `subtrack-stats` — the denormalized aggregate-stats document.
//!
//! Sits between the authoritative obligation records and the dashboards: a
//! read-optimized cache rebuilt on demand, never a source of truth. Reads may
//! be stale between a mutation and the next rebuild; callers needing fresh
//! numbers call [`StatsStore::rebuild`] explicitly.

pub mod model;
pub mod stats_store;
pub mod store;

pub use model::{AggregateStats, CategoryBreakdown, MonthBreakdown};
pub use stats_store::{COLLECTION_CATEGORIES, COLLECTION_OBLIGATIONS, COLLECTION_STATS, StatsStore};
pub use store::{DocumentStore, InMemoryDocumentStore, StoreError, UpdateFn};
