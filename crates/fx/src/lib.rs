//! `subtrack-fx` — currency conversion against a TTL-bound rate snapshot.
//!
//! The split is deliberate: one suspending preload (`RateCache::ensure_rates_loaded`)
//! followed by any number of pure, non-suspending conversions against the
//! returned [`RateSnapshot`]. Projecting dozens of obligations costs one rate
//! load, not dozens of suspend points.

pub mod cache;
pub mod clock;
pub mod provider;
pub mod snapshot;

pub use cache::{RateCache, RateCacheConfig};
pub use clock::{Clock, ManualClock, SystemClock};
pub use provider::{RateError, RateProvider};
pub use snapshot::RateSnapshot;
