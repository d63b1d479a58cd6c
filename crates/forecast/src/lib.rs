//! `subtrack-forecast` — cycle projection and the monthly forecast engine.
//!
//! Pure domain logic only: no IO, no suspension. The caller preloads one
//! rate snapshot and hands it in; everything here is O(N) CPU work over the
//! obligation set.

pub mod cycle;
pub mod engine;

pub use cycle::{month_window, occurs_in_current_month, occurs_in_window};
pub use engine::{FORECAST_HORIZON_MONTHS, ForecastMonth, compute_forecast};
