//! `subtrack-audit` — structural diff of entity snapshots for the activity log.
//!
//! Independent of the forecasting path; invoked best-effort whenever an
//! entity mutation is recorded, so nothing here returns an error.

pub mod detect;
pub mod schema;

pub use detect::{ChangeRecord, detect_changes, summarize};
pub use schema::{EntityKind, TrackedField, ValueType};
