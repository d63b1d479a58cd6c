//! `subtrack-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, money, billing cycles and the recurring-obligation model.

pub mod error;
pub mod id;
pub mod money;
pub mod obligation;

pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, CustomerId, ObligationId};
pub use money::{CurrencyCode, Money};
pub use obligation::{BillingCycle, Category, Obligation, ObligationKind, add_months};
