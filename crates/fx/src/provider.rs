//! External exchange-rate source.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use subtrack_core::CurrencyCode;

/// Rate-provider failure.
///
/// These are always catchable by the cache; they must never surface to
/// dashboard code as a hard failure.
#[derive(Debug, Error)]
pub enum RateError {
    #[error("rate provider unreachable: {0}")]
    Unreachable(String),

    #[error("rate provider returned a malformed payload: {0}")]
    Malformed(String),

    #[error("rate fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// Fetches the currency → USD rate table from an external source.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Rates expressed as USD per unit of the keyed currency.
    async fn fetch_rates(
        &self,
        base: &CurrencyCode,
    ) -> Result<HashMap<CurrencyCode, f64>, RateError>;
}

#[async_trait]
impl<P> RateProvider for std::sync::Arc<P>
where
    P: RateProvider + ?Sized,
{
    async fn fetch_rates(
        &self,
        base: &CurrencyCode,
    ) -> Result<HashMap<CurrencyCode, f64>, RateError> {
        (**self).fetch_rates(base).await
    }
}
