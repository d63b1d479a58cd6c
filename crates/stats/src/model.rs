//! The denormalized aggregate-stats document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use subtrack_core::CategoryId;
use subtrack_forecast::ForecastMonth;

/// One month's slice of a breakdown, USD minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthBreakdown {
    pub month_key: String,
    pub amount_usd: i64,
}

/// One category's slice of a breakdown, USD minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category_id: CategoryId,
    pub name: String,
    pub amount_usd: i64,
}

/// Read-optimized summary kept so dashboards never rescan the full record
/// set. A pure function of the active obligations and one rate snapshot:
/// `rebuild` reproduces it in full at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_income_usd: i64,
    pub total_expense_usd: i64,
    pub income_by_month: Vec<MonthBreakdown>,
    pub income_by_category: Vec<CategoryBreakdown>,
    /// Always exactly four consecutive entries starting at the current month.
    pub forecast: Vec<ForecastMonth>,
    pub last_rebuilt_at: DateTime<Utc>,
}
