//! Monthly income/expense/profit projection over a fixed horizon.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use subtrack_core::{Obligation, ObligationKind, add_months};
use subtrack_fx::RateSnapshot;

use crate::cycle::{month_window, occurs_in_current_month, occurs_in_window};

/// Forecast horizon in calendar months, starting at the current month.
pub const FORECAST_HORIZON_MONTHS: u32 = 4;

/// Projected totals for one calendar month, in USD minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastMonth {
    /// Sortable key, `"2024-06"`.
    pub month_key: String,
    /// Display label, `"June 2024"`.
    pub month_label: String,
    pub income_usd: i64,
    pub expense_usd: i64,
    pub profit_usd: i64,
}

/// Project obligations over the next [`FORECAST_HORIZON_MONTHS`] calendar
/// months, starting at `now`'s month.
///
/// Pure given its inputs: the caller preloads one rate snapshot and every
/// amount in the run converts against it. Records that are inactive or carry
/// a non-positive amount are skipped silently, per record. The first month
/// applies the catch-up rule for overdue obligations; later months use the
/// plain window projection.
pub fn compute_forecast(
    obligations: &[Obligation],
    now: NaiveDate,
    rates: &RateSnapshot,
) -> Vec<ForecastMonth> {
    let anchor = now.with_day(1).unwrap_or(now);
    let mut months = Vec::with_capacity(FORECAST_HORIZON_MONTHS as usize);

    for index in 0..FORECAST_HORIZON_MONTHS {
        let month_first = add_months(anchor, index);
        let Some((month_start, month_end)) = month_window(month_first.year(), month_first.month())
        else {
            continue;
        };

        let mut income_usd = 0i64;
        let mut expense_usd = 0i64;

        for obligation in obligations {
            if !obligation.is_forecastable() {
                continue;
            }

            let occurrence = if index == 0 {
                occurs_in_current_month(obligation.due_date, obligation.cycle, month_start, month_end)
            } else {
                occurs_in_window(obligation.due_date, obligation.cycle, month_start, month_end)
            };
            if occurrence.is_none() {
                continue;
            }

            let usd = rates.convert_to_usd(&obligation.amount);
            match obligation.kind {
                ObligationKind::Income => income_usd += usd,
                ObligationKind::Expense => expense_usd += usd,
            }
        }

        months.push(ForecastMonth {
            month_key: month_start.format("%Y-%m").to_string(),
            month_label: month_start.format("%B %Y").to_string(),
            income_usd,
            expense_usd,
            profit_usd: income_usd - expense_usd,
        });
    }

    months
}
