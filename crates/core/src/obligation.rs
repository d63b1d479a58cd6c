//! Recurring obligations: sales (income) and service costs (expense).

use core::fmt;
use core::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::id::{CategoryId, CustomerId, ObligationId};
use crate::money::Money;

/// Billing cycle of a recurring obligation.
///
/// The set is closed: billing always happens on calendar-month multiples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Monthly,
    Quarterly,
    Semiannual,
    Annual,
}

impl BillingCycle {
    pub const ALL: [BillingCycle; 4] = [
        BillingCycle::Monthly,
        BillingCycle::Quarterly,
        BillingCycle::Semiannual,
        BillingCycle::Annual,
    ];

    /// Cycle length in calendar months.
    pub fn months(self) -> u32 {
        match self {
            BillingCycle::Monthly => 1,
            BillingCycle::Quarterly => 3,
            BillingCycle::Semiannual => 6,
            BillingCycle::Annual => 12,
        }
    }

    /// The next due date after `from`, one cycle later.
    pub fn advance(self, from: NaiveDate) -> NaiveDate {
        add_months(from, self.months())
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Quarterly => "quarterly",
            BillingCycle::Semiannual => "semiannual",
            BillingCycle::Annual => "annual",
        };
        f.write_str(name)
    }
}

impl FromStr for BillingCycle {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(BillingCycle::Monthly),
            "quarterly" => Ok(BillingCycle::Quarterly),
            "semiannual" => Ok(BillingCycle::Semiannual),
            "annual" => Ok(BillingCycle::Annual),
            other => Err(DomainError::validation(format!(
                "unknown billing cycle '{other}'"
            ))),
        }
    }
}

/// Calendar-month addition, clamping the day-of-month to the target month's
/// length (Jan 31 + 1 month = Feb 28/29).
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let total = date.year() * 12 + date.month0() as i32 + months as i32;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    let day = date.day();

    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_else(|| {
        (28..day)
            .rev()
            .find_map(|d| NaiveDate::from_ymd_opt(year, month, d))
            .unwrap_or(date)
    })
}

/// Direction of the money flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObligationKind {
    Income,
    Expense,
}

/// A recurring sale (income) or service cost (expense).
///
/// This is the authoritative record the forecast is computed from; the
/// denormalized aggregates derived from it live elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obligation {
    pub id: ObligationId,
    pub kind: ObligationKind,
    pub amount: Money,
    pub cycle: BillingCycle,
    pub due_date: NaiveDate,
    pub active: bool,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Obligation {
    /// Whether this record participates in forecasting.
    ///
    /// Inactive records and non-positive amounts are skipped per record; they
    /// never abort a forecast run.
    pub fn is_forecastable(&self) -> bool {
        self.active && self.amount.is_positive()
    }

    /// Advance the due date by one billing cycle (renewal).
    pub fn renew(&mut self) {
        self.due_date = self.cycle.advance(self.due_date);
    }
}

/// Income/expense grouping for breakdown views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::CurrencyCode;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn cycle_lengths_match_the_closed_set() {
        let lengths: Vec<u32> = BillingCycle::ALL.iter().map(|c| c.months()).collect();
        assert_eq!(lengths, vec![1, 3, 6, 12]);
    }

    #[test]
    fn add_months_clamps_to_month_end() {
        assert_eq!(add_months(date(2024, 1, 31), 1), date(2024, 2, 29));
        assert_eq!(add_months(date(2023, 1, 31), 1), date(2023, 2, 28));
        assert_eq!(add_months(date(2024, 3, 31), 1), date(2024, 4, 30));
    }

    #[test]
    fn add_months_crosses_year_boundaries() {
        assert_eq!(add_months(date(2024, 11, 15), 3), date(2025, 2, 15));
        assert_eq!(add_months(date(2024, 6, 5), 12), date(2025, 6, 5));
    }

    #[test]
    fn renew_advances_due_date_by_one_cycle() {
        let mut obligation = Obligation {
            id: ObligationId::new(),
            kind: ObligationKind::Expense,
            amount: Money::from_major(30, CurrencyCode::new("EUR")),
            cycle: BillingCycle::Quarterly,
            due_date: date(2024, 5, 1),
            active: true,
            category_id: None,
            customer_id: None,
            description: None,
        };

        obligation.renew();
        assert_eq!(obligation.due_date, date(2024, 8, 1));
    }

    #[test]
    fn inactive_or_non_positive_records_are_not_forecastable() {
        let mut obligation = Obligation {
            id: ObligationId::new(),
            kind: ObligationKind::Income,
            amount: Money::from_major(10, CurrencyCode::usd()),
            cycle: BillingCycle::Monthly,
            due_date: date(2024, 6, 5),
            active: true,
            category_id: None,
            customer_id: None,
            description: None,
        };
        assert!(obligation.is_forecastable());

        obligation.active = false;
        assert!(!obligation.is_forecastable());

        obligation.active = true;
        obligation.amount.minor_units = 0;
        assert!(!obligation.is_forecastable());
    }

    #[test]
    fn billing_cycle_parses_its_display_form() {
        for cycle in BillingCycle::ALL {
            assert_eq!(cycle.to_string().parse::<BillingCycle>().unwrap(), cycle);
        }
        assert!("weekly".parse::<BillingCycle>().is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: adding months never panics and lands in the expected
        /// calendar month, with the day clamped but never past the original.
        #[test]
        fn add_months_lands_in_expected_month(
            year in 2000i32..2100,
            month in 1u32..=12,
            day in 1u32..=31,
            step in 1u32..=24,
        ) {
            let Some(start) = NaiveDate::from_ymd_opt(year, month, day) else {
                return Ok(());
            };

            let result = add_months(start, step);
            let expected = (year * 12 + (month - 1) as i32 + step as i32) as u32;
            let actual = result.year() as u32 * 12 + result.month0();
            prop_assert_eq!(actual, expected);
            prop_assert!(result.day() <= start.day());
        }
    }
}
