//! Cycle projection: does an obligation recur inside a calendar window?

use chrono::{Datelike, NaiveDate};

use subtrack_core::{BillingCycle, add_months};

/// Inclusive first/last day of a calendar month.
pub fn month_window(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = add_months(start, 1).pred_opt()?;
    Some((start, end))
}

/// Whole calendar months from `from` to `to`, clamped at zero.
fn months_until(from: NaiveDate, to: NaiveDate) -> u32 {
    let diff = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    diff.max(0) as u32
}

/// First recurrence of `due` that lands inside `[window_start, window_end]`
/// (inclusive), if any.
///
/// A due date past the window end can never recur into it. Otherwise the due
/// date is advanced cycle by cycle until it is no longer before the window
/// start; the step count is bounded by `months_until / cycle + 1`, so the
/// loop always terminates.
pub fn occurs_in_window(
    due: NaiveDate,
    cycle: BillingCycle,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Option<NaiveDate> {
    if due > window_end {
        return None;
    }

    let step = cycle.months();
    let max_steps = months_until(due, window_start) / step + 1;

    let mut occurrence = due;
    let mut steps = 0;
    while occurrence < window_start && steps <= max_steps {
        occurrence = add_months(occurrence, step);
        steps += 1;
    }

    (occurrence >= window_start && occurrence <= window_end).then_some(occurrence)
}

/// Current-month projection with the catch-up rule.
///
/// An obligation already overdue at the month start is treated as due in the
/// current month exactly once instead of being advanced forward; lapsed
/// records are not silently pushed to a future month. Applies only to the
/// first month of the horizon — later months use [`occurs_in_window`].
pub fn occurs_in_current_month(
    due: NaiveDate,
    cycle: BillingCycle,
    month_start: NaiveDate,
    month_end: NaiveDate,
) -> Option<NaiveDate> {
    if due < month_start {
        return Some(due);
    }
    occurs_in_window(due, cycle, month_start, month_end)
}
