//! Calendar-month helpers shared by the simulator, distributor, and plan tracker.

use chrono::{Datelike, Months, NaiveDate};

/// First day of the month containing `date`.
#[must_use]
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the month `offset` months after the month containing `date`.
#[must_use]
pub fn month_start(date: NaiveDate, offset: u32) -> Option<NaiveDate> {
    first_of_month(date).checked_add_months(Months::new(offset))
}

/// First and last day of the month containing `date`.
#[must_use]
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = first_of_month(date);
    let last = month_start(first, 1)
        .and_then(|next| next.pred_opt())
        .unwrap_or(first);
    (first, last)
}

/// Whether two dates fall in the same calendar month.
#[must_use]
pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}
