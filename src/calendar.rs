//! Calendar arithmetic matching SQL `DATEDIFF` part boundaries
//!
//! Differences count crossed month/year boundaries, not elapsed days:
//! 2020-01-31 → 2020-02-01 is one month.

use chrono::{Datelike, NaiveDate};

pub fn months_between(start: NaiveDate, end: NaiveDate) -> i64 {
    let years = i64::from(end.year()) - i64::from(start.year());
    years * 12 + i64::from(end.month()) - i64::from(start.month())
}

pub fn years_between(start: NaiveDate, end: NaiveDate) -> i64 {
    i64::from(end.year()) - i64::from(start.year())
}

/// First day of the date's month
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
