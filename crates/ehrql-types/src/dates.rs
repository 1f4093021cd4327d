//! Calendar arithmetic on dates
//!
//! These rules are the reference for every backend:
//!
//! - differences count whole elapsed units, so `years_between` is an age and
//!   is negative as soon as `end` precedes `start` by a single day;
//! - a 29 February anniversary falls on 1 March in non-leap years;
//! - adding months or years yields the smallest date whose difference from
//!   the start equals the amount added, so a non-existent day (31 April,
//!   30 February) rolls **forward** to the 1st of the following month.
//!
//! Results outside years 1..=9999 are `None`.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Earliest supported year
pub const MIN_YEAR: i32 = 1;
/// Latest supported year
pub const MAX_YEAR: i32 = 9999;

/// Whole calendar years elapsed from `start` to `end`
pub fn years_between(end: NaiveDate, start: NaiveDate) -> i64 {
    let mut years = i64::from(end.year() - start.year());
    if (end.month(), end.day()) < (start.month(), start.day()) {
        years -= 1;
    }
    years
}

/// Whole calendar months elapsed from `start` to `end`
pub fn months_between(end: NaiveDate, start: NaiveDate) -> i64 {
    let mut months = i64::from(end.year() - start.year()) * 12
        + i64::from(end.month())
        - i64::from(start.month());
    if end.day() < start.day() {
        months -= 1;
    }
    months
}

/// Exact number of days from `start` to `end`
pub fn days_between(end: NaiveDate, start: NaiveDate) -> i64 {
    end.signed_duration_since(start).num_days()
}

/// Add `years` calendar years, rolling 29 February forward to 1 March
pub fn add_years(date: NaiveDate, years: i64) -> Option<NaiveDate> {
    let year = i64::from(date.year()).checked_add(years)?;
    rolling_forward(year, date.month(), date.day())
}

/// Add `months` calendar months, rolling a missing day forward to the 1st of
/// the following month
pub fn add_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let zero_based = i64::from(date.year())
        .checked_mul(12)?
        .checked_add(i64::from(date.month0()))?
        .checked_add(months)?;
    let year = zero_based.div_euclid(12);
    let month = zero_based.rem_euclid(12) as u32 + 1;
    rolling_forward(year, month, date.day())
}

/// Add `days` days
pub fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let result = if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }?;
    in_range(result)
}

/// First day of the date's year
pub fn to_first_of_year(date: NaiveDate) -> NaiveDate {
    date.with_ordinal(1).unwrap_or(date)
}

/// First day of the date's month
pub fn to_first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Build `year-month-day`; if that day does not exist in the month, use the
/// 1st of the following month instead
fn rolling_forward(year: i64, month: u32, day: u32) -> Option<NaiveDate> {
    let year = i32::try_from(year).ok()?;
    let date = match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None if month == 12 => NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?,
        None => NaiveDate::from_ymd_opt(year, month + 1, 1)?,
    };
    in_range(date)
}

fn in_range(date: NaiveDate) -> Option<NaiveDate> {
    (MIN_YEAR..=MAX_YEAR).contains(&date.year()).then_some(date)
}

/// Unit of a calendar duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Days,
    Weeks,
    Months,
    Years,
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Days => write!(f, "days"),
            Self::Weeks => write!(f, "weeks"),
            Self::Months => write!(f, "months"),
            Self::Years => write!(f, "years"),
        }
    }
}

/// A whole number of calendar units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Duration {
    pub amount: i64,
    pub unit: DurationUnit,
}

impl Duration {
    /// Create a duration
    pub const fn new(amount: i64, unit: DurationUnit) -> Self {
        Self { amount, unit }
    }

    pub const fn days(amount: i64) -> Self {
        Self::new(amount, DurationUnit::Days)
    }

    pub const fn weeks(amount: i64) -> Self {
        Self::new(amount, DurationUnit::Weeks)
    }

    pub const fn months(amount: i64) -> Self {
        Self::new(amount, DurationUnit::Months)
    }

    pub const fn years(amount: i64) -> Self {
        Self::new(amount, DurationUnit::Years)
    }

    /// `date + self`
    pub fn add_to(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.shift(date, self.amount)
    }

    /// `date - self`
    pub fn subtract_from(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.shift(date, self.amount.checked_neg()?)
    }

    fn shift(&self, date: NaiveDate, amount: i64) -> Option<NaiveDate> {
        match self.unit {
            DurationUnit::Days => add_days(date, amount),
            DurationUnit::Weeks => add_days(date, amount.checked_mul(7)?),
            DurationUnit::Months => add_months(date, amount),
            DurationUnit::Years => add_years(date, amount),
        }
    }

    /// Whole `unit`s elapsed from `start` to `end`
    pub fn between(unit: DurationUnit, start: NaiveDate, end: NaiveDate) -> Self {
        let amount = match unit {
            DurationUnit::Days => days_between(end, start),
            DurationUnit::Weeks => days_between(end, start).div_euclid(7),
            DurationUnit::Months => months_between(end, start),
            DurationUnit::Years => years_between(end, start),
        };
        Self::new(amount, unit)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.unit)
    }
}
