//! Period keys and calendar arithmetic.
//!
//! Every bucketed series is keyed by a canonical string derived from a
//! calendar date:
//!
//! | Granularity | Key format | Example |
//! |---|---|---|
//! | day | `YYYY-MM-DD` | `2024-03-05` |
//! | week | ISO `YYYY-WW` | `2020-53` |
//! | month | `YYYY-MM` | `2024-03` |
//! | year | `YYYY` | `2024` |
//!
//! Week keys use the ISO week-numbering year, so the first days of January
//! can belong to the previous year's last week and the last days of
//! December to the next year's first week.

use chrono::{Datelike as _, Days, Months, NaiveDate, TimeDelta};
use serde::Serialize;

use crate::error::{AnalyticsError, Result};
use crate::models::Granularity;

/// Days in one ISO week.
const DAYS_PER_WEEK: i64 = 7;

/// Months in one calendar year.
const MONTHS_PER_YEAR: i64 = 12;

/// One calendar period of a given granularity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    /// Canonical period key.
    pub key: String,
    /// First day of the period.
    pub start: NaiveDate,
    /// Last day of the period (inclusive).
    pub end: NaiveDate,
}

/// Monday-to-Sunday date range of an ISO week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekRange {
    /// Monday.
    pub start: NaiveDate,
    /// The following Sunday.
    pub end: NaiveDate,
}

impl WeekRange {
    /// Returns `true` if `date` falls inside the week.
    #[inline]
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Returns the canonical period key of `date` for the given granularity.
#[inline]
#[must_use]
pub fn period_key(date: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Day => date.format("%Y-%m-%d").to_string(),
        Granularity::Week => {
            let iso = date.iso_week();
            format!("{:04}-{:02}", iso.year(), iso.week())
        }
        Granularity::Month => format!("{:04}-{:02}", date.year(), date.month()),
        Granularity::Year => format!("{:04}", date.year()),
    }
}

/// Returns the Monday and Sunday of ISO week `week` in `iso_year`.
///
/// January 4th always lies in week 1, so the week's Monday is found by
/// stepping back from that anchor to its Monday and then forward whole
/// weeks. Returns `None` for week 0, for a week number the ISO year does
/// not have, or when the dates fall outside the supported range.
#[must_use]
pub fn iso_week_range(iso_year: i32, week: u32) -> Option<WeekRange> {
    if week == 0 || week > weeks_in_iso_year(iso_year)? {
        return None;
    }
    let anchor = NaiveDate::from_ymd_opt(iso_year, 1, 4)?;
    let anchor_dow = i64::from(anchor.weekday().number_from_monday());
    let offset = (i64::from(week) - 1)
        .checked_mul(DAYS_PER_WEEK)?
        .checked_sub(anchor_dow - 1)?;
    let start = anchor.checked_add_signed(TimeDelta::try_days(offset)?)?;
    let end = start.checked_add_days(Days::new(6))?;
    Some(WeekRange { start, end })
}

/// Number of ISO weeks (52 or 53) in `iso_year`.
///
/// December 28th always falls in the year's last ISO week.
#[inline]
#[must_use]
pub fn weeks_in_iso_year(iso_year: i32) -> Option<u32> {
    NaiveDate::from_ymd_opt(iso_year, 12, 28).map(|date| date.iso_week().week())
}

/// Returns the first day of the period containing `date`.
#[must_use]
pub fn period_start(date: NaiveDate, granularity: Granularity) -> Option<NaiveDate> {
    match granularity {
        Granularity::Day => Some(date),
        Granularity::Week => {
            let back = u64::from(date.weekday().num_days_from_monday());
            date.checked_sub_days(Days::new(back))
        }
        Granularity::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1),
        Granularity::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
    }
}

/// Moves a period start `delta` whole periods forward (or backward when
/// negative).
#[must_use]
pub fn shift_period(start: NaiveDate, granularity: Granularity, delta: i64) -> Option<NaiveDate> {
    match granularity {
        Granularity::Day => start.checked_add_signed(TimeDelta::try_days(delta)?),
        Granularity::Week => {
            start.checked_add_signed(TimeDelta::try_days(delta.checked_mul(DAYS_PER_WEEK)?)?)
        }
        Granularity::Month => shift_months(start, delta),
        Granularity::Year => shift_months(start, delta.checked_mul(MONTHS_PER_YEAR)?),
    }
}

/// Adds a signed number of months.
fn shift_months(start: NaiveDate, delta: i64) -> Option<NaiveDate> {
    let months = Months::new(u32::try_from(delta.unsigned_abs()).ok()?);
    if delta >= 0 {
        start.checked_add_months(months)
    } else {
        start.checked_sub_months(months)
    }
}

/// Parses a period key back into the first day of its period.
///
/// The key format is ambiguous between week and month (`2024-05`), so the
/// granularity must be supplied.
#[must_use]
pub fn parse_period_key(key: &str, granularity: Granularity) -> Option<NaiveDate> {
    match granularity {
        Granularity::Day => NaiveDate::parse_from_str(key, "%Y-%m-%d").ok(),
        Granularity::Week => {
            let (year, week) = key.split_once('-')?;
            iso_week_range(year.parse().ok()?, week.parse().ok()?).map(|range| range.start)
        }
        Granularity::Month => {
            let (year, month) = key.split_once('-')?;
            NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
        }
        Granularity::Year => NaiveDate::from_ymd_opt(key.parse().ok()?, 1, 1),
    }
}

/// Returns the `count` consecutive periods ending with the one that
/// contains `today`, oldest first.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidArgument`] if the span leaves the
/// supported date range.
pub fn trailing_periods(
    today: NaiveDate,
    granularity: Granularity,
    count: u32,
) -> Result<Vec<Period>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let current = period_start(today, granularity).ok_or_else(|| out_of_range(today))?;
    let first = shift_period(current, granularity, -(i64::from(count) - 1))
        .ok_or_else(|| out_of_range(today))?;
    let mut periods = Vec::with_capacity(usize::try_from(count).unwrap_or_default());
    let mut start = first;
    for _ in 0..count {
        let (period, next) = period_at(start, granularity)?;
        periods.push(period);
        start = next;
    }
    Ok(periods)
}

/// Returns every period overlapping the inclusive range `[from, to]`,
/// oldest first. An inverted range yields no periods.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidArgument`] if the span leaves the
/// supported date range.
pub fn periods_between(
    from: NaiveDate,
    to: NaiveDate,
    granularity: Granularity,
) -> Result<Vec<Period>> {
    let mut periods = Vec::new();
    if from > to {
        return Ok(periods);
    }
    let mut start = period_start(from, granularity).ok_or_else(|| out_of_range(from))?;
    while start <= to {
        let (period, next) = period_at(start, granularity)?;
        periods.push(period);
        start = next;
    }
    Ok(periods)
}

/// Builds the period starting at `start` and returns it with the next
/// period's start.
fn period_at(start: NaiveDate, granularity: Granularity) -> Result<(Period, NaiveDate)> {
    let next = shift_period(start, granularity, 1).ok_or_else(|| out_of_range(start))?;
    let end = next
        .checked_sub_days(Days::new(1))
        .ok_or_else(|| out_of_range(next))?;
    let period = Period {
        key: period_key(start, granularity),
        start,
        end,
    };
    Ok((period, next))
}

/// Error for spans that run past chrono's representable dates.
fn out_of_range(date: NaiveDate) -> AnalyticsError {
    AnalyticsError::InvalidArgument(format!("period span around {date} is out of range"))
}
