//! Year-to-date comparison against the same elapsed months of last year.
//!
//! In March only January to March of both years are compared, never the
//! full prior year. Months missing from the series are not fabricated: a
//! ledger that starts mid-way through last year yields an understated
//! prior-year total. [`YtdTotals::months_present`] lets callers detect that.

use std::collections::HashSet;

use chrono::{Datelike as _, NaiveDate};
use serde::Serialize;

use crate::calendar;
use crate::compare::percent_change;
use crate::models::Granularity;
use crate::trends::PeriodBucket;

/// Sums for the elapsed months of one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YtdTotals {
    /// Calendar year.
    pub year: i32,
    /// How many of the elapsed months were present in the series.
    pub months_present: u32,
    /// Income total.
    pub income: f64,
    /// Expense total.
    pub expenses: f64,
    /// `income - expenses`.
    pub balance: f64,
}

impl YtdTotals {
    /// Empty totals for `year`.
    const fn empty(year: i32) -> Self {
        Self {
            year,
            months_present: 0,
            income: 0.0,
            expenses: 0.0,
            balance: 0.0,
        }
    }

    /// Adds one monthly bucket.
    fn add(&mut self, bucket: &PeriodBucket) {
        self.months_present += 1;
        self.income += bucket.income;
        self.expenses += bucket.expenses;
        self.balance = self.income - self.expenses;
    }
}

/// Current year-to-date versus the same months of the previous year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YtdComparison {
    /// Months elapsed in the current year, counting the current month.
    pub months_elapsed: u32,
    /// Current-year totals.
    pub current: YtdTotals,
    /// Previous-year totals over the same months.
    pub previous: YtdTotals,
    /// Income change in percent.
    pub income_pct: Option<f64>,
    /// Expense change in percent.
    pub expenses_pct: Option<f64>,
    /// Balance change in percent.
    pub balance_pct: Option<f64>,
}

/// Compares the first `today.month()` months of this year with the same
/// months of last year.
///
/// `monthly` is a series of month buckets (`YYYY-MM` keys); buckets with
/// other keys are skipped, and a repeated month counts only once. Returns
/// `None` when either year has no month inside the elapsed window.
#[must_use]
pub fn compare_year_to_date(monthly: &[PeriodBucket], today: NaiveDate) -> Option<YtdComparison> {
    let months_elapsed = today.month();
    let current_year = today.year();
    let previous_year = current_year.checked_sub(1)?;

    let mut current = YtdTotals::empty(current_year);
    let mut previous = YtdTotals::empty(previous_year);
    let mut seen = HashSet::new();
    for bucket in monthly {
        let Some(start) = calendar::parse_period_key(&bucket.period_key, Granularity::Month) else {
            continue;
        };
        if start.month() > months_elapsed || !seen.insert(start) {
            continue;
        }
        if start.year() == current_year {
            current.add(bucket);
        } else if start.year() == previous_year {
            previous.add(bucket);
        }
    }

    if current.months_present == 0 || previous.months_present == 0 {
        return None;
    }

    Some(YtdComparison {
        months_elapsed,
        income_pct: percent_change(current.income, previous.income),
        expenses_pct: percent_change(current.expenses, previous.expenses),
        balance_pct: percent_change(current.balance, previous.balance),
        current,
        previous,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(key: &str, income: f64, expenses: f64) -> PeriodBucket {
        PeriodBucket::new(key.to_owned(), income, expenses)
    }

    fn two_full_years() -> Vec<PeriodBucket> {
        let mut series = Vec::new();
        for m in 1..=12 {
            series.push(month(&format!("2023-{m:02}"), 100.0, 50.0));
        }
        for m in 1..=12 {
            series.push(month(&format!("2024-{m:02}"), 200.0, 25.0));
        }
        series
    }

    #[test]
    fn march_compares_only_first_quarter() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let cmp = compare_year_to_date(&two_full_years(), today).unwrap();

        assert_eq!(cmp.months_elapsed, 3);
        assert_eq!(cmp.current.months_present, 3);
        assert_eq!(cmp.previous.months_present, 3);
        assert!((cmp.current.income - 600.0).abs() < f64::EPSILON);
        assert!((cmp.previous.income - 300.0).abs() < f64::EPSILON);
        assert!((cmp.previous.expenses - 150.0).abs() < f64::EPSILON);
        assert_eq!(cmp.income_pct, Some(100.0));
        assert_eq!(cmp.expenses_pct, Some(-50.0));
    }

    #[test]
    fn partial_prior_year_is_summed_as_is() {
        let series = vec![
            month("2023-03", 100.0, 0.0),
            month("2024-01", 100.0, 0.0),
            month("2024-02", 100.0, 0.0),
            month("2024-03", 100.0, 0.0),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let cmp = compare_year_to_date(&series, today).unwrap();
        assert_eq!(cmp.previous.months_present, 1);
        assert_eq!(cmp.income_pct, Some(200.0));
        assert!(cmp.expenses_pct.is_none());
    }

    #[test]
    fn missing_prior_year_is_unavailable() {
        let series = vec![month("2024-01", 10.0, 5.0)];
        let today = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
        assert!(compare_year_to_date(&series, today).is_none());
        assert!(compare_year_to_date(&[], today).is_none());
    }

    #[test]
    fn non_month_keys_are_skipped() {
        let mut series = two_full_years();
        series.push(month("2024", 1_000_000.0, 0.0));
        series.push(month("2024-01-15", 1_000_000.0, 0.0));
        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let cmp = compare_year_to_date(&series, today).unwrap();
        assert!((cmp.current.income - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn repeated_month_counts_once() {
        let series = vec![
            month("2023-01", 100.0, 0.0),
            month("2023-01", 100.0, 0.0),
            month("2024-01", 150.0, 0.0),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let cmp = compare_year_to_date(&series, today).unwrap();
        assert_eq!(cmp.previous.months_present, 1);
        assert!((cmp.previous.income - 100.0).abs() < f64::EPSILON);
        assert_eq!(cmp.income_pct, Some(50.0));
    }
}
