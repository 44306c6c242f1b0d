//! Period bucketing of transactions into income/expense trend series.
//!
//! A trend series always covers its whole span: periods without any
//! transaction appear with zero sums, so downstream regression and window
//! comparison can rely on a fixed cadence and a known length.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::{self, Period};
use crate::error::Result;
use crate::models::{Granularity, Transaction, TransactionKind};

/// Aggregated income and expenses for one calendar period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodBucket {
    /// Canonical period key (see [`calendar::period_key`]).
    pub period_key: String,
    /// Sum of income transactions.
    pub income: f64,
    /// Sum of expense transactions.
    pub expenses: f64,
    /// `income - expenses`.
    pub balance: f64,
}

impl PeriodBucket {
    /// Creates a bucket from its sums, deriving the balance.
    #[inline]
    #[must_use]
    pub fn new(period_key: String, income: f64, expenses: f64) -> Self {
        Self {
            period_key,
            income,
            expenses,
            balance: income - expenses,
        }
    }

    /// Returns `true` if nothing was booked in the period.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.income == 0.0_f64 && self.expenses == 0.0_f64
    }
}

/// Which figure of a bucket to extract as a plain series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BucketMetric {
    /// [`PeriodBucket::income`].
    Income,
    /// [`PeriodBucket::expenses`].
    Expenses,
    /// [`PeriodBucket::balance`].
    Balance,
}

impl BucketMetric {
    /// Reads the metric from a bucket.
    #[inline]
    #[must_use]
    pub const fn of(self, bucket: &PeriodBucket) -> f64 {
        match self {
            Self::Income => bucket.income,
            Self::Expenses => bucket.expenses,
            Self::Balance => bucket.balance,
        }
    }
}

/// Running sums for one period key.
#[derive(Debug, Default, Clone, Copy)]
struct Sums {
    /// Income total.
    income: f64,
    /// Expense total.
    expenses: f64,
}

/// Buckets transactions into the given ordered periods.
///
/// Transfers count toward neither sum. Transactions whose period is not in
/// `periods` are ignored. The output has exactly one bucket per period, in
/// the same order.
#[must_use]
pub fn bucket_periods(
    transactions: &[Transaction],
    granularity: Granularity,
    periods: &[Period],
) -> Vec<PeriodBucket> {
    let mut sums: HashMap<String, Sums> = HashMap::with_capacity(periods.len());
    for tx in transactions {
        let key = calendar::period_key(tx.date(), granularity);
        let entry = sums.entry(key).or_default();
        match tx.kind {
            TransactionKind::Income => entry.income += tx.amount,
            TransactionKind::Expense => entry.expenses += tx.amount,
            TransactionKind::Transfer => {}
        }
    }

    periods
        .iter()
        .map(|period| {
            let found = sums.get(&period.key).copied().unwrap_or_default();
            PeriodBucket::new(period.key.clone(), found.income, found.expenses)
        })
        .collect()
}

/// Buckets transactions into the `count` periods ending with the one that
/// contains `today`.
///
/// # Errors
///
/// Returns an error if the span leaves the supported date range.
#[tracing::instrument(level = "debug", skip(transactions), fields(transactions = transactions.len()))]
pub fn bucket_trailing(
    transactions: &[Transaction],
    granularity: Granularity,
    count: u32,
    today: NaiveDate,
) -> Result<Vec<PeriodBucket>> {
    let periods = calendar::trailing_periods(today, granularity, count)?;
    Ok(bucket_periods(transactions, granularity, &periods))
}

/// Buckets transactions into every period overlapping `[from, to]`.
///
/// # Errors
///
/// Returns an error if the span leaves the supported date range.
#[tracing::instrument(level = "debug", skip(transactions), fields(transactions = transactions.len()))]
pub fn bucket_range(
    transactions: &[Transaction],
    granularity: Granularity,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<PeriodBucket>> {
    let periods = calendar::periods_between(from, to, granularity)?;
    Ok(bucket_periods(transactions, granularity, &periods))
}

/// Extracts one metric of each bucket as a plain series.
#[inline]
#[must_use]
pub fn metric_series(buckets: &[PeriodBucket], metric: BucketMetric) -> Vec<f64> {
    buckets.iter().map(|bucket| metric.of(bucket)).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{AccountId, CategoryId, DateTime, TransactionId, Utc};

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Builds a settled transaction at noon UTC on `on`.
    pub(crate) fn tx(
        id: &str,
        kind: TransactionKind,
        amount: f64,
        on: NaiveDate,
        category: Option<&str>,
    ) -> Transaction {
        let occurred_at: DateTime<Utc> = on.and_hms_opt(12, 0, 0).unwrap().and_utc();
        Transaction {
            id: TransactionId::from(id),
            account_id: AccountId::from("acc-main"),
            category_id: category.map(CategoryId::from),
            kind,
            amount,
            occurred_at,
            is_pending: false,
        }
    }

    #[test]
    fn trailing_returns_exactly_count_for_every_granularity() {
        let today = date(2024, 6, 15);
        for granularity in [
            Granularity::Day,
            Granularity::Week,
            Granularity::Month,
            Granularity::Year,
        ] {
            let buckets = bucket_trailing(&[], granularity, 7, today).unwrap();
            assert_eq!(buckets.len(), 7, "{granularity}");
            assert!(buckets.iter().all(PeriodBucket::is_empty));
            let keys: Vec<_> = buckets
                .iter()
                .map(|b| calendar::parse_period_key(&b.period_key, granularity).unwrap())
                .collect();
            assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }

    #[test]
    fn empty_months_are_zero_filled() {
        let transactions = vec![
            tx("t1", TransactionKind::Income, 1000.0, date(2024, 1, 5), None),
            tx("t2", TransactionKind::Expense, 200.0, date(2024, 1, 20), None),
            tx("t3", TransactionKind::Expense, 50.0, date(2024, 3, 2), None),
        ];
        let buckets =
            bucket_trailing(&transactions, Granularity::Month, 3, date(2024, 3, 31)).unwrap();

        assert_eq!(buckets.len(), 3);
        assert_eq!(
            buckets[0],
            PeriodBucket::new("2024-01".to_owned(), 1000.0, 200.0)
        );
        assert_eq!(buckets[1], PeriodBucket::new("2024-02".to_owned(), 0.0, 0.0));
        assert!((buckets[2].balance + 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn transfers_and_out_of_span_transactions_are_ignored() {
        let transactions = vec![
            tx("t1", TransactionKind::Transfer, 500.0, date(2024, 3, 3), None),
            tx("t2", TransactionKind::Expense, 10.0, date(2023, 1, 1), None),
        ];
        let buckets =
            bucket_trailing(&transactions, Granularity::Month, 2, date(2024, 3, 31)).unwrap();
        assert!(buckets.iter().all(PeriodBucket::is_empty));
    }

    #[test]
    fn weekly_buckets_follow_iso_weeks() {
        let transactions = vec![
            // Sunday of ISO week 2024-52.
            tx("t1", TransactionKind::Expense, 30.0, date(2024, 12, 29), None),
            // Monday of ISO week 2025-01.
            tx("t2", TransactionKind::Expense, 70.0, date(2024, 12, 30), None),
        ];
        let buckets =
            bucket_trailing(&transactions, Granularity::Week, 2, date(2025, 1, 1)).unwrap();
        assert_eq!(buckets[0].period_key, "2024-52");
        assert!((buckets[0].expenses - 30.0).abs() < f64::EPSILON);
        assert_eq!(buckets[1].period_key, "2025-01");
        assert!((buckets[1].expenses - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn range_bucketing_by_day() {
        let transactions = vec![tx(
            "t1",
            TransactionKind::Income,
            5.0,
            date(2024, 2, 28),
            None,
        )];
        let buckets = bucket_range(
            &transactions,
            Granularity::Day,
            date(2024, 2, 27),
            date(2024, 3, 1),
        )
        .unwrap();
        let keys: Vec<&str> = buckets.iter().map(|b| b.period_key.as_str()).collect();
        assert_eq!(keys, ["2024-02-27", "2024-02-28", "2024-02-29", "2024-03-01"]);
        assert!((buckets[1].income - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn metric_series_extracts_values() {
        let buckets = vec![
            PeriodBucket::new("2024".to_owned(), 10.0, 4.0),
            PeriodBucket::new("2025".to_owned(), 20.0, 25.0),
        ];
        assert_eq!(metric_series(&buckets, BucketMetric::Income), [10.0, 20.0]);
        assert_eq!(metric_series(&buckets, BucketMetric::Expenses), [4.0, 25.0]);
        assert_eq!(metric_series(&buckets, BucketMetric::Balance), [6.0, -5.0]);
    }
}
