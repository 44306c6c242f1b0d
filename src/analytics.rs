//! High-level analytics service over a ledger source.
//!
//! [`Analytics`] (async) and [`AnalyticsBlocking`] wrap a
//! [`LedgerSource`](crate::ledger::LedgerSource) /
//! [`BlockingLedgerSource`](crate::ledger::BlockingLedgerSource), fetch
//! exactly the transactions each query needs, and run the pure analytics
//! over them.
//!
//! # Example
//!
//! ```rust,no_run
//! use ledger_trends::analytics::AnalyticsBlocking;
//! use ledger_trends::ledger::InMemoryLedger;
//! use ledger_trends::models::Granularity;
//!
//! # fn main() -> ledger_trends::error::Result<()> {
//! let analytics = AnalyticsBlocking::builder()
//!     .source(InMemoryLedger::new())
//!     .build()?;
//! let _buckets = analytics.trends(Granularity::Month, 12)?;
//! # Ok(())
//! # }
//! ```

use chrono::Datelike as _;
use serde::Serialize;

use crate::budget_progress::BudgetProgress;
use crate::calendar::Period;
use crate::compare::{self, WindowComparison};
use crate::distribution::CategorySummary;
use crate::error::{AnalyticsError, Result};
use crate::heatmap::{self, DailyActivityPoint, Heatmap};
use crate::ledger::TransactionFilter;
use crate::models::{Budget, Granularity, NaiveDate, TransactionKind};
use crate::regression::{self, TrendFit};
use crate::trends::{self, BucketMetric, PeriodBucket};

/// Outcome of one auxiliary overview section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "camelCase")]
pub enum Section<T> {
    /// The section was computed.
    Ready(T),
    /// Fetching the section's data failed.
    Unavailable {
        /// Human-readable failure description.
        reason: String,
    },
}

impl<T> Section<T> {
    /// Converts a fetch result, logging a warning on failure.
    fn from_result(result: Result<T>, section: &'static str) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(err) => {
                tracing::warn!(section, error = %err, "overview section unavailable");
                Self::Unavailable {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Returns the value if the section is ready.
    #[inline]
    #[must_use]
    pub const fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Unavailable { .. } => None,
        }
    }

    /// Returns `true` if the section was computed.
    #[inline]
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(*self, Self::Ready(_))
    }
}

/// Trend fits and half-over-half comparisons of a bucket series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    /// Fit over the income series.
    pub income_trend: Option<TrendFit>,
    /// Fit over the expense series.
    pub expense_trend: Option<TrendFit>,
    /// Income of the newer half of the series versus the older half.
    pub income_change: Option<WindowComparison>,
    /// Expenses of the newer half of the series versus the older half.
    pub expense_change: Option<WindowComparison>,
}

impl TrendSummary {
    /// Fits both series and compares the newer half of each with the
    /// older half (the oldest bucket of an odd-length series is skipped).
    #[must_use]
    pub fn from_buckets(buckets: &[PeriodBucket]) -> Self {
        let income = trends::metric_series(buckets, BucketMetric::Income);
        let expenses = trends::metric_series(buckets, BucketMetric::Expenses);
        let window = buckets.len().div_euclid(2);
        Self {
            income_trend: regression::fit_values(&income),
            expense_trend: regression::fit_values(&expenses),
            income_change: half_change(&income, window, false),
            expense_change: half_change(&expenses, window, true),
        }
    }
}

/// Dashboard combining the trend series, its summary and the auxiliary
/// sections.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    /// Bucket granularity.
    pub granularity: Granularity,
    /// Evaluation date.
    pub today: NaiveDate,
    /// Trend buckets, oldest first.
    pub buckets: Vec<PeriodBucket>,
    /// Fits and comparisons over `buckets`.
    pub summary: TrendSummary,
    /// Expense distribution over the trend span.
    pub categories: Section<Vec<CategorySummary>>,
    /// Active budgets, most urgent first.
    pub budgets: Section<Vec<BudgetProgress>>,
    /// Daily expense heatmap.
    pub activity: Section<Heatmap>,
}

impl Overview {
    /// Summarizes the trend buckets and wraps the auxiliary results.
    fn assemble(
        granularity: Granularity,
        today: NaiveDate,
        buckets: Vec<PeriodBucket>,
        categories: Result<Vec<CategorySummary>>,
        budgets: Result<Vec<BudgetProgress>>,
        activity: Result<Vec<DailyActivityPoint>>,
    ) -> Self {
        Self {
            granularity,
            today,
            summary: TrendSummary::from_buckets(&buckets),
            buckets,
            categories: Section::from_result(categories, "categories"),
            budgets: Section::from_result(budgets, "budgets"),
            activity: Section::from_result(
                activity.map(|points| heatmap::build_heatmap(&points)),
                "activity",
            ),
        }
    }
}

/// Compares the last `window` values with the `window` before them.
fn half_change(values: &[f64], window: usize, invert: bool) -> Option<WindowComparison> {
    let (previous, current) = compare::split_windows(values, window)?;
    compare::compare_windows(current, previous, invert)
}

/// Rejects a zero count.
fn require_positive(value: u32, what: &str) -> Result<()> {
    if value == 0 {
        return Err(AnalyticsError::InvalidArgument(format!(
            "{what} must be positive"
        )));
    }
    Ok(())
}

/// Narrows `filter` to the span of `periods`.
fn within(filter: TransactionFilter, periods: &[Period]) -> TransactionFilter {
    match (periods.first(), periods.last()) {
        (Some(first), Some(last)) => filter.date_range(first.start, last.end),
        _ => filter,
    }
}

/// Filter for income and expense transactions inside the periods' span.
fn span_filter(periods: &[Period]) -> TransactionFilter {
    within(
        TransactionFilter::new()
            .kind(TransactionKind::Income)
            .kind(TransactionKind::Expense),
        periods,
    )
}

/// Filter for expenses inside the union of the budgets' windows.
fn budget_filter(budgets: &[Budget]) -> TransactionFilter {
    let filter = TransactionFilter::new().kind(TransactionKind::Expense);
    let from = budgets.iter().map(|budget| budget.period_start).min();
    let to = budgets.iter().map(|budget| budget.period_end).max();
    match (from, to) {
        (Some(start), Some(end)) => filter.date_range(start, end),
        _ => filter,
    }
}

/// January 1st of the year before `today`.
fn ytd_start(today: NaiveDate) -> Result<NaiveDate> {
    today
        .year()
        .checked_sub(1)
        .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
        .ok_or_else(|| AnalyticsError::InvalidArgument(format!("no prior year for {today}")))
}

/// Generates a high-level analytics service (async or blocking).
macro_rules! define_analytics {
    (
        service_name: $service:ident,
        builder_name: $builder:ident,
        source_trait: $source_trait:ident,
        service_doc: $service_doc:expr,
        builder_doc: $builder_doc:expr,
        $(async_kw: $async_kw:tt,)?
        $(await_kw: $await_ext:tt,)?
        $(extra_methods: { $($extra:tt)* },)?
    ) => {
        #[doc = $builder_doc]
        #[derive(Debug)]
        pub struct $builder<S: $source_trait> {
            /// Ledger source.
            source: Option<S>,
            /// Fixed evaluation date.
            today: Option<NaiveDate>,
        }

        impl<S: $source_trait> $builder<S> {
            /// Sets the ledger source.
            #[inline]
            #[must_use]
            pub fn source(mut self, source: S) -> Self {
                self.source = Some(source);
                self
            }

            /// Pins the evaluation date instead of reading the clock.
            #[inline]
            #[must_use]
            pub const fn today(mut self, today: NaiveDate) -> Self {
                self.today = Some(today);
                self
            }

            /// Builds the service.
            ///
            /// # Errors
            ///
            /// Returns [`AnalyticsError::InvalidArgument`] if no source was
            /// provided.
            #[inline]
            pub fn build(self) -> Result<$service<S>> {
                let source = self.source.ok_or_else(|| {
                    AnalyticsError::InvalidArgument("ledger source is required".to_owned())
                })?;
                Ok($service {
                    source,
                    today: self.today,
                })
            }
        }

        #[doc = $service_doc]
        #[derive(Debug)]
        pub struct $service<S: $source_trait> {
            /// Ledger source.
            source: S,
            /// Fixed evaluation date, if pinned.
            today: Option<NaiveDate>,
        }

        impl<S: $source_trait> $service<S> {
            /// Creates a new builder for configuring the service.
            #[inline]
            #[must_use]
            pub const fn builder() -> $builder<S> {
                $builder {
                    source: None,
                    today: None,
                }
            }

            /// Returns the underlying ledger source.
            #[inline]
            #[must_use]
            pub const fn source(&self) -> &S {
                &self.source
            }

            /// Evaluation date: the pinned date, else today in UTC.
            #[inline]
            #[must_use]
            pub fn today(&self) -> NaiveDate {
                self.today.unwrap_or_else(|| Utc::now().date_naive())
            }

            /// Returns `period_count` zero-filled buckets ending with the
            /// period that contains today.
            ///
            /// # Errors
            ///
            /// Returns [`AnalyticsError::InvalidArgument`] for a zero
            /// period count, or an error if the source fails.
            #[tracing::instrument(skip_all, fields(granularity = %granularity, period_count = period_count))]
            pub $($async_kw)? fn trends(
                &self,
                granularity: Granularity,
                period_count: u32,
            ) -> Result<Vec<PeriodBucket>> {
                require_positive(period_count, "period count")?;
                let periods = calendar::trailing_periods(self.today(), granularity, period_count)?;
                let transactions = self.source.transactions(&span_filter(&periods))
                    $( .$await_ext )? ?;
                tracing::debug!(transactions = transactions.len(), "bucketing trend series");
                Ok(trends::bucket_periods(&transactions, granularity, &periods))
            }

            /// Sums transactions of `kind` per category within optional
            /// inclusive bounds.
            ///
            /// # Errors
            ///
            /// Returns an error if the source fails.
            #[tracing::instrument(skip_all, fields(kind = %kind))]
            pub $($async_kw)? fn category_summary(
                &self,
                from: Option<NaiveDate>,
                to: Option<NaiveDate>,
                kind: TransactionKind,
            ) -> Result<Vec<CategorySummary>> {
                let mut filter = TransactionFilter::new().kind(kind);
                filter.date_from = from;
                filter.date_to = to;
                let transactions = self.source.transactions(&filter) $( .$await_ext )? ?;
                let categories = self.source.categories() $( .$await_ext )? ?;
                tracing::debug!(
                    transactions = transactions.len(),
                    categories = categories.len(),
                    "summarizing categories"
                );
                Ok(crate::distribution::summarize_categories(
                    &transactions,
                    &categories,
                    kind,
                    from,
                    to,
                ))
            }

            /// Returns daily totals of `kind` for the last `days` days,
            /// ending today.
            ///
            /// # Errors
            ///
            /// Returns [`AnalyticsError::InvalidArgument`] for a zero day
            /// count, or an error if the source fails.
            #[tracing::instrument(skip_all, fields(days = days, kind = %kind))]
            pub $($async_kw)? fn daily_activity(
                &self,
                days: u32,
                kind: TransactionKind,
            ) -> Result<Vec<DailyActivityPoint>> {
                require_positive(days, "day count")?;
                let today = self.today();
                let periods = calendar::trailing_periods(today, Granularity::Day, days)?;
                let filter = within(TransactionFilter::new().kind(kind), &periods);
                let transactions = self.source.transactions(&filter) $( .$await_ext )? ?;
                heatmap::daily_series(&transactions, kind, today, days)
            }

            /// Evaluates every budget active today, most urgent first.
            ///
            /// # Errors
            ///
            /// Returns an error if the source fails.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn budget_progress(&self) -> Result<Vec<BudgetProgress>> {
                let today = self.today();
                let budgets = self.source.budgets(today) $( .$await_ext )? ?;
                if budgets.is_empty() {
                    tracing::debug!("no active budgets");
                    return Ok(Vec::new());
                }
                let transactions = self.source.transactions(&budget_filter(&budgets))
                    $( .$await_ext )? ?;
                tracing::debug!(
                    budgets = budgets.len(),
                    transactions = transactions.len(),
                    "evaluating budgets"
                );
                Ok(crate::budget_progress::evaluate_budgets(
                    &budgets,
                    &transactions,
                    today,
                ))
            }

            /// Compares this year to date with the same months of last
            /// year; `None` when either year has no data.
            ///
            /// Months before the first month with activity are left out, so
            /// `months_present` reflects how much history the ledger holds.
            ///
            /// # Errors
            ///
            /// Returns an error if the source fails.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn year_to_date(&self) -> Result<Option<YtdComparison>> {
                let today = self.today();
                let periods =
                    calendar::periods_between(ytd_start(today)?, today, Granularity::Month)?;
                let transactions = self.source.transactions(&span_filter(&periods))
                    $( .$await_ext )? ?;
                let monthly: Vec<PeriodBucket> =
                    trends::bucket_periods(&transactions, Granularity::Month, &periods)
                        .into_iter()
                        .skip_while(PeriodBucket::is_empty)
                        .collect();
                tracing::debug!(months = monthly.len(), "comparing year to date");
                Ok(crate::ytd::compare_year_to_date(&monthly, today))
            }

            $($($extra)*)?
        }
    };
}

// ── Async variant ───────────────────────────────────────────────────────

#[cfg(feature = "async")]
mod async_analytics {
    //! Async analytics service.

    use crate::budget_progress::BudgetProgress;
    use crate::calendar;
    use crate::distribution::CategorySummary;
    use crate::error::{AnalyticsError, Result};
    use crate::heatmap::{self, DailyActivityPoint};
    use crate::ledger::{LedgerSource, TransactionFilter};
    use crate::models::{Granularity, NaiveDate, TransactionKind, Utc};
    use crate::trends::{self, PeriodBucket};
    use crate::ytd::YtdComparison;

    use super::{Overview, budget_filter, require_positive, span_filter, within, ytd_start};

    define_analytics! {
        service_name: Analytics,
        builder_name: AnalyticsBuilder,
        source_trait: LedgerSource,
        service_doc: "Async analytics service over a [`LedgerSource`].\n\nUse [`Analytics::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing an [`Analytics`] service.",
        async_kw: async,
        await_kw: await,
        extra_methods: {
            /// Computes the trend series and, concurrently, the category,
            /// budget and daily-activity sections.
            ///
            /// A failing auxiliary section is reported as
            /// [`Section::Unavailable`](super::Section::Unavailable) and does
            /// not affect the others.
            ///
            /// # Errors
            ///
            /// Returns an error if the trend series cannot be computed.
            #[tracing::instrument(skip_all)]
            pub async fn overview(
                &self,
                granularity: Granularity,
                period_count: u32,
                heatmap_days: u32,
            ) -> Result<Overview> {
                let today = self.today();
                let periods = calendar::trailing_periods(today, granularity, period_count)?;
                let from = periods.first().map(|period| period.start);
                let (buckets, categories, budgets, activity) = tokio::join!(
                    self.trends(granularity, period_count),
                    self.category_summary(from, Some(today), TransactionKind::Expense),
                    self.budget_progress(),
                    self.daily_activity(heatmap_days, TransactionKind::Expense),
                );
                Ok(Overview::assemble(
                    granularity,
                    today,
                    buckets?,
                    categories,
                    budgets,
                    activity,
                ))
            }
        },
    }
}

// ── Blocking variant ────────────────────────────────────────────────────

#[cfg(feature = "blocking")]
mod blocking_analytics {
    //! Blocking analytics service.

    use crate::budget_progress::BudgetProgress;
    use crate::calendar;
    use crate::distribution::CategorySummary;
    use crate::error::{AnalyticsError, Result};
    use crate::heatmap::{self, DailyActivityPoint};
    use crate::ledger::{BlockingLedgerSource, TransactionFilter};
    use crate::models::{Granularity, NaiveDate, TransactionKind, Utc};
    use crate::trends::{self, PeriodBucket};
    use crate::ytd::YtdComparison;

    use super::{Overview, budget_filter, require_positive, span_filter, within, ytd_start};

    define_analytics! {
        service_name: AnalyticsBlocking,
        builder_name: AnalyticsBlockingBuilder,
        source_trait: BlockingLedgerSource,
        service_doc: "Blocking analytics service over a [`BlockingLedgerSource`].\n\nUse [`AnalyticsBlocking::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing an [`AnalyticsBlocking`] service.",
        extra_methods: {
            /// Computes the trend series and then the category, budget and
            /// daily-activity sections.
            ///
            /// A failing auxiliary section is reported as
            /// [`Section::Unavailable`](super::Section::Unavailable) and does
            /// not affect the others.
            ///
            /// # Errors
            ///
            /// Returns an error if the trend series cannot be computed.
            #[tracing::instrument(skip_all)]
            pub fn overview(
                &self,
                granularity: Granularity,
                period_count: u32,
                heatmap_days: u32,
            ) -> Result<Overview> {
                let today = self.today();
                let buckets = self.trends(granularity, period_count)?;
                let periods = calendar::trailing_periods(today, granularity, period_count)?;
                let from = periods.first().map(|period| period.start);
                Ok(Overview::assemble(
                    granularity,
                    today,
                    buckets,
                    self.category_summary(from, Some(today), TransactionKind::Expense),
                    self.budget_progress(),
                    self.daily_activity(heatmap_days, TransactionKind::Expense),
                ))
            }
        },
    }
}

#[cfg(feature = "async")]
pub use async_analytics::{Analytics, AnalyticsBuilder};
#[cfg(feature = "blocking")]
pub use blocking_analytics::{AnalyticsBlocking, AnalyticsBlockingBuilder};
