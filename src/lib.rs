//! Trend analytics over a personal finance ledger.
//!
//! This crate turns raw ledger transactions into the series behind a
//! finance dashboard: calendar-period buckets (day, ISO week, month,
//! year), least-squares trend lines, period-over-period and year-to-date
//! comparisons, category distributions, budget burn-down and a
//! daily-activity heatmap.
//!
//! The analytic functions are pure and synchronous. Data enters through
//! the [`ledger::LedgerSource`] / [`ledger::BlockingLedgerSource`] traits,
//! and the [`analytics`] service wires a source to the analytics.

pub mod analytics;
pub mod budget_progress;
pub mod calendar;
pub mod compare;
pub mod distribution;
pub mod error;
pub mod heatmap;
pub mod ledger;
pub mod models;
pub mod regression;
pub mod trends;
pub mod ytd;

pub use compare::compare_windows;
pub use regression::fit_trend_line;
pub use ytd::compare_year_to_date;
